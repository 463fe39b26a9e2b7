//! Integration tests for configuration loading

use envdash::domain::FieldId;
use envdash::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[feed]
base_url = "http://localhost:5000"
channel_id = "42"
read_api_key = "TESTKEY"
poll_interval_ms = 1000
request_timeout_ms = 500
results = 1

[predictions]
url = "http://localhost:5000/train-models"
timeout_ms = 2000
enabled = false

[[fields]]
id = 1
slot = "pm25"
label = "PM2.5"
unit = "ug/m3"
page = "pm"
chart = true

[[fields]]
id = 2
slot = "pm10"
label = "PM10"
page = "pm"
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.base_url(), "http://localhost:5000");
    assert_eq!(config.channel_id(), "42");
    assert_eq!(config.read_api_key(), "TESTKEY");
    assert_eq!(config.poll_interval_ms(), 1000);
    assert!(!config.predictions_enabled());
    assert_eq!(config.fields().len(), 2);
    assert_eq!(config.field_spec(FieldId(1)).unwrap().slot, "pm25");
    // chart_id defaults from the slot name when not set explicitly
    assert_eq!(config.field_spec(FieldId(1)).unwrap().chart_id(), "chart_pm25");
    assert_eq!(config.pages(), vec!["pm"]);
}

#[test]
fn test_load_config_optional_fields_default() {
    let mut temp_file = NamedTempFile::new().unwrap();

    // Minimal config: only the required feed keys and one field
    let config_content = r#"
[feed]
base_url = "http://localhost:5000"
channel_id = "42"
read_api_key = "TESTKEY"

[[fields]]
id = 4
slot = "dB"
label = "Loudness (dB)"
page = "noise"
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.poll_interval_ms(), 5000);
    assert_eq!(config.results(), 1);
    assert!(config.predictions_enabled());
    assert_eq!(config.predictions_url(), "http://localhost:5000/train-models");
}

#[test]
fn test_duplicate_field_id_rejected_on_load() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[feed]
base_url = "http://localhost:5000"
channel_id = "42"
read_api_key = "TESTKEY"

[[fields]]
id = 1
slot = "pm25"
label = "PM2.5"
page = "pm"

[[fields]]
id = 1
slot = "pm10"
label = "PM10"
page = "pm"
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("duplicate field id"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.base_url(), "https://api.thingspeak.com");
    assert_eq!(config.poll_interval_ms(), 5000);
    assert_eq!(config.fields().len(), 8);
}
