//! Mock feed server
//!
//! Simulates both external HTTP collaborators for local testing:
//! - the ThingSpeak-style read API: GET /channels/{id}/fields/{f}.json
//! - the prediction endpoint: GET /train-models
//!
//! Values are synthetic but deterministic-ish (a slow sine wobble around a
//! per-field baseline), so the dashboard shows plausible moving readings.
//!
//! Usage:
//!   cargo run --bin mock-feed -- --port 5000
//!   envdash --config config/dev.toml   # with base_url http://localhost:5000

use bytes::Bytes;
use clap::Parser;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mock-feed")]
#[command(about = "Mock sensor feed + prediction endpoint for local testing")]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Number of points in each prediction series
    #[arg(long, default_value = "24")]
    series_len: usize,
}

/// Baseline value for a field id; the wobble is added on top.
fn baseline(field: u8) -> f64 {
    match field {
        1 => 420.0, // air quality ppb
        2 => 9.0,   // CO ppb
        3 => 150.0, // flammable gas ppb
        4 => 58.0,  // loudness dB
        5 => 35.0,  // PM2.5
        6 => 52.0,  // PM10
        7 => 24.0,  // temperature C
        8 => 47.0,  // humidity %
        _ => 10.0,
    }
}

fn now_secs() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

/// Synthetic latest value for one field.
fn sample(field: u8, t: f64) -> f64 {
    let phase = field as f64 * 0.7;
    let wobble = (t / 60.0 + phase).sin() * baseline(field) * 0.08;
    ((baseline(field) + wobble) * 10.0).round() / 10.0
}

fn feed_body(field: u8) -> String {
    let value = sample(field, now_secs());
    let created_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let mut entry = serde_json::Map::new();
    entry.insert("created_at".to_string(), json!(created_at));
    entry.insert("entry_id".to_string(), json!(1));
    entry.insert(format!("field{field}"), json!(value.to_string()));

    json!({
        "channel": { "id": 0 },
        "feeds": [ entry ]
    })
    .to_string()
}

fn prediction_body(series_len: usize) -> String {
    let t = now_secs();
    let mut body = serde_json::Map::new();

    // Charted fields of the indoor profile: loudness, PM2.5, PM10
    for (field, accuracy) in [(4u8, 0.9132), (5u8, 0.8765), (6u8, 0.8421)] {
        let original: Vec<f64> = (0..series_len).map(|i| i as f64).collect();
        let actual: Vec<f64> =
            (0..series_len).map(|i| sample(field, t + i as f64 * 300.0)).collect();
        let predicted: Vec<f64> = actual
            .iter()
            .enumerate()
            .map(|(i, v)| ((v + ((i as f64) * 0.9).cos() * baseline(field) * 0.03) * 10.0).round() / 10.0)
            .collect();

        body.insert(
            format!("field{field}"),
            json!({
                "original": original,
                "actual": actual,
                "predicted": predicted,
                "accuracy": accuracy,
            }),
        );
    }

    serde_json::Value::Object(body).to_string()
}

/// Parse `/channels/{id}/fields/{f}.json` and return the field id.
fn parse_field_path(path: &str) -> Option<u8> {
    let rest = path.strip_prefix("/channels/")?;
    let (_channel, rest) = rest.split_once("/fields/")?;
    rest.strip_suffix(".json")?.parse().ok()
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    series_len: usize,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();

    let response = match (req.method(), path.as_str()) {
        (&Method::GET, "/train-models") => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(prediction_body(series_len)))),
        (&Method::GET, "/health") => {
            Response::builder().status(StatusCode::OK).body(Full::new(Bytes::from("ok")))
        }
        (&Method::GET, p) => match parse_field_path(p) {
            Some(field) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(feed_body(field)))),
            None => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from("Not Found"))),
        },
        _ => Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .body(Full::new(Bytes::from("Method Not Allowed"))),
    };

    // Builder only fails on malformed headers, which these are not
    Ok(response.unwrap_or_else(|_| Response::new(Full::new(Bytes::from("")))))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = %args.port, "mock_feed_started");

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let io = TokioIo::new(stream);
                let series_len = args.series_len;

                tokio::spawn(async move {
                    let service =
                        service_fn(move |req| async move { handle_request(req, series_len).await });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        error!(error = %e, "mock_feed_http_error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "mock_feed_accept_error");
            }
        }
    }
}
