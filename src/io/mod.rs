//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `feed` - HTTP client for the ThingSpeak-style time-series read API
//! - `predictions` - HTTP client for the model training/prediction endpoint

pub mod feed;
pub mod predictions;

// Re-export commonly used types
pub use feed::{FieldSource, ThingSpeakClient};
pub use predictions::PredictionClient;
