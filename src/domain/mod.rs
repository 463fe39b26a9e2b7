//! Domain models - core types shared across the dashboard
//!
//! This module contains the canonical data types used throughout the system:
//! - `FieldId` - typed id of one measurement column on the feed channel
//! - `Reading` - the latest observed value for one field
//! - `ChartSeries` - one actual-vs-predicted series pair from the prediction endpoint

pub mod types;

// Re-export commonly used types at module level
pub use types::{ChartSeries, FieldId, Reading};
