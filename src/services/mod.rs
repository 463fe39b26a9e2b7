//! Services - dashboard logic and state management
//!
//! This module contains the core dashboard services:
//! - `poller` - Periodic feed polling with an overlap guard
//! - `slots` - Display slot board (latest value per field, staleness)
//! - `charts` - Pure actual-vs-predicted chart construction
//! - `nav` - Page/tab navigation state

pub mod charts;
pub mod nav;
pub mod poller;
pub mod slots;

// Re-export commonly used types
pub use charts::{build_charts, ChartSpec};
pub use nav::PageNav;
pub use poller::{CycleReport, SensorPoller};
pub use slots::{SlotBoard, SlotStatus, SlotView};
