//! Display slot board
//!
//! One slot per configured field. Each poll cycle overwrites slot values
//! (last-write-wins, no history). A failed fetch never erases the previous
//! value; it flags the slot so staleness is visible instead of silent.

use crate::domain::{FieldId, Reading};
use crate::infra::config::FieldSpec;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;

/// Freshness of a slot's displayed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// No value has ever arrived.
    Unavailable,
    /// Value from the most recent successful fetch.
    Live,
    /// A previous value is shown but the latest fetch failed.
    Stale,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Unavailable => "unavailable",
            SlotStatus::Live => "live",
            SlotStatus::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone)]
struct SlotState {
    value: Option<String>,
    status: SlotStatus,
    sampled_at: Option<DateTime<Utc>>,
}

/// Read-only view of one slot for rendering.
#[derive(Debug, Clone)]
pub struct SlotView {
    pub field: FieldId,
    pub slot: String,
    pub label: String,
    pub unit: Option<String>,
    pub page: String,
    pub value: Option<String>,
    pub status: SlotStatus,
    pub sampled_at: Option<DateTime<Utc>>,
}

impl SlotView {
    /// Display text for the slot: the value (with unit) or a placeholder.
    pub fn display_value(&self) -> String {
        match &self.value {
            Some(v) => match &self.unit {
                Some(unit) => format!("{} {}", v, unit),
                None => v.clone(),
            },
            None => "--".to_string(),
        }
    }
}

/// The set of display slots, keyed by field id.
pub struct SlotBoard {
    specs: Vec<FieldSpec>,
    states: HashMap<FieldId, SlotState>,
    last_update: Option<Instant>,
}

impl SlotBoard {
    pub fn new(fields: &[FieldSpec]) -> Self {
        let states = fields
            .iter()
            .map(|f| {
                (
                    f.field_id(),
                    SlotState { value: None, status: SlotStatus::Unavailable, sampled_at: None },
                )
            })
            .collect();

        Self { specs: fields.to_vec(), states, last_update: None }
    }

    /// Write a fresh reading into the slot mapped to its field.
    /// Returns false if the field has no registered slot.
    pub fn apply(&mut self, reading: Reading) -> bool {
        let Some(state) = self.states.get_mut(&reading.field) else {
            return false;
        };
        state.value = Some(reading.value);
        state.status = SlotStatus::Live;
        state.sampled_at = reading.sampled_at;
        self.last_update = Some(Instant::now());
        true
    }

    /// When the board last received a successful reading.
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// Flag a slot whose fetch failed this cycle. The prior value, if any,
    /// stays on display but is marked stale.
    pub fn mark_failed(&mut self, field: FieldId) {
        if let Some(state) = self.states.get_mut(&field) {
            if state.value.is_some() {
                state.status = SlotStatus::Stale;
            } else {
                state.status = SlotStatus::Unavailable;
            }
        }
    }

    /// Current value text for a slot, if any.
    pub fn value(&self, field: FieldId) -> Option<&str> {
        self.states.get(&field).and_then(|s| s.value.as_deref())
    }

    pub fn status(&self, field: FieldId) -> Option<SlotStatus> {
        self.states.get(&field).map(|s| s.status)
    }

    /// Snapshot of every slot in field-table order, for rendering.
    pub fn snapshot(&self) -> Vec<SlotView> {
        self.specs
            .iter()
            .map(|spec| {
                let state = &self.states[&spec.field_id()];
                SlotView {
                    field: spec.field_id(),
                    slot: spec.slot.clone(),
                    label: spec.label.clone(),
                    unit: spec.unit.clone(),
                    page: spec.page.clone(),
                    value: state.value.clone(),
                    status: state.status,
                    sampled_at: state.sampled_at,
                }
            })
            .collect()
    }

    /// Snapshot of the slots belonging to one page, in table order.
    pub fn page_snapshot(&self, page: &str) -> Vec<SlotView> {
        self.snapshot().into_iter().filter(|v| v.page == page).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
