//! Sensor polling service
//!
//! One poll cycle issues exactly one feed request per configured field,
//! sequentially in field-table order, and writes each result into the slot
//! board. Per-field failures are logged and skipped; a failed field never
//! aborts the rest of the cycle.
//!
//! Scheduling: the run loop polls immediately, then on every interval tick.
//! An in-flight guard makes a cycle that outruns the interval skip the next
//! tick instead of racing it, so slot writes from two cycles can never
//! interleave.

use crate::domain::FieldId;
use crate::infra::config::{Config, FieldSpec};
use crate::io::feed::FieldSource;
use crate::services::slots::SlotBoard;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Fields requested this cycle, in request order.
    pub requested: Vec<FieldId>,
    /// Fields whose slot received a fresh value.
    pub updated: Vec<FieldId>,
    /// Fields whose fetch failed.
    pub failed: Vec<FieldId>,
    /// Fields that responded successfully but carried no data.
    pub empty: Vec<FieldId>,
    pub duration: Duration,
}

impl CycleReport {
    pub fn log(&self) {
        debug!(
            requested = self.requested.len(),
            updated = self.updated.len(),
            failed = self.failed.len(),
            empty = self.empty.len(),
            duration_ms = self.duration.as_millis() as u64,
            "poll_cycle_complete"
        );
    }
}

pub struct SensorPoller {
    source: Arc<dyn FieldSource>,
    fields: Vec<FieldSpec>,
    board: Arc<RwLock<SlotBoard>>,
    poll_interval: Duration,
    in_flight: AtomicBool,
}

impl SensorPoller {
    pub fn new(
        config: &Config,
        source: Arc<dyn FieldSource>,
        board: Arc<RwLock<SlotBoard>>,
    ) -> Self {
        Self {
            source,
            fields: config.fields().to_vec(),
            board,
            poll_interval: Duration::from_millis(config.poll_interval_ms()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn board(&self) -> Arc<RwLock<SlotBoard>> {
        self.board.clone()
    }

    /// Run one poll cycle. Returns `None` if another cycle is already in
    /// flight (the caller's tick is skipped, not queued).
    pub async fn poll_once(&self) -> Option<CycleReport> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("poll_overlap_skipped");
            return None;
        }

        let start = Instant::now();
        let mut report = CycleReport::default();

        // Sequential, table order: slot updates within a cycle land in a
        // fixed field order.
        for spec in &self.fields {
            let field = spec.field_id();
            report.requested.push(field);

            match self.source.latest(field).await {
                Ok(Some(reading)) => {
                    self.board.write().apply(reading);
                    report.updated.push(field);
                }
                Ok(None) => {
                    debug!(field = %field, slot = %spec.slot, "feed_no_data");
                    self.board.write().mark_failed(field);
                    report.empty.push(field);
                }
                Err(e) => {
                    warn!(field = %field, slot = %spec.slot, error = %e, "feed_request_failed");
                    self.board.write().mark_failed(field);
                    report.failed.push(field);
                }
            }
        }

        report.duration = start.elapsed();
        self.in_flight.store(false, Ordering::Release);
        Some(report)
    }

    /// Start the polling loop: immediate first cycle, then one per tick.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(
            fields = self.fields.len(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "sensor_poller_started"
        );

        let mut poll_timer = interval(self.poll_interval);

        loop {
            // Check for shutdown signal
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("sensor_poller_shutdown");
                        return;
                    }
                }
                _ = poll_timer.tick() => {}
            }

            if let Some(report) = self.poll_once().await {
                if report.duration > self.poll_interval {
                    warn!(
                        duration_ms = report.duration.as_millis() as u64,
                        interval_ms = self.poll_interval.as_millis() as u64,
                        "poll_cycle_overrun"
                    );
                }
                report.log();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reading;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    /// Scripted feed double: fixed responses, records every requested field.
    struct ScriptedSource {
        responses: HashMap<FieldId, anyhow::Result<Option<String>>>,
        requested: Mutex<Vec<FieldId>>,
    }

    impl ScriptedSource {
        fn new(values: &[(u8, &str)]) -> Self {
            let responses = values
                .iter()
                .map(|(id, v)| (FieldId(*id), Ok(Some(v.to_string()))))
                .collect();
            Self { responses, requested: Mutex::new(Vec::new()) }
        }

        fn with_error(mut self, id: u8, msg: &str) -> Self {
            self.responses.insert(FieldId(id), Err(anyhow::anyhow!(msg.to_string())));
            self
        }

        fn with_empty(mut self, id: u8) -> Self {
            self.responses.insert(FieldId(id), Ok(None));
            self
        }
    }

    #[async_trait]
    impl FieldSource for ScriptedSource {
        async fn latest(&self, field: FieldId) -> anyhow::Result<Option<Reading>> {
            self.requested.lock().push(field);
            match self.responses.get(&field) {
                Some(Ok(Some(v))) => {
                    Ok(Some(Reading { field, value: v.clone(), sampled_at: None }))
                }
                Some(Ok(None)) | None => Ok(None),
                Some(Err(e)) => Err(anyhow::anyhow!(e.to_string())),
            }
        }
    }

    fn all_fields_scripted() -> ScriptedSource {
        ScriptedSource::new(&[
            (1, "101"),
            (2, "202"),
            (3, "303"),
            (4, "62.4"),
            (5, "37.5"),
            (6, "18.0"),
            (7, "24.1"),
            (8, "48"),
        ])
    }

    fn poller(source: ScriptedSource) -> (SensorPoller, Arc<ScriptedSource>) {
        let config = Config::default();
        let board = Arc::new(RwLock::new(SlotBoard::new(config.fields())));
        let source = Arc::new(source);
        (SensorPoller::new(&config, source.clone(), board), source)
    }

    #[tokio::test]
    async fn test_successful_value_lands_in_mapped_slot() {
        let (poller, _) = poller(all_fields_scripted());
        poller.poll_once().await.unwrap();

        let board = poller.board();
        let board = board.read();
        assert_eq!(board.value(FieldId(5)), Some("37.5"));
        assert_eq!(board.value(FieldId(4)), Some("62.4"));
        assert_eq!(board.value(FieldId(8)), Some("48"));
    }

    #[tokio::test]
    async fn test_cycle_issues_one_request_per_field_in_order() {
        let (poller, source) = poller(all_fields_scripted());
        let report = poller.poll_once().await.unwrap();

        let expected: Vec<FieldId> = (1..=8).map(FieldId).collect();
        assert_eq!(report.requested, expected);
        assert_eq!(*source.requested.lock(), expected);
    }

    #[tokio::test]
    async fn test_failed_field_is_skipped_not_fatal() {
        let (poller, _) = poller(all_fields_scripted().with_error(3, "connection refused"));
        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.failed, vec![FieldId(3)]);
        assert_eq!(report.updated.len(), 7);
        // Fields after the failed one still got their values
        let board = poller.board();
        assert_eq!(board.read().value(FieldId(7)), Some("24.1"));
    }

    #[tokio::test]
    async fn test_empty_feed_counts_separately() {
        let (poller, _) = poller(all_fields_scripted().with_empty(2));
        let report = poller.poll_once().await.unwrap();
        assert_eq!(report.empty, vec![FieldId(2)]);
        assert_eq!(report.updated.len(), 7);
    }

    #[tokio::test]
    async fn test_two_polls_idempotent_over_same_responses() {
        let (poller, _) = poller(all_fields_scripted());
        poller.poll_once().await.unwrap();
        let first: Vec<_> = poller.board().read().snapshot().iter().map(|v| v.value.clone()).collect();

        poller.poll_once().await.unwrap();
        let second: Vec<_> = poller.board().read().snapshot().iter().map(|v| v.value.clone()).collect();

        assert_eq!(first, second);
    }

    /// Feed double that blocks until released, to hold a cycle in flight.
    struct BlockingSource {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl FieldSource for BlockingSource {
        async fn latest(&self, field: FieldId) -> anyhow::Result<Option<Reading>> {
            self.release.notified().await;
            Ok(Some(Reading { field, value: "1".to_string(), sampled_at: None }))
        }
    }

    #[tokio::test]
    async fn test_overlapping_poll_is_skipped() {
        let release = Arc::new(Notify::new());
        let config = Config::default();
        let board = Arc::new(RwLock::new(SlotBoard::new(config.fields())));
        let source = Arc::new(BlockingSource { release: release.clone() });
        let poller = Arc::new(SensorPoller::new(&config, source, board));

        let first = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.poll_once().await })
        };

        // Give the first cycle time to take the guard and block on field 1
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Second entry must be refused while the first is in flight
        assert!(poller.poll_once().await.is_none());

        // Release all eight blocked requests and let the first cycle finish
        for _ in 0..8 {
            release.notify_one();
            tokio::task::yield_now().await;
        }
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.updated.len(), 8);

        // Guard is released once the cycle completes
        assert!(!poller.in_flight.load(Ordering::Acquire));
    }
}
