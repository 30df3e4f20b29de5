use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use chrono::Utc;

use crate::application::ports::{SubmissionAck, SubmissionError, SubmissionGateway, OutboxStore};
use crate::domain::entities::{CapturePayload, CaptureRecord, DrainReport};
use crate::domain::value_objects::RecordKind;
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;

/// Moves capture records from Pending to Synced with at-least-once delivery
/// and no duplicate server-side effect.
///
/// Each kind has its own FIFO lane; lanes drain independently and a per-lane
/// mutex keeps at most one drain in flight, so a late connectivity event
/// cannot race an in-progress pass. Backoff is implicit: a retryable failure
/// parks the lane until the next trigger.
pub struct SyncEngine {
    outbox: Arc<dyn OutboxStore>,
    gateway: Arc<dyn SubmissionGateway>,
    monitor: Arc<ConnectivityMonitor>,
    config: SyncConfig,
    attendance_lane: Mutex<()>,
    payment_lane: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        gateway: Arc<dyn SubmissionGateway>,
        monitor: Arc<ConnectivityMonitor>,
        config: SyncConfig,
    ) -> Self {
        Self {
            outbox,
            gateway,
            monitor,
            config,
            attendance_lane: Mutex::new(()),
            payment_lane: Mutex::new(()),
        }
    }

    fn lane(&self, kind: RecordKind) -> &Mutex<()> {
        match kind {
            RecordKind::Attendance => &self.attendance_lane,
            RecordKind::Payment => &self.payment_lane,
        }
    }

    /// One pass over a single lane, strictly in creation order. The head
    /// record reaches a terminal-for-this-pass outcome before the next one
    /// starts; a retryable failure parks the whole lane.
    pub async fn drain_lane(&self, kind: RecordKind) -> Result<DrainReport, AppError> {
        let _guard = self.lane(kind).lock().await;

        let pending = self.outbox.list_pending(kind).await?;
        let total = pending.len();
        let mut report = DrainReport::empty(kind);

        for (position, record) in pending.into_iter().enumerate() {
            let key = record.idempotency_key.clone();
            self.outbox.mark_syncing(&key).await?;

            match self.submit(&record).await {
                Ok(SubmissionAck::Accepted) => {
                    self.outbox.mark_synced(&key).await?;
                    report.synced += 1;
                }
                Ok(SubmissionAck::Duplicate { original }) => {
                    // Already applied server-side; success, not an error.
                    debug!(key = %key, ?original, "Duplicate acknowledged");
                    self.outbox.mark_synced(&key).await?;
                    report.synced += 1;
                }
                Err(SubmissionError::Retryable(message)) => {
                    self.outbox.increment_attempt(&key).await?;
                    self.outbox.mark_pending(&key, &message).await?;
                    report.deferred = u32::try_from(total - position).unwrap_or(u32::MAX);
                    warn!(
                        key = %key,
                        kind = %kind,
                        attempts = record.attempts + 1,
                        %message,
                        "Retryable failure, lane parked until next trigger"
                    );
                    break;
                }
                Err(SubmissionError::Rejected(message)) => {
                    self.outbox.mark_failed(&key, &message).await?;
                    report.failed += 1;
                    warn!(key = %key, kind = %kind, %message, "Record rejected permanently");
                }
            }
        }

        if report.synced > 0 || report.failed > 0 || report.deferred > 0 {
            info!(
                kind = %kind,
                synced = report.synced,
                failed = report.failed,
                deferred = report.deferred,
                "Drain pass finished"
            );
        }
        Ok(report)
    }

    /// Drain both lanes (concurrently, no cross-lane ordering) and purge
    /// synced records that have outlived the duplicate-check window.
    pub async fn drain_all(&self) -> Result<Vec<DrainReport>, AppError> {
        let (attendance, payment) = tokio::join!(
            self.drain_lane(RecordKind::Attendance),
            self.drain_lane(RecordKind::Payment),
        );
        let reports = vec![attendance?, payment?];

        let retention = chrono::Duration::seconds(
            i64::try_from(self.config.synced_retention_secs).unwrap_or(i64::MAX),
        );
        let purged = self.outbox.purge_synced(Utc::now() - retention).await?;
        if purged > 0 {
            debug!(purged, "Purged synced records past the retention window");
        }

        Ok(reports)
    }

    /// Background trigger loop: drains on every connectivity resumption and
    /// on a coarse periodic tick. The tick runs even while believed offline,
    /// covering platforms that never signal the transition.
    pub fn spawn_scheduler(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut online_rx = engine.monitor.subscribe();
            let mut interval =
                tokio::time::interval(Duration::from_secs(engine.config.sync_interval_secs));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    changed = online_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if !*online_rx.borrow_and_update() {
                            continue;
                        }
                    }
                }

                if let Err(err) = engine.drain_all().await {
                    error!("Drain failed: {}", err);
                }
            }
        })
    }

    async fn submit(&self, record: &CaptureRecord) -> Result<SubmissionAck, SubmissionError> {
        match &record.payload {
            CapturePayload::Attendance(payload) => {
                self.gateway
                    .submit_attendance(&record.idempotency_key, payload)
                    .await
            }
            CapturePayload::Payment(payload) => {
                self.gateway
                    .submit_payment(&record.idempotency_key, payload)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{PaymentDraft, PendingSummary};
    use crate::domain::value_objects::{
        Barcode, IdempotencyKey, OperatorId, PaymentMethod, RecordStatus, SubjectUserId,
    };
    use crate::infrastructure::database::SqliteOutbox;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Gateway double scripted per lane; records submission order.
    #[derive(Default)]
    struct ScriptedGateway {
        attendance_script: StdMutex<VecDeque<Result<SubmissionAck, SubmissionError>>>,
        payment_script: StdMutex<VecDeque<Result<SubmissionAck, SubmissionError>>>,
        calls: StdMutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn script_attendance(
            &self,
            outcomes: Vec<Result<SubmissionAck, SubmissionError>>,
        ) {
            *self.attendance_script.lock().unwrap() = outcomes.into();
        }

        fn script_payment(&self, outcomes: Vec<Result<SubmissionAck, SubmissionError>>) {
            *self.payment_script.lock().unwrap() = outcomes.into();
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn next(
            script: &StdMutex<VecDeque<Result<SubmissionAck, SubmissionError>>>,
        ) -> Result<SubmissionAck, SubmissionError> {
            script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SubmissionAck::Accepted))
        }
    }

    #[async_trait]
    impl SubmissionGateway for ScriptedGateway {
        async fn submit_attendance(
            &self,
            key: &IdempotencyKey,
            _payload: &crate::domain::entities::AttendancePayload,
        ) -> Result<SubmissionAck, SubmissionError> {
            self.calls.lock().unwrap().push(key.as_str().to_string());
            Self::next(&self.attendance_script)
        }

        async fn submit_payment(
            &self,
            key: &IdempotencyKey,
            _payload: &crate::domain::entities::PaymentPayload,
        ) -> Result<SubmissionAck, SubmissionError> {
            self.calls.lock().unwrap().push(key.as_str().to_string());
            Self::next(&self.payment_script)
        }
    }

    async fn setup() -> (Arc<SyncEngine>, Arc<SqliteOutbox>, Arc<ScriptedGateway>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let outbox = Arc::new(SqliteOutbox::new(pool));
        let gateway = Arc::new(ScriptedGateway::default());
        let monitor = Arc::new(ConnectivityMonitor::new(true));
        let engine = Arc::new(SyncEngine::new(
            outbox.clone(),
            gateway.clone(),
            monitor,
            SyncConfig {
                sync_interval_secs: 3600,
                synced_retention_secs: 24 * 60 * 60,
            },
        ));
        (engine, outbox, gateway)
    }

    fn attendance(barcode: &str, offset_micros: i64) -> CaptureRecord {
        let mut record = CaptureRecord::attendance(
            Barcode::new(barcode.into()).unwrap(),
            OperatorId::new("op-1".into()).unwrap(),
            Utc::now(),
        );
        record.created_at += chrono::Duration::microseconds(offset_micros);
        record
    }

    fn payment(subject: &str, offset_micros: i64) -> CaptureRecord {
        let mut record = CaptureRecord::payment(
            PaymentDraft {
                subject_user_id: SubjectUserId::new(subject.into()).unwrap(),
                amount: Decimal::new(4990, 2),
                method: PaymentMethod::Card,
                notes: None,
            },
            Utc::now(),
        );
        record.created_at += chrono::Duration::microseconds(offset_micros);
        record
    }

    #[tokio::test]
    async fn test_drain_submits_in_fifo_order() {
        let (engine, outbox, gateway) = setup().await;

        let records = vec![
            attendance("GYM-0001", 0),
            attendance("GYM-0002", 1),
            attendance("GYM-0003", 2),
        ];
        for record in &records {
            outbox.enqueue(record).await.unwrap();
        }

        let report = engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(report.synced, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(report.deferred, 0);

        let expected: Vec<String> = records
            .iter()
            .map(|r| r.idempotency_key.as_str().to_string())
            .collect();
        assert_eq!(gateway.calls(), expected);

        for record in &records {
            let loaded = outbox.get(&record.idempotency_key).await.unwrap().unwrap();
            assert_eq!(loaded.status, RecordStatus::Synced);
        }
    }

    #[tokio::test]
    async fn test_retryable_failure_parks_lane_at_head() {
        let (engine, outbox, gateway) = setup().await;

        let a = attendance("GYM-0001", 0);
        let b = attendance("GYM-0002", 1);
        let c = attendance("GYM-0003", 2);
        for record in [&a, &b, &c] {
            outbox.enqueue(record).await.unwrap();
        }
        gateway.script_attendance(vec![
            Ok(SubmissionAck::Accepted),
            Err(SubmissionError::Retryable("timeout".into())),
        ]);

        let report = engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(report.deferred, 2);
        assert_eq!(gateway.calls().len(), 2);

        let b_loaded = outbox.get(&b.idempotency_key).await.unwrap().unwrap();
        assert_eq!(b_loaded.status, RecordStatus::Pending);
        assert_eq!(b_loaded.attempts, 1);
        assert_eq!(b_loaded.last_error.as_deref(), Some("timeout"));

        // C was never attempted this pass.
        let c_loaded = outbox.get(&c.idempotency_key).await.unwrap().unwrap();
        assert_eq!(c_loaded.status, RecordStatus::Pending);
        assert_eq!(c_loaded.attempts, 0);

        // The next trigger retries from the same head record.
        gateway.script_attendance(vec![]);
        let report = engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(report.synced, 2);
        assert_eq!(
            outbox.get(&b.idempotency_key).await.unwrap().unwrap().status,
            RecordStatus::Synced
        );
    }

    #[tokio::test]
    async fn test_rejection_fails_record_and_continues() {
        let (engine, outbox, gateway) = setup().await;

        let a = attendance("BAD-CODE", 0);
        let b = attendance("GYM-0002", 1);
        outbox.enqueue(&a).await.unwrap();
        outbox.enqueue(&b).await.unwrap();
        gateway.script_attendance(vec![
            Err(SubmissionError::Rejected("unknown barcode".into())),
            Ok(SubmissionAck::Accepted),
        ]);

        let report = engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.synced, 1);

        let a_loaded = outbox.get(&a.idempotency_key).await.unwrap().unwrap();
        assert_eq!(a_loaded.status, RecordStatus::Failed);
        assert_eq!(a_loaded.last_error.as_deref(), Some("unknown barcode"));

        // Terminal: a re-drain does not resubmit the failed record.
        let calls_before = gateway.calls().len();
        engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(gateway.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_duplicate_ack_counts_as_synced() {
        let (engine, outbox, gateway) = setup().await;

        let record = attendance("GYM-0042", 0);
        outbox.enqueue(&record).await.unwrap();
        gateway.script_attendance(vec![Ok(SubmissionAck::Duplicate {
            original: Some("att-123".into()),
        })]);

        let report = engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(
            outbox
                .get(&record.idempotency_key)
                .await
                .unwrap()
                .unwrap()
                .status,
            RecordStatus::Synced
        );
    }

    #[tokio::test]
    async fn test_synced_records_are_excluded_from_redrain() {
        let (engine, outbox, gateway) = setup().await;

        let record = attendance("GYM-0042", 0);
        outbox.enqueue(&record).await.unwrap();
        engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(gateway.calls().len(), 1);

        let report = engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(report.synced, 0);
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_lanes_drain_independently() {
        let (engine, outbox, gateway) = setup().await;

        outbox.enqueue(&attendance("GYM-0001", 0)).await.unwrap();
        let pay = payment("user-7", 0);
        outbox.enqueue(&pay).await.unwrap();

        // Attendance lane parks; payment lane still drains.
        gateway.script_attendance(vec![Err(SubmissionError::Retryable("offline".into()))]);
        gateway.script_payment(vec![Ok(SubmissionAck::Accepted)]);

        let reports = engine.drain_all().await.unwrap();
        let attendance_report = reports
            .iter()
            .find(|r| r.kind == RecordKind::Attendance)
            .unwrap();
        let payment_report = reports
            .iter()
            .find(|r| r.kind == RecordKind::Payment)
            .unwrap();

        assert_eq!(attendance_report.deferred, 1);
        assert_eq!(payment_report.synced, 1);
        assert_eq!(
            outbox.get(&pay.idempotency_key).await.unwrap().unwrap().status,
            RecordStatus::Synced
        );
    }

    #[tokio::test]
    async fn test_interrupted_syncing_record_recovers_and_delivers() {
        let (engine, outbox, _gateway) = setup().await;

        // A record left Syncing by a torn-down process.
        let record = attendance("GYM-0042", 0);
        outbox.enqueue(&record).await.unwrap();
        outbox.mark_syncing(&record.idempotency_key).await.unwrap();

        // Startup resets it before the first drain pass.
        assert_eq!(outbox.recover_interrupted().await.unwrap(), 1);

        let report = engine.drain_lane(RecordKind::Attendance).await.unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(
            outbox
                .get(&record.idempotency_key)
                .await
                .unwrap()
                .unwrap()
                .status,
            RecordStatus::Synced
        );
    }

    #[tokio::test]
    async fn test_scheduler_drains_on_connectivity_resume() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let outbox = Arc::new(SqliteOutbox::new(pool));
        let gateway = Arc::new(ScriptedGateway::default());
        let monitor = Arc::new(ConnectivityMonitor::new(false));
        let engine = Arc::new(SyncEngine::new(
            outbox.clone(),
            gateway.clone(),
            monitor.clone(),
            SyncConfig {
                sync_interval_secs: 3600,
                synced_retention_secs: 24 * 60 * 60,
            },
        ));

        let record = attendance("GYM-0042", 0);
        outbox.enqueue(&record).await.unwrap();

        // The immediate first tick drains while "offline"; park the lane so
        // the record is still pending when connectivity resumes.
        gateway.script_attendance(vec![Err(SubmissionError::Retryable("offline".into()))]);
        let handle = engine.spawn_scheduler();
        tokio::time::sleep(Duration::from_millis(50)).await;

        gateway.script_attendance(vec![Ok(SubmissionAck::Accepted)]);
        monitor.report_online();

        // Wait for the resumed drain to finish.
        let mut synced = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let status = outbox
                .get(&record.idempotency_key)
                .await
                .unwrap()
                .unwrap()
                .status;
            if status == RecordStatus::Synced {
                synced = true;
                break;
            }
        }
        handle.abort();
        assert!(synced);
    }

    #[tokio::test]
    async fn test_drain_all_purges_expired_synced_records() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let outbox = Arc::new(SqliteOutbox::new(pool));
        let gateway = Arc::new(ScriptedGateway::default());
        let monitor = Arc::new(ConnectivityMonitor::new(true));
        let engine = Arc::new(SyncEngine::new(
            outbox.clone(),
            gateway,
            monitor,
            SyncConfig {
                sync_interval_secs: 3600,
                // Zero retention: synced records purge on the next pass.
                synced_retention_secs: 0,
            },
        ));

        let record = attendance("GYM-0042", 0);
        outbox.enqueue(&record).await.unwrap();
        engine.drain_all().await.unwrap();

        // Second pass purges the record synced by the first.
        engine.drain_all().await.unwrap();
        assert!(outbox.get(&record.idempotency_key).await.unwrap().is_none());

        let summary = outbox.pending_summary().await.unwrap();
        assert!(!summary
            .iter()
            .any(|s: &PendingSummary| s.pending > 0 || s.failed > 0));
    }
}
