use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::ports::OutboxStore;
use crate::application::services::sync_service::SyncEngine;
use crate::domain::entities::{CaptureRecord, PaymentDraft, PendingSummary};
use crate::domain::value_objects::{
    Barcode, IdempotencyKey, OperatorId, RecordKind, RecordStatus,
};
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::error::{AppError, Result};

/// What the operator is told immediately after a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Submitted and acknowledged while online ("saved").
    Sent,
    /// Durably queued for a later drain ("saved, will sync").
    Queued,
    /// The server rejected it during the immediate attempt; the record is
    /// kept visible for corrective action.
    Failed,
}

/// Immediate local acknowledgment of a capture action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureAck {
    pub idempotency_key: IdempotencyKey,
    pub delivery: Delivery,
}

/// Entry point for the two capture screens.
///
/// Every capture is enqueued durably first; only then, if the device is
/// believed online, the record's lane is drained immediately. Storage
/// failures propagate to the caller; delivery failures never do, because
/// they live in the record's status.
pub struct CaptureService {
    outbox: Arc<dyn OutboxStore>,
    engine: Arc<SyncEngine>,
    monitor: Arc<ConnectivityMonitor>,
}

impl CaptureService {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        engine: Arc<SyncEngine>,
        monitor: Arc<ConnectivityMonitor>,
    ) -> Self {
        Self {
            outbox,
            engine,
            monitor,
        }
    }

    pub async fn submit_or_queue_attendance(
        &self,
        barcode: Barcode,
        operator_id: OperatorId,
    ) -> Result<CaptureAck> {
        let record = CaptureRecord::attendance(barcode, operator_id, Utc::now());
        self.submit_or_queue(record).await
    }

    pub async fn submit_or_queue_payment(&self, draft: PaymentDraft) -> Result<CaptureAck> {
        let record = CaptureRecord::payment(draft, Utc::now());
        self.submit_or_queue(record).await
    }

    async fn submit_or_queue(&self, record: CaptureRecord) -> Result<CaptureAck> {
        let key = record.idempotency_key.clone();
        let kind = record.kind;

        // Durable before any acknowledgment; a failure here is surfaced to
        // the operator instead of claiming success.
        self.outbox.enqueue(&record).await?;

        if self.monitor.is_online() {
            if let Err(err) = self.engine.drain_lane(kind).await {
                warn!(key = %key, "Immediate drain failed: {}", err);
            }
        }

        let status = self
            .outbox
            .get(&key)
            .await?
            .map(|loaded| loaded.status)
            .unwrap_or(RecordStatus::Pending);

        let delivery = match status {
            RecordStatus::Synced => Delivery::Sent,
            RecordStatus::Failed => Delivery::Failed,
            RecordStatus::Pending | RecordStatus::Syncing => Delivery::Queued,
        };
        info!(key = %key, kind = %kind, ?delivery, "Capture accepted");

        Ok(CaptureAck {
            idempotency_key: key,
            delivery,
        })
    }

    /// Failed records for the operator's review list; they never disappear
    /// silently.
    pub async fn list_failed(&self, kind: RecordKind) -> Result<Vec<CaptureRecord>> {
        self.outbox.list_failed(kind).await
    }

    /// Remove a permanently failed record once the operator has re-entered
    /// or escalated it.
    pub async fn acknowledge_failed(&self, key: &IdempotencyKey) -> Result<bool> {
        match self.outbox.get(key).await? {
            Some(record) if record.status == RecordStatus::Failed => self.outbox.remove(key).await,
            Some(record) => Err(AppError::InvalidInput(format!(
                "Record {} is {}, not failed",
                key, record.status
            ))),
            None => Ok(false),
        }
    }

    /// Per-kind backlog counts; every kind is present even when its lane has
    /// no rows, so the UI badge never has to special-case absence.
    pub async fn pending_summary(&self) -> Result<Vec<PendingSummary>> {
        let rows = self.outbox.pending_summary().await?;
        let summary = RecordKind::ALL
            .into_iter()
            .map(|kind| {
                rows.iter()
                    .find(|row| row.kind == kind)
                    .copied()
                    .unwrap_or(PendingSummary {
                        kind,
                        pending: 0,
                        failed: 0,
                    })
            })
            .collect();
        Ok(summary)
    }
}
