use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{CaptureRecord, PendingSummary};
use crate::domain::value_objects::{IdempotencyKey, RecordKind};
use crate::shared::error::AppError;

/// Durable store of capture records awaiting delivery.
///
/// All status transitions are atomic single-record operations; callers never
/// read-then-write a status outside of them. Transitions for different keys
/// do not block each other.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Persist a new record durably before returning. A failure here is
    /// loud: the record was not accepted and the operator must be told.
    async fn enqueue(&self, record: &CaptureRecord) -> Result<(), AppError>;

    async fn get(&self, key: &IdempotencyKey) -> Result<Option<CaptureRecord>, AppError>;

    /// Pending records of one kind, ordered by creation time ascending.
    async fn list_pending(&self, kind: RecordKind) -> Result<Vec<CaptureRecord>, AppError>;

    /// Failed records of one kind, oldest first, for operator review.
    async fn list_failed(&self, kind: RecordKind) -> Result<Vec<CaptureRecord>, AppError>;

    /// Pending -> Syncing. Errors if the record is not pending.
    async fn mark_syncing(&self, key: &IdempotencyKey) -> Result<(), AppError>;

    /// Syncing -> Synced (terminal).
    async fn mark_synced(&self, key: &IdempotencyKey) -> Result<(), AppError>;

    /// Syncing -> Failed (terminal), recording the rejection reason.
    async fn mark_failed(&self, key: &IdempotencyKey, error: &str) -> Result<(), AppError>;

    /// Syncing -> Pending, recording the retryable error for the next pass.
    async fn mark_pending(&self, key: &IdempotencyKey, error: &str) -> Result<(), AppError>;

    async fn increment_attempt(&self, key: &IdempotencyKey) -> Result<(), AppError>;

    /// Reset records stuck in Syncing back to Pending. Run at startup,
    /// before the first drain pass.
    async fn recover_interrupted(&self) -> Result<u64, AppError>;

    /// Drop synced records older than the cutoff; they have outlived the
    /// duplicate-check window.
    async fn purge_synced(&self, older_than: DateTime<Utc>) -> Result<u64, AppError>;

    /// Remove a record after an operator acknowledged its permanent failure.
    async fn remove(&self, key: &IdempotencyKey) -> Result<bool, AppError>;

    async fn pending_summary(&self) -> Result<Vec<PendingSummary>, AppError>;
}
