use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

use super::mappers::{payload_json, record_from_row};
use super::queries;
use super::rows::OutboxRecordRow;
use crate::application::ports::OutboxStore;
use crate::domain::entities::{CaptureRecord, PendingSummary};
use crate::domain::value_objects::{IdempotencyKey, RecordKind, RecordStatus};
use crate::shared::error::AppError;

/// SQLite-backed outbox. The single durable store of this core.
pub struct SqliteOutbox {
    pool: Pool<Sqlite>,
}

impl SqliteOutbox {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Status-guarded single-row transition. A guard miss means the record
    /// is gone or not in the expected state; surfaced, never swallowed.
    async fn transition(
        &self,
        query: &str,
        key: &IdempotencyKey,
        bind_error: Option<&str>,
        expected_from: RecordStatus,
    ) -> Result<(), AppError> {
        let mut q = sqlx::query(query).bind(key.as_str());
        if let Some(error) = bind_error {
            q = q.bind(error);
        }
        let result = q.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Record {} is not in state {}",
                key, expected_from
            )));
        }
        Ok(())
    }

    async fn fetch_records(
        &self,
        query: &str,
        kind: RecordKind,
    ) -> Result<Vec<CaptureRecord>, AppError> {
        let rows = sqlx::query_as::<_, OutboxRecordRow>(query)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(record_from_row).collect()
    }
}

#[async_trait]
impl OutboxStore for SqliteOutbox {
    async fn enqueue(&self, record: &CaptureRecord) -> Result<(), AppError> {
        let payload = payload_json(record)?;

        sqlx::query(queries::INSERT_RECORD)
            .bind(record.idempotency_key.as_str())
            .bind(record.kind.as_str())
            .bind(&payload)
            .bind(record.status.as_str())
            .bind(i64::from(record.attempts))
            .bind(record.created_at.timestamp_micros())
            .execute(&self.pool)
            .await?;

        debug!(key = %record.idempotency_key, kind = %record.kind, "Record enqueued");
        Ok(())
    }

    async fn get(&self, key: &IdempotencyKey) -> Result<Option<CaptureRecord>, AppError> {
        let row = sqlx::query_as::<_, OutboxRecordRow>(queries::SELECT_BY_KEY)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(record_from_row).transpose()
    }

    async fn list_pending(&self, kind: RecordKind) -> Result<Vec<CaptureRecord>, AppError> {
        self.fetch_records(queries::SELECT_PENDING_BY_KIND, kind).await
    }

    async fn list_failed(&self, kind: RecordKind) -> Result<Vec<CaptureRecord>, AppError> {
        self.fetch_records(queries::SELECT_FAILED_BY_KIND, kind).await
    }

    async fn mark_syncing(&self, key: &IdempotencyKey) -> Result<(), AppError> {
        self.transition(queries::MARK_SYNCING, key, None, RecordStatus::Pending)
            .await
    }

    async fn mark_synced(&self, key: &IdempotencyKey) -> Result<(), AppError> {
        let result = sqlx::query(queries::MARK_SYNCED)
            .bind(key.as_str())
            .bind(Utc::now().timestamp_micros())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Record {} is not in state {}",
                key,
                RecordStatus::Syncing
            )));
        }
        Ok(())
    }

    async fn mark_failed(&self, key: &IdempotencyKey, error: &str) -> Result<(), AppError> {
        self.transition(queries::MARK_FAILED, key, Some(error), RecordStatus::Syncing)
            .await
    }

    async fn mark_pending(&self, key: &IdempotencyKey, error: &str) -> Result<(), AppError> {
        self.transition(queries::MARK_PENDING, key, Some(error), RecordStatus::Syncing)
            .await
    }

    async fn increment_attempt(&self, key: &IdempotencyKey) -> Result<(), AppError> {
        let result = sqlx::query(queries::INCREMENT_ATTEMPT)
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Record {} not found", key)));
        }
        Ok(())
    }

    async fn recover_interrupted(&self) -> Result<u64, AppError> {
        let result = sqlx::query(queries::RECOVER_INTERRUPTED)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_synced(&self, older_than: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(queries::PURGE_SYNCED_BEFORE)
            .bind(older_than.timestamp_micros())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn remove(&self, key: &IdempotencyKey) -> Result<bool, AppError> {
        let result = sqlx::query(queries::DELETE_BY_KEY)
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pending_summary(&self) -> Result<Vec<PendingSummary>, AppError> {
        let rows = sqlx::query(queries::SELECT_SUMMARY)
            .fetch_all(&self.pool)
            .await?;

        let mut summary = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.try_get("kind")?;
            let pending: i64 = row.try_get("pending_count").unwrap_or(0);
            let failed: i64 = row.try_get("failed_count").unwrap_or(0);
            summary.push(PendingSummary {
                kind: RecordKind::parse(&kind).map_err(AppError::Internal)?,
                pending: u64::try_from(pending).unwrap_or(0),
                failed: u64::try_from(failed).unwrap_or(0),
            });
        }
        Ok(summary)
    }
}
