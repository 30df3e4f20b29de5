use chrono::DateTime;

use super::rows::OutboxRecordRow;
use crate::domain::entities::{CapturePayload, CaptureRecord};
use crate::domain::value_objects::{IdempotencyKey, RecordKind, RecordStatus};
use crate::shared::error::AppError;

pub(super) fn record_from_row(row: OutboxRecordRow) -> Result<CaptureRecord, AppError> {
    let kind = RecordKind::parse(&row.kind).map_err(AppError::Internal)?;
    let status = RecordStatus::parse(&row.status).map_err(AppError::Internal)?;
    let idempotency_key = IdempotencyKey::new(row.idempotency_key).map_err(AppError::Internal)?;

    let payload = match kind {
        RecordKind::Attendance => CapturePayload::Attendance(serde_json::from_str(&row.payload)?),
        RecordKind::Payment => CapturePayload::Payment(serde_json::from_str(&row.payload)?),
    };

    let created_at = DateTime::from_timestamp_micros(row.created_at)
        .ok_or_else(|| AppError::Internal(format!("Invalid created_at: {}", row.created_at)))?;
    let synced_at = row
        .synced_at
        .map(|micros| {
            DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| AppError::Internal(format!("Invalid synced_at: {micros}")))
        })
        .transpose()?;

    Ok(CaptureRecord {
        idempotency_key,
        kind,
        payload,
        status,
        attempts: u32::try_from(row.attempts).unwrap_or(0),
        created_at,
        synced_at,
        last_error: row.last_error,
    })
}

pub(super) fn payload_json(record: &CaptureRecord) -> Result<String, AppError> {
    let json = match &record.payload {
        CapturePayload::Attendance(payload) => serde_json::to_string(payload)?,
        CapturePayload::Payment(payload) => serde_json::to_string(payload)?,
    };
    Ok(json)
}
