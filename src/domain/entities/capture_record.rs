use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    Barcode, IdempotencyKey, OperatorId, PaymentMethod, RecordKind, RecordStatus, SubjectUserId,
};

/// An attendance scan as captured at the desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendancePayload {
    pub barcode: Barcode,
    pub captured_at: DateTime<Utc>,
    pub operator_id: OperatorId,
}

/// An in-person payment as captured at the desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub subject_user_id: SubjectUserId,
    pub amount: Decimal,
    pub captured_at: DateTime<Utc>,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payment fields supplied by the capture form; the capture flow adds the
/// timestamp and the idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub subject_user_id: SubjectUserId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

/// Kind-specific payload of a capture record. Opaque to the outbox,
/// validated only by the remote API.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturePayload {
    Attendance(AttendancePayload),
    Payment(PaymentPayload),
}

impl CapturePayload {
    pub fn kind(&self) -> RecordKind {
        match self {
            CapturePayload::Attendance(_) => RecordKind::Attendance,
            CapturePayload::Payment(_) => RecordKind::Payment,
        }
    }

    /// Natural identifier of the event, used in idempotency key derivation.
    pub fn natural_key(&self) -> &str {
        match self {
            CapturePayload::Attendance(payload) => payload.barcode.as_str(),
            CapturePayload::Payment(payload) => payload.subject_user_id.as_str(),
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        match self {
            CapturePayload::Attendance(payload) => payload.captured_at,
            CapturePayload::Payment(payload) => payload.captured_at,
        }
    }
}

/// A pending or completed unit of capture work.
///
/// Created by the capture flow, mutated only by the sync engine, purged
/// after confirmed synchronization or operator acknowledgment of failure.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub idempotency_key: IdempotencyKey,
    pub kind: RecordKind,
    pub payload: CapturePayload,
    pub status: RecordStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl CaptureRecord {
    fn from_payload(payload: CapturePayload) -> Self {
        let kind = payload.kind();
        let captured_at = payload.captured_at();
        let idempotency_key = IdempotencyKey::derive(kind, payload.natural_key(), captured_at);
        Self {
            idempotency_key,
            kind,
            payload,
            status: RecordStatus::Pending,
            attempts: 0,
            created_at: captured_at,
            synced_at: None,
            last_error: None,
        }
    }

    pub fn attendance(barcode: Barcode, operator_id: OperatorId, captured_at: DateTime<Utc>) -> Self {
        Self::from_payload(CapturePayload::Attendance(AttendancePayload {
            barcode,
            captured_at,
            operator_id,
        }))
    }

    pub fn payment(draft: PaymentDraft, captured_at: DateTime<Utc>) -> Self {
        Self::from_payload(CapturePayload::Payment(PaymentPayload {
            subject_user_id: draft.subject_user_id,
            amount: draft.amount,
            captured_at,
            method: draft.method,
            notes: draft.notes,
        }))
    }
}
