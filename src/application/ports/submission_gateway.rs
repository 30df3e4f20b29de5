use async_trait::async_trait;

use crate::domain::entities::{AttendancePayload, PaymentPayload};
use crate::domain::value_objects::IdempotencyKey;

/// Successful acknowledgment from the remote submission API.
///
/// A duplicate acknowledgment means the key was already applied server-side;
/// the sync engine treats it exactly like a first-time acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionAck {
    Accepted,
    Duplicate { original: Option<String> },
}

/// Delivery failure, split by whether a later retry can succeed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    /// Network error, timeout or server unavailability. The same record
    /// will be retried on the next trigger.
    #[error("retryable submission failure: {0}")]
    Retryable(String),

    /// The server rejected the payload as invalid. Retrying the same
    /// payload would fail identically.
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// The remote create/submit contract. Both operations are idempotent under
/// the supplied key.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit_attendance(
        &self,
        key: &IdempotencyKey,
        payload: &AttendancePayload,
    ) -> Result<SubmissionAck, SubmissionError>;

    async fn submit_payment(
        &self,
        key: &IdempotencyKey,
        payload: &PaymentPayload,
    ) -> Result<SubmissionAck, SubmissionError>;
}
