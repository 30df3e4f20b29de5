use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::application::ports::{SubmissionAck, SubmissionError, SubmissionGateway};
use crate::domain::entities::{AttendancePayload, PaymentPayload};
use crate::domain::value_objects::IdempotencyKey;
use crate::shared::config::ApiConfig;

/// Body returned by both submission endpoints.
#[derive(Debug, Deserialize)]
struct SubmitResponseBody {
    result: String,
    #[serde(default)]
    original: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// HTTP client for the remote submission API.
///
/// Every request carries the record's idempotency key, so resubmissions
/// (including ones whose first ack was lost) are harmless.
pub struct HttpSubmissionGateway {
    client: reqwest::Client,
    attendance_url: String,
    payment_url: String,
}

impl HttpSubmissionGateway {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            attendance_url: config.attendance_url.clone(),
            payment_url: config.payment_url.clone(),
        })
    }

    async fn post(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<SubmissionAck, SubmissionError> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| SubmissionError::Retryable(err.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Self::classify_response(status, &text)
    }

    /// Maps a raw HTTP outcome onto the submission contract: success bodies
    /// carry the verdict, 409 means the key was already applied, other 4xx
    /// are permanent rejections, everything else is worth retrying.
    fn classify_response(
        status: reqwest::StatusCode,
        text: &str,
    ) -> Result<SubmissionAck, SubmissionError> {
        if status.is_success() {
            let body: SubmitResponseBody = serde_json::from_str(text)
                .map_err(|err| SubmissionError::Retryable(format!("Malformed ack: {err}")))?;
            return match body.result.as_str() {
                "accepted" => Ok(SubmissionAck::Accepted),
                "duplicate" => Ok(SubmissionAck::Duplicate {
                    original: body.original,
                }),
                "rejected" => Err(SubmissionError::Rejected(
                    body.reason.unwrap_or_else(|| "rejected".to_string()),
                )),
                other => Err(SubmissionError::Retryable(format!(
                    "Unknown ack result: {other}"
                ))),
            };
        }

        // A conflicting key means the effect is already applied server-side.
        if status == reqwest::StatusCode::CONFLICT {
            let original = serde_json::from_str::<SubmitResponseBody>(text)
                .ok()
                .and_then(|body| body.original);
            return Ok(SubmissionAck::Duplicate { original });
        }

        if status.is_client_error() {
            let reason = serde_json::from_str::<SubmitResponseBody>(text)
                .ok()
                .and_then(|body| body.reason)
                .unwrap_or_else(|| text.to_string());
            return Err(SubmissionError::Rejected(format!("{status}: {reason}")));
        }

        Err(SubmissionError::Retryable(format!("{status}: {text}")))
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn submit_attendance(
        &self,
        key: &IdempotencyKey,
        payload: &AttendancePayload,
    ) -> Result<SubmissionAck, SubmissionError> {
        debug!(key = %key, barcode = %payload.barcode, "Submitting attendance");
        let body = serde_json::json!({
            "idempotency_key": key.as_str(),
            "barcode": payload.barcode.as_str(),
            "captured_at": payload.captured_at,
            "operator_id": payload.operator_id.as_str(),
        });
        self.post(&self.attendance_url, body).await
    }

    async fn submit_payment(
        &self,
        key: &IdempotencyKey,
        payload: &PaymentPayload,
    ) -> Result<SubmissionAck, SubmissionError> {
        debug!(key = %key, subject = %payload.subject_user_id, "Submitting payment");
        let body = serde_json::json!({
            "idempotency_key": key.as_str(),
            "subject_user_id": payload.subject_user_id.as_str(),
            "amount": payload.amount,
            "captured_at": payload.captured_at,
            "method": payload.method.as_str(),
            "notes": payload.notes,
        });
        self.post(&self.payment_url, body).await
    }
}
