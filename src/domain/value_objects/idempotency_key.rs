use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::record_kind::RecordKind;

/// Client-generated identifier that makes repeated delivery of the same
/// logical event harmless.
///
/// Derived once when the record is created and never regenerated on retry.
/// Consumers treat it as an opaque unique string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Idempotency key cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    /// Derive a fresh key from the event's natural identifier and its
    /// high-resolution capture timestamp.
    ///
    /// Two independent captures of the same natural key get distinct keys;
    /// the uuid suffix covers the same-microsecond case.
    pub fn derive(kind: RecordKind, natural_key: &str, captured_at: DateTime<Utc>) -> Self {
        let micros = captured_at.timestamp_micros();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}:{}:{}:{}",
            kind.as_str(),
            natural_key,
            micros,
            &suffix[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.0
    }
}
