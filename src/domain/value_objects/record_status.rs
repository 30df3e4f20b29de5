use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery state of an outbox record.
///
/// `Synced` and `Failed` are terminal: no further submission attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Syncing => "syncing",
            RecordStatus::Synced => "synced",
            RecordStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(RecordStatus::Pending),
            "syncing" => Ok(RecordStatus::Syncing),
            "synced" => Ok(RecordStatus::Synced),
            "failed" => Ok(RecordStatus::Failed),
            other => Err(format!("Unknown record status: {other}")),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
