use serde::{Deserialize, Serialize};

use crate::domain::value_objects::RecordKind;

/// Outcome of one drain pass over a single lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub kind: RecordKind,
    /// Records acknowledged this pass (including duplicate acks).
    pub synced: u32,
    /// Records rejected permanently this pass.
    pub failed: u32,
    /// Records left pending for the next trigger.
    pub deferred: u32,
}

impl DrainReport {
    pub fn empty(kind: RecordKind) -> Self {
        Self {
            kind,
            synced: 0,
            failed: 0,
            deferred: 0,
        }
    }
}

/// Per-kind backlog counts for the capture UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSummary {
    pub kind: RecordKind,
    pub pending: u64,
    pub failed: u64,
}
