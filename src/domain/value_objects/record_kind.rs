use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of physical events the front desk records.
///
/// The kind selects the submission endpoint and the payload shape, and
/// defines the FIFO lane a record is drained in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Attendance,
    Payment,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Attendance, RecordKind::Payment];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Attendance => "attendance",
            RecordKind::Payment => "payment",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "attendance" => Ok(RecordKind::Attendance),
            "payment" => Ok(RecordKind::Payment),
            other => Err(format!("Unknown record kind: {other}")),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
