pub mod capture_record;
pub mod drain_report;

pub use capture_record::{
    AttendancePayload, CapturePayload, CaptureRecord, PaymentDraft, PaymentPayload,
};
pub use drain_report::{DrainReport, PendingSummary};
