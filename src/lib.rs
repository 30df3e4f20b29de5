//! Offline-first capture core for front-desk check-ins and in-person
//! payments.
//!
//! Front-line staff record attendance scans and payments on a shared device
//! that may lose connectivity at any moment and takes input both from a
//! hardware barcode scanner and from a human typing on the same field. This
//! crate makes that capture reliable: keystroke bursts are disambiguated
//! into scan tokens, every capture lands in a durable SQLite outbox before
//! the operator is told anything, and a sync engine drains per-kind FIFO
//! lanes against the remote API with idempotency keys so retries never
//! duplicate a record.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
mod state;

pub use application::ports::{
    OutboxStore, SubmissionAck, SubmissionError, SubmissionGateway,
};
pub use application::services::{
    CaptureAck, CaptureService, Delivery, KeyInput, KeyStroke, KeyTarget, ScanDisambiguator,
    SyncEngine,
};
pub use domain::entities::{
    AttendancePayload, CapturePayload, CaptureRecord, DrainReport, PaymentDraft, PaymentPayload,
    PendingSummary,
};
pub use domain::value_objects::{
    Barcode, IdempotencyKey, OperatorId, PaymentMethod, RecordKind, RecordStatus, ScanToken,
    SubjectUserId,
};
pub use infrastructure::api::HttpSubmissionGateway;
pub use infrastructure::connectivity::ConnectivityMonitor;
pub use infrastructure::database::{Database, DbPool, SqliteOutbox};
pub use shared::config::{
    ApiConfig, CaptureConfig, DatabaseConfig, ScannerConfig, SyncConfig,
};
pub use shared::error::{AppError, Result};
pub use shared::logging::init_logging;
pub use state::CaptureCore;
