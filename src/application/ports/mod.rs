pub mod outbox_store;
pub mod submission_gateway;

pub use outbox_store::OutboxStore;
pub use submission_gateway::{SubmissionAck, SubmissionError, SubmissionGateway};
