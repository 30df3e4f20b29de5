pub mod barcode;
pub mod idempotency_key;
pub mod operator_id;
pub mod payment_method;
pub mod record_kind;
pub mod record_status;
pub mod scan_token;
pub mod subject_user_id;

pub use barcode::Barcode;
pub use idempotency_key::IdempotencyKey;
pub use operator_id::OperatorId;
pub use payment_method::PaymentMethod;
pub use record_kind::RecordKind;
pub use record_status::RecordStatus;
pub use scan_token::ScanToken;
pub use subject_user_id::SubjectUserId;
