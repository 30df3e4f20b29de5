pub mod capture_service;
pub mod scan_service;
pub mod sync_service;

pub use capture_service::{CaptureAck, CaptureService, Delivery};
pub use scan_service::{KeyInput, KeyStroke, KeyTarget, ScanDisambiguator};
pub use sync_service::SyncEngine;
