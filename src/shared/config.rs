use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub attendance_url: String,
    pub payment_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Periodic drain fallback; also bounds the implicit retry rate.
    pub sync_interval_secs: u64,
    /// How long synced records stay around for duplicate checks.
    pub synced_retention_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Gap above which a keystroke buffer is considered manual typing.
    pub quiet_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./data/frontdesk.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            api: ApiConfig {
                attendance_url: "http://localhost:8080/api/attendance-submit".to_string(),
                payment_url: "http://localhost:8080/api/payment-submit".to_string(),
                request_timeout_secs: 10,
            },
            sync: SyncConfig {
                sync_interval_secs: 30,
                synced_retention_secs: 24 * 60 * 60,
            },
            scanner: ScannerConfig {
                quiet_interval_ms: 300,
            },
        }
    }
}
