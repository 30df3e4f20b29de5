use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::application::ports::{OutboxStore, SubmissionGateway};
use crate::application::services::{CaptureService, ScanDisambiguator, SyncEngine};
use crate::infrastructure::api::HttpSubmissionGateway;
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::infrastructure::database::{Database, DbPool, SqliteOutbox};
use crate::shared::config::CaptureConfig;
use crate::shared::error::Result;

/// Wired-up capture core: database, outbox, gateway, monitor and services.
///
/// The embedding layer (desktop shell, kiosk app) constructs one of these at
/// startup, feeds keyboard events to a [`ScanDisambiguator`], reports
/// connectivity transitions, and calls the capture operations.
pub struct CaptureCore {
    config: CaptureConfig,
    pool: DbPool,
    monitor: Arc<ConnectivityMonitor>,
    engine: Arc<SyncEngine>,
    capture: CaptureService,
}

impl CaptureCore {
    pub async fn new(config: CaptureConfig) -> Result<Self> {
        let pool = Database::initialize(&config.database).await?;

        let outbox: Arc<dyn OutboxStore> = Arc::new(SqliteOutbox::new(pool.clone()));

        // Records interrupted mid-flight by a previous teardown go back to
        // pending before the first drain pass.
        let recovered = outbox.recover_interrupted().await?;
        if recovered > 0 {
            info!(recovered, "Reset interrupted records to pending");
        }

        let gateway: Arc<dyn SubmissionGateway> =
            Arc::new(HttpSubmissionGateway::new(&config.api)?);
        let monitor = Arc::new(ConnectivityMonitor::default());
        let engine = Arc::new(SyncEngine::new(
            outbox.clone(),
            gateway,
            monitor.clone(),
            config.sync.clone(),
        ));
        let capture = CaptureService::new(outbox, engine.clone(), monitor.clone());

        Ok(Self {
            config,
            pool,
            monitor,
            engine,
            capture,
        })
    }

    /// Capture operations: submit-or-queue, failed-record review, summary.
    pub fn capture(&self) -> &CaptureService {
        &self.capture
    }

    /// Connectivity reporting surface for the platform layer.
    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    /// A fresh disambiguator for a capture screen's keystroke stream,
    /// configured with the crate-wide quiet interval.
    pub fn scan_disambiguator(&self) -> ScanDisambiguator {
        ScanDisambiguator::new(Duration::from_millis(self.config.scanner.quiet_interval_ms))
    }

    /// Start the background drain loop (connectivity resumes + periodic
    /// fallback). Abort the handle on shutdown.
    pub fn spawn_scheduler(&self) -> JoinHandle<()> {
        self.engine.spawn_scheduler()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
