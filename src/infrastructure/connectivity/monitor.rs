use tokio::sync::watch;
use tracing::info;

/// Tracks the device's believed online state and notifies subscribers on
/// real transitions only.
///
/// The platform layer reports transitions via `report_online` /
/// `report_offline`; the sync scheduler both subscribes to resumptions and
/// keeps a periodic fallback, since platform transition events are not
/// always reliable.
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx }
    }

    pub fn report_online(&self) {
        let changed = self.tx.send_if_modified(|online| {
            if *online {
                false
            } else {
                *online = true;
                true
            }
        });
        if changed {
            info!("Connectivity resumed");
        }
    }

    pub fn report_offline(&self) {
        let changed = self.tx.send_if_modified(|online| {
            if *online {
                *online = false;
                true
            } else {
                false
            }
        });
        if changed {
            info!("Connectivity lost");
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver that wakes on every transition; the current value tells
    /// resumed apart from lost.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_repeated_reports_do_not_renotify() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.report_offline();
        assert!(!rx.has_changed().unwrap());

        monitor.report_online();
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        monitor.report_online();
        assert!(!rx.has_changed().unwrap());
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn test_transition_wakes_subscriber() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.report_online();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
