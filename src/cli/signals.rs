//! Ctrl+C handling while recording

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Set once SIGINT or SIGTERM arrives; recording stops early and the file is
/// still written.
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Install the SIGINT and SIGTERM listeners
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
            let shutdown = Arc::clone(&self.shutdown);
            let mut stream = signal(kind)?;
            tokio::spawn(async move {
                stream.recv().await;
                info!("shutdown requested");
                shutdown.store(true, Ordering::SeqCst);
            });
        }
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_signal_default_is_false() {
        assert!(!ShutdownSignal::new().is_shutdown());
    }

    #[test]
    fn shutdown_signal_flag_can_be_set() {
        let signal = ShutdownSignal::new();
        signal.flag().store(true, Ordering::SeqCst);
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn setup_installs_handlers() {
        let signal = ShutdownSignal::new();
        assert!(signal.setup().await.is_ok());
        assert!(!signal.is_shutdown());
    }
}
