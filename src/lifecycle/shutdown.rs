//! Signal handling for graceful shutdown

use tracing::debug;

/// Waits for a shutdown request (Ctrl-C everywhere, SIGTERM on Unix)
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    pub async fn wait(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    debug!(error = %e, "SIGTERM handler unavailable, waiting on Ctrl-C only");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => {
                    debug!("received SIGTERM");
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("received Ctrl-C");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            debug!("received Ctrl-C");
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
