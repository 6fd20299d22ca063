//! Lifecycle orchestrator
//!
//! The Lifecycle is responsible for:
//! - Starting the protocol listener and the telemetry endpoint concurrently
//! - Waiting on both for the life of the process
//! - Turning a listener failure into a fatal, structured result
//!
//! ## Supervision
//!
//! ```text
//!                 ┌─────────────┐
//!                 │  Lifecycle  │
//!                 └─────────────┘
//!                   │         │
//!          spawn    ▼         ▼    spawn
//! ┌──────────────────┐       ┌───────────────────┐
//! │ ProtocolListener │       │ TelemetryEndpoint │
//! │ (mandatory)      │       │ (best effort)     │
//! └──────────────────┘       └───────────────────┘
//! ```
//!
//! | Task      | Err / panic                                   | Ok                |
//! |-----------|-----------------------------------------------|-------------------|
//! | listener  | abort telemetry, return `Error::ListenerFatal` | wait for telemetry |
//! | telemetry | log, keep serving                             | wait for listener |
//!
//! The caller (the daemon) maps a fatal result to a non-zero exit so the
//! supervisor restarts the process.

use crate::error::{Error, Result};
use crate::traits::{ProtocolListener, TelemetryEndpoint};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Supervises the outpost's two long-running tasks
pub struct Lifecycle {
    listener: Arc<dyn ProtocolListener>,
    telemetry: Arc<dyn TelemetryEndpoint>,
}

impl Lifecycle {
    /// Create a new lifecycle orchestrator
    pub fn new(listener: Arc<dyn ProtocolListener>, telemetry: Arc<dyn TelemetryEndpoint>) -> Self {
        Self {
            listener,
            telemetry,
        }
    }

    /// Run both tasks until they finish
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Both tasks completed without error
    /// - `Err(Error::ListenerFatal)`: The protocol listener failed
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(None).await
    }

    /// Run both tasks until they finish or `shutdown_rx` fires
    ///
    /// On shutdown both tasks are aborted and `Ok(())` is returned.
    pub async fn run_with_shutdown(self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let listen_addr = self.listener.listen_addr();

        let telemetry = Arc::clone(&self.telemetry);
        let mut telemetry_task: JoinHandle<Result<()>> =
            tokio::spawn(async move { telemetry.serve().await });

        let listener = Arc::clone(&self.listener);
        info!(listen = %listen_addr, "Starting radius server");
        let mut listener_task: JoinHandle<Result<()>> =
            tokio::spawn(async move { listener.serve().await });

        let mut shutdown = shutdown_rx;
        let mut listener_done = false;
        let mut telemetry_done = false;

        while !(listener_done && telemetry_done) {
            tokio::select! {
                joined = &mut listener_task, if !listener_done => {
                    listener_done = true;
                    if let Err(e) = flatten(joined) {
                        error!(listen = %listen_addr, error = %e, "Protocol listener failed");
                        telemetry_task.abort();
                        return Err(Error::listener_fatal(e.to_string()));
                    }
                    info!(listen = %listen_addr, "Protocol listener stopped");
                }

                joined = &mut telemetry_task, if !telemetry_done => {
                    telemetry_done = true;
                    match flatten(joined) {
                        Ok(()) => info!("Telemetry endpoint stopped"),
                        Err(e) => warn!(
                            error = %e,
                            "Telemetry endpoint failed, continuing without metrics"
                        ),
                    }
                }

                _ = wait_for(&mut shutdown) => {
                    info!("Shutdown signal received");
                    listener_task.abort();
                    telemetry_task.abort();
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

fn flatten(joined: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(Error::Other("task panicked".to_string())),
        Err(e) => Err(Error::Other(e.to_string())),
    }
}

/// Resolve when the shutdown signal fires; never resolve without one
///
/// A dropped sender counts as "no shutdown requested".
async fn wait_for(shutdown: &mut Option<oneshot::Receiver<()>>) {
    match shutdown.as_mut() {
        Some(rx) => {
            if rx.await.is_err() {
                *shutdown = None;
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}
