//! Periodic provider refresh
//!
//! The RefreshScheduler drives [`ProviderDirectory::refresh_with_timeout`]
//! on a fixed interval. It is the only writer of the directory in a running
//! outpost, so refreshes never overlap.
//!
//! ## Failure policy
//!
//! A failed refresh (fetch error, timeout, empty provider list) is logged and
//! reported as a [`RefreshEvent::Failed`]. The loop keeps running and the
//! directory keeps serving the last-known-good set until the next tick.
//!
//! ## Shutdown
//!
//! Shutdown is observed while waiting for a tick and while a fetch is in
//! flight. A fetch interrupted by shutdown is dropped without publishing.

use crate::config::RefreshConfig;
use crate::directory::{ProviderDirectory, RefreshSummary};
use crate::error::Result;
use crate::traits::ProviderSource;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Default capacity of the refresh event channel
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events emitted by the RefreshScheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// A new provider set was published
    Refreshed(RefreshSummary),

    /// A refresh failed; the previous set is still active
    Failed {
        /// Error description
        error: String,
    },

    /// The scheduler stopped
    Stopped,
}

/// Periodically refreshes a directory from a provider source
pub struct RefreshScheduler {
    directory: Arc<ProviderDirectory>,
    source: Arc<dyn ProviderSource>,
    interval: Duration,
    timeout: Duration,
    event_tx: mpsc::Sender<RefreshEvent>,
}

impl RefreshScheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields refresh events
    pub fn new(
        directory: Arc<ProviderDirectory>,
        source: Arc<dyn ProviderSource>,
        config: &RefreshConfig,
    ) -> Result<(Self, mpsc::Receiver<RefreshEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);

        let scheduler = Self {
            directory,
            source,
            interval: config.interval(),
            timeout: config.timeout(),
            event_tx: tx,
        };

        Ok((scheduler, rx))
    }

    /// Refresh once with the configured timeout
    ///
    /// The outcome is also emitted as an event.
    pub async fn refresh_once(&self) -> Result<RefreshSummary> {
        let result = self
            .directory
            .refresh_with_timeout(self.source.as_ref(), self.timeout)
            .await;

        match &result {
            Ok(summary) => self.emit_event(RefreshEvent::Refreshed(summary.clone())),
            Err(e) => {
                warn!(error = %e, "Provider refresh failed, keeping current providers");
                self.emit_event(RefreshEvent::Failed {
                    error: e.to_string(),
                });
            }
        }

        result
    }

    /// Run until ctrl-c
    pub async fn run(&self) {
        self.run_until(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await
            }
        })
        .await
    }

    /// Run until `shutdown_rx` fires
    ///
    /// Without a shutdown receiver (or once its sender is dropped) the loop
    /// runs forever.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) {
        self.run_until(async move {
            match shutdown_rx {
                Some(rx) => {
                    if rx.await.is_err() {
                        std::future::pending::<()>().await
                    }
                }
                None => std::future::pending::<()>().await,
            }
        })
        .await
    }

    /// Refresh immediately, then on every interval tick, until `shutdown` completes
    async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            source = self.source.source_name(),
            interval = ?self.interval,
            timeout = ?self.timeout,
            "Starting provider refresh"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }

            // An in-flight fetch is dropped on shutdown; nothing is published
            tokio::select! {
                // Errors are already logged and emitted
                _ = self.refresh_once() => {}

                _ = &mut shutdown => {
                    info!("Shutdown during provider refresh, abandoning fetch");
                    break;
                }
            }
        }

        info!("Provider refresh stopped");
        self.emit_event(RefreshEvent::Stopped);
    }

    /// Emit a refresh event, dropping it when the channel is full
    fn emit_event(&self, event: RefreshEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Refresh event channel full, dropping event");
        }
    }
}
