// Prometheus telemetry endpoint and outpost metrics

use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{ExporterFuture, PrometheusBuilder};
use radius_outpost_core::traits::TelemetryEndpoint;
use radius_outpost_core::{Error, RefreshEvent, Result};
use std::net::SocketAddr;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

pub const REQUESTS_TOTAL: &str = "authentik_outpost_radius_requests_total";
pub const REQUESTS_REJECTED_TOTAL: &str = "authentik_outpost_radius_requests_rejected_total";
pub const PROVIDERS: &str = "authentik_outpost_radius_providers";
pub const REFRESH_FAILURES_TOTAL: &str = "authentik_outpost_radius_refresh_failures_total";

/// Serves the process's metrics in Prometheus text format
///
/// [`install`](Self::install) binds the endpoint and installs the global
/// recorder; [`serve`](TelemetryEndpoint::serve) answers scrapes. Metrics
/// recorded between the two are kept.
pub struct PrometheusTelemetry {
    addr: SocketAddr,
    exporter: Mutex<Option<ExporterFuture>>,
}

impl PrometheusTelemetry {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            exporter: Mutex::new(None),
        }
    }

    /// Bind the endpoint and install the process-wide metrics recorder
    ///
    /// Must run inside the tokio runtime, before anything records metrics.
    pub fn install(&mut self) -> Result<()> {
        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .build()
            .map_err(|e| {
                Error::telemetry(format!(
                    "Failed to start metrics endpoint on {}: {}",
                    self.addr, e
                ))
            })?;

        metrics::set_global_recorder(recorder)
            .map_err(|_| Error::telemetry("A metrics recorder is already installed"))?;
        describe_metrics();

        *self.exporter.get_mut() = Some(exporter);
        Ok(())
    }
}

#[async_trait]
impl TelemetryEndpoint for PrometheusTelemetry {
    async fn serve(&self) -> Result<()> {
        let exporter = self.exporter.lock().await.take().ok_or_else(|| {
            Error::telemetry(format!("Metrics endpoint on {} is not installed", self.addr))
        })?;

        info!(listen = %self.addr, "Serving metrics");

        exporter
            .await
            .map_err(|_| Error::telemetry(format!("Metrics endpoint on {} stopped", self.addr)))
    }
}

fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "RADIUS datagrams received, by outcome");
    describe_counter!(REQUESTS_REJECTED_TOTAL, "RADIUS datagrams rejected, by reason");
    describe_gauge!(PROVIDERS, "Providers in the active directory");
    describe_counter!(REFRESH_FAILURES_TOTAL, "Failed provider refreshes");
}

pub fn record_request(outcome: &'static str) {
    counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_rejection(reason: &'static str) {
    counter!(REQUESTS_REJECTED_TOTAL, "reason" => reason).increment(1);
}

/// Mirror refresh events into metrics until the scheduler stops
pub async fn record_refresh_events(mut events: mpsc::Receiver<RefreshEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            RefreshEvent::Refreshed(summary) => {
                debug!(providers = summary.providers, "Recording provider count");
                gauge!(PROVIDERS).set(summary.providers as f64);
            }
            RefreshEvent::Failed { .. } => {
                counter!(REFRESH_FAILURES_TOTAL).increment(1);
            }
            RefreshEvent::Stopped => break,
        }
    }
}
