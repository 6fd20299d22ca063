// # radius-outpostd - RADIUS Outpost Daemon
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// - This is a THIN integration layer ONLY
// - DO NOT add provider matching, CIDR or refresh logic here
// - All directory logic MUST be in radius-outpost-core
// - Configuration is via environment variables ONLY
//
// The radius-outpostd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Starting the provider refresh loop
// 4. Running the RADIUS listener and metrics endpoint under the Lifecycle
//
// ## Configuration
//
// ### Identity platform
// - `AUTHENTIK_HOST`: Base URL of the identity platform (required)
// - `AUTHENTIK_TOKEN`: Outpost API token (required)
// - `AUTHENTIK_INSECURE`: Accept invalid TLS certificates (true/false)
//
// ### Listeners
// - `AUTHENTIK_LISTEN__RADIUS`: RADIUS bind address (default 0.0.0.0:1812)
// - `AUTHENTIK_LISTEN__METRICS`: Metrics bind address (default 0.0.0.0:9300)
//
// ### Refresh
// - `AUTHENTIK_REFRESH_INTERVAL`: Seconds between provider refreshes (default 150)
// - `AUTHENTIK_REFRESH_TIMEOUT`: Deadline for one refresh in seconds (default 30)
//
// ### Logging
// - `AUTHENTIK_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export AUTHENTIK_HOST=https://auth.example.com
// export AUTHENTIK_TOKEN=your_outpost_token
//
// radius-outpostd
// ```

mod listener;
mod telemetry;

use anyhow::{Context, Result};
use radius_outpost_api::ApiProviderSource;
use radius_outpost_core::{
    ApiConfig, Lifecycle, ListenerConfig, OutpostConfig, ProviderDirectory, RefreshConfig,
    RefreshScheduler, TelemetryConfig,
};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::listener::UdpListener;
use crate::telemetry::PrometheusTelemetry;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error, including a failed RADIUS listener
#[derive(Debug, Clone, Copy)]
enum OutpostExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (listener failure or unexpected fault)
    RuntimeError = 2,
}

impl From<OutpostExitCode> for ExitCode {
    fn from(code: OutpostExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    outpost: OutpostConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = OutpostConfig::default();

        let api = ApiConfig {
            host: lookup("AUTHENTIK_HOST").unwrap_or_default(),
            token: lookup("AUTHENTIK_TOKEN").unwrap_or_default(),
            insecure: match lookup("AUTHENTIK_INSECURE") {
                Some(value) => parse_bool("AUTHENTIK_INSECURE", &value)?,
                None => defaults.api.insecure,
            },
            ..defaults.api
        };

        let listener = ListenerConfig {
            listen_addr: lookup("AUTHENTIK_LISTEN__RADIUS")
                .unwrap_or(defaults.listener.listen_addr),
        };

        let telemetry = TelemetryConfig {
            listen_addr: lookup("AUTHENTIK_LISTEN__METRICS")
                .unwrap_or(defaults.telemetry.listen_addr),
        };

        let refresh = RefreshConfig {
            interval_secs: parse_number(
                "AUTHENTIK_REFRESH_INTERVAL",
                lookup("AUTHENTIK_REFRESH_INTERVAL"),
                defaults.refresh.interval_secs,
            )?,
            timeout_secs: parse_number(
                "AUTHENTIK_REFRESH_TIMEOUT",
                lookup("AUTHENTIK_REFRESH_TIMEOUT"),
                defaults.refresh.timeout_secs,
            )?,
        };

        Ok(Self {
            outpost: OutpostConfig {
                api,
                listener,
                telemetry,
                refresh,
            },
            log_level: lookup("AUTHENTIK_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.outpost.api.host.is_empty() {
            anyhow::bail!(
                "AUTHENTIK_HOST is required. \
                Set it via: export AUTHENTIK_HOST=https://auth.example.com"
            );
        }

        if self.outpost.api.token.is_empty() {
            anyhow::bail!(
                "AUTHENTIK_TOKEN is required. \
                Set it via: export AUTHENTIK_TOKEN=your_outpost_token"
            );
        }

        self.outpost.validate()?;

        self.log_level()?;

        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "AUTHENTIK_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", name, value),
    }
}

fn parse_number<T>(name: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a number. Got: {} ({})", name, raw, e)),
        None => Ok(default),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return OutpostExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return OutpostExitCode::ConfigError.into();
    }

    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return OutpostExitCode::ConfigError.into();
    }

    info!("Starting radius-outpostd daemon");
    info!(
        host = %config.outpost.api.host,
        radius = %config.outpost.listener.listen_addr,
        metrics = %config.outpost.telemetry.listen_addr,
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return OutpostExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_outpost(config.outpost).await {
            error!("Outpost error: {:#}", e);
            OutpostExitCode::RuntimeError
        } else {
            OutpostExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the outpost until a shutdown signal or a fatal listener error
async fn run_outpost(config: OutpostConfig) -> Result<()> {
    let directory = Arc::new(ProviderDirectory::new());
    let source = Arc::new(ApiProviderSource::new(&config.api)?);

    // Recorder first, so the initial refresh is not lost
    let mut metrics = PrometheusTelemetry::new(config.telemetry.socket_addr()?);
    if let Err(e) = metrics.install() {
        warn!(error = %e, "Metrics unavailable");
    }

    let (scheduler, events) = RefreshScheduler::new(directory.clone(), source, &config.refresh)?;
    let (stop_refresh, refresh_shutdown) = oneshot::channel();
    let refresh_task =
        tokio::spawn(async move { scheduler.run_with_shutdown(Some(refresh_shutdown)).await });
    let events_task = tokio::spawn(telemetry::record_refresh_events(events));

    let listener = UdpListener::new(config.listener.socket_addr()?, directory.clone());
    let lifecycle = Lifecycle::new(Arc::new(listener), Arc::new(metrics));

    let (stop_lifecycle, lifecycle_shutdown) = oneshot::channel();
    let lifecycle_run = lifecycle.run_with_shutdown(Some(lifecycle_shutdown));
    tokio::pin!(lifecycle_run);

    let outcome = tokio::select! {
        result = &mut lifecycle_run => result,

        received = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", received?);
            let _ = stop_lifecycle.send(());
            lifecycle_run.await
        }
    };

    let _ = stop_refresh.send(());
    refresh_task.await.context("Provider refresh task failed")?;
    events_task.await.context("Refresh event task failed")?;

    outcome.context("RADIUS outpost stopped")?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
