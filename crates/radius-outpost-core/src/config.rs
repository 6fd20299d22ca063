//! Configuration types for the RADIUS outpost
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main outpost configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutpostConfig {
    /// Identity platform API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Protocol listener configuration
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Telemetry endpoint configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Provider refresh settings
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl OutpostConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.api.validate()?;
        self.listener.validate()?;
        self.telemetry.validate()?;
        self.refresh.validate()?;
        Ok(())
    }
}

/// Identity platform API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the identity platform (e.g. "https://auth.example.com")
    #[serde(default)]
    pub host: String,

    /// Outpost API token
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub token: String,

    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure: bool,

    /// HTTP request timeout (in seconds)
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Create an API configuration for the given host and token
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// Validate the API configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.is_empty() {
            return Err(crate::Error::config("API host cannot be empty"));
        }
        if !self.host.starts_with("https://") && !self.host.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "API host must use HTTP or HTTPS scheme. Got: {}",
                self.host
            )));
        }
        if self.token.is_empty() {
            return Err(crate::Error::config("API token cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("API timeout must be > 0"));
        }
        Ok(())
    }

    /// HTTP request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: String::new(),
            insecure: false,
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("token", &"<REDACTED>")
            .field("insecure", &self.insecure)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Protocol listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Address the RADIUS listener binds to
    #[serde(default = "default_listener_addr")]
    pub listen_addr: String,
}

impl ListenerConfig {
    /// Validate the listener configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        parse_socket_addr("listener", &self.listen_addr).map(|_| ())
    }

    /// Parsed bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, crate::Error> {
        parse_socket_addr("listener", &self.listen_addr)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listener_addr(),
        }
    }
}

/// Telemetry endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Address the metrics endpoint binds to
    #[serde(default = "default_telemetry_addr")]
    pub listen_addr: String,
}

impl TelemetryConfig {
    /// Validate the telemetry configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        parse_socket_addr("telemetry", &self.listen_addr).map(|_| ())
    }

    /// Parsed bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, crate::Error> {
        parse_socket_addr("telemetry", &self.listen_addr)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_telemetry_addr(),
        }
    }
}

/// Provider refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Interval between provider refreshes (in seconds)
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,

    /// Deadline for a single refresh fetch (in seconds)
    ///
    /// A refresh that exceeds it is treated as a failed fetch and the
    /// active provider set stays untouched.
    #[serde(default = "default_refresh_timeout_secs")]
    pub timeout_secs: u64,
}

impl RefreshConfig {
    /// Validate the refresh settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Refresh interval must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Refresh timeout must be > 0"));
        }
        if self.timeout_secs > self.interval_secs {
            return Err(crate::Error::config(format!(
                "Refresh timeout ({}s) cannot exceed refresh interval ({}s)",
                self.timeout_secs, self.interval_secs
            )));
        }
        Ok(())
    }

    /// Interval between refreshes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Deadline for a single refresh
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval_secs(),
            timeout_secs: default_refresh_timeout_secs(),
        }
    }
}

fn parse_socket_addr(what: &str, addr: &str) -> Result<SocketAddr, crate::Error> {
    addr.parse().map_err(|e| {
        crate::Error::config(format!("Invalid {} address '{}': {}", what, addr, e))
    })
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_listener_addr() -> String {
    "0.0.0.0:1812".to_string()
}

fn default_telemetry_addr() -> String {
    "0.0.0.0:9300".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    150
}

fn default_refresh_timeout_secs() -> u64 {
    30
}
