//! Error types for the RADIUS outpost
//!
//! This module defines all error types used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for outpost operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the RADIUS outpost
#[derive(Error, Debug)]
pub enum Error {
    /// The remote configuration source failed (transport or API error)
    #[error("Configuration source error: {0}")]
    ConfigSource(String),

    /// The configuration source answered but defined no provider
    #[error("no radius provider defined")]
    NoProviders,

    /// A refresh was cancelled before the fetch completed
    #[error("Refresh cancelled")]
    Cancelled,

    /// A refresh exceeded its deadline
    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),

    /// A single client network segment could not be parsed
    #[error("Failed to parse CIDR '{segment}': {message}")]
    CidrParse {
        /// Offending segment text
        segment: String,
        /// Parser message
        message: String,
    },

    /// The protocol listener stopped with an error; the outpost cannot serve
    #[error("Protocol listener failed: {0}")]
    ListenerFatal(String),

    /// The telemetry endpoint failed
    #[error("Telemetry endpoint error: {0}")]
    Telemetry(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication against the configuration API failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// A configuration source answered with a body that does not decode
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration source error
    pub fn config_source(msg: impl Into<String>) -> Self {
        Self::ConfigSource(msg.into())
    }

    /// Create a CIDR parse error
    pub fn cidr_parse(segment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CidrParse {
            segment: segment.into(),
            message: message.into(),
        }
    }

    /// Create a fatal listener error
    pub fn listener_fatal(msg: impl Into<String>) -> Self {
        Self::ListenerFatal(msg.into())
    }

    /// Create a telemetry error
    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Whether this error must terminate the process
    ///
    /// Only a failed protocol listener is fatal. Refresh failures leave the
    /// last-known-good provider set serving.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ListenerFatal(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
