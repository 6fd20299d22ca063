//! Collaborator traits for the RADIUS outpost
//!
//! The core owns provider state and lifecycle; everything that touches the
//! network sits behind one of these interfaces.
//!
//! - [`ProviderSource`]: Fetch provider configuration from the identity platform
//! - [`ProtocolListener`]: Serve the RADIUS protocol, resolving clients via the directory
//! - [`TelemetryEndpoint`]: Serve metrics

pub mod provider_source;
pub mod service;

pub use provider_source::{ProviderConfig, ProviderSource};
pub use service::{ProtocolListener, TelemetryEndpoint};
