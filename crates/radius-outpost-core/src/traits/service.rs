// # Service Traits
//
// The two long-running tasks the lifecycle orchestrator supervises.
//
// A `ProtocolListener` owns its socket and bind configuration. Per inbound
// request it resolves the client address through `ProviderDirectory::lookup`
// and rejects the request when no provider matches. A `TelemetryEndpoint`
// has no data dependency on the directory.

use async_trait::async_trait;

/// Trait for the RADIUS protocol listener
///
/// `serve()` is expected to run forever. Returning `Err` means the outpost
/// can no longer authenticate anyone; the orchestrator treats it as fatal.
#[async_trait]
pub trait ProtocolListener: Send + Sync {
    /// Bind and serve until failure
    async fn serve(&self) -> Result<(), crate::Error>;

    /// Address the listener binds to (for logging)
    fn listen_addr(&self) -> String;
}

/// Trait for the telemetry endpoint
///
/// `serve()` is expected to run forever. Its failure is logged but does not
/// stop authentication traffic.
#[async_trait]
pub trait TelemetryEndpoint: Send + Sync {
    /// Bind and serve until failure
    async fn serve(&self) -> Result<(), crate::Error>;
}
