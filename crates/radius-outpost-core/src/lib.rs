// # radius-outpost-core
//
// Core library for the RADIUS outpost.
//
// ## Architecture Overview
//
// This library provides the authorization state and lifecycle of an outpost
// that terminates RADIUS on behalf of an identity platform:
// - **CidrRuleSet**: A provider's client networks, most specific first
// - **ProviderRecord**: Immutable snapshot of one provider (secret, networks, slugs)
// - **ProviderDirectory**: Atomically swappable set of providers with lock-free lookup
// - **RefreshScheduler**: Periodic refresh of the directory from a ProviderSource
// - **Lifecycle**: Supervises the protocol listener and the telemetry endpoint
// - **ProviderSource / ProtocolListener / TelemetryEndpoint**: Collaborator traits
//
// ## Design Principles
//
// 1. **Whole-set replacement**: A refresh publishes a complete provider set or nothing
// 2. **Lock-free reads**: Lookups never wait on a refresh
// 3. **Explicit handles**: The directory is passed by `Arc`, never held in a global
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Fail fast**: A dead protocol listener ends the process; a failed refresh does not

pub mod traits;
pub mod directory;
pub mod refresh;
pub mod lifecycle;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{ProviderConfig, ProviderSource, ProtocolListener, TelemetryEndpoint};
pub use directory::{
    CidrRule, CidrRuleSet, DirectoryId, ProviderDirectory, ProviderMatch, ProviderRecord,
    ProviderSnapshot, RefreshSummary, SharedSecret,
};
pub use refresh::{RefreshEvent, RefreshScheduler};
pub use lifecycle::Lifecycle;
pub use config::{ApiConfig, ListenerConfig, OutpostConfig, RefreshConfig, TelemetryConfig};
pub use error::{Error, Result};
