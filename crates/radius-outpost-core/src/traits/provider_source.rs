// # Provider Source Trait
//
// Defines the interface to the remote configuration source that supplies the
// outpost's RADIUS providers.
//
// ## Implementations
//
// - Identity platform outposts API: `radius-outpost-api` crate
//
// ## Usage
//
// ```rust,ignore
// use radius_outpost_core::ProviderSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* ProviderSource implementation */;
//
//     for provider in source.list_providers().await? {
//         println!("{} -> {}", provider.name, provider.client_networks);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One provider as described by the remote configuration source
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the shared secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name of the provider
    pub name: String,

    /// RADIUS shared secret
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub shared_secret: String,

    /// Comma-separated list of client networks in CIDR notation
    #[serde(default)]
    pub client_networks: String,

    /// Slug of the application bound to the provider
    #[serde(default)]
    pub application_slug: String,

    /// Slug of the authentication flow
    #[serde(default)]
    pub auth_flow_slug: String,
}

impl ProviderConfig {
    /// Create a provider configuration with empty routing slugs
    pub fn new(
        name: impl Into<String>,
        shared_secret: impl Into<String>,
        client_networks: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            shared_secret: shared_secret.into(),
            client_networks: client_networks.into(),
            application_slug: String::new(),
            auth_flow_slug: String::new(),
        }
    }

    /// Set the routing slugs
    pub fn with_slugs(
        mut self,
        application_slug: impl Into<String>,
        auth_flow_slug: impl Into<String>,
    ) -> Self {
        self.application_slug = application_slug.into();
        self.auth_flow_slug = auth_flow_slug.into();
        self
    }
}

// Custom Debug implementation that hides the shared secret
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("shared_secret", &"<REDACTED>")
            .field("client_networks", &self.client_networks)
            .field("application_slug", &self.application_slug)
            .field("auth_flow_slug", &self.auth_flow_slug)
            .finish()
    }
}

/// Trait for remote configuration sources
///
/// A source answers one question: which providers are configured right now.
/// It always returns the complete set; the directory never applies partial
/// updates.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Rules
/// - Return the full provider list or an error, never a partial list
/// - Do not retry; the refresh scheduler owns cadence
/// - Do not cache between calls
/// - Never log shared secrets
#[async_trait]
pub trait ProviderSource: Send + Sync {
    /// List all providers currently configured for this outpost
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ProviderConfig>)`: Every configured provider (possibly empty)
    /// - `Err(Error)`: Transport or API failure
    async fn list_providers(&self) -> Result<Vec<ProviderConfig>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
