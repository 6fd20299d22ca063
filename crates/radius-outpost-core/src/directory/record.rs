//! Provider records
//!
//! A [`ProviderRecord`] is the immutable, directory-side view of one provider.
//! Records are built fresh on every refresh and shared between request
//! handlers through `Arc`.

use super::cidr::{CidrRule, CidrRuleSet};
use super::DirectoryId;
use crate::traits::ProviderConfig;
use std::net::IpAddr;
use tracing::info_span;

/// RADIUS shared secret
///
/// The Debug implementation intentionally does NOT expose the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(Box<[u8]>);

impl SharedSecret {
    /// Create a shared secret from raw bytes
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// Raw secret bytes, for the protocol codec only
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<REDACTED>)")
    }
}

/// Immutable snapshot of one provider's authorization material
#[derive(Debug)]
pub struct ProviderRecord {
    name: String,
    shared_secret: SharedSecret,
    client_networks: CidrRuleSet,
    application_slug: String,
    flow_slug: String,
    directory: DirectoryId,
}

impl ProviderRecord {
    /// Build a record from a provider configuration
    ///
    /// CIDR diagnostics emitted while parsing carry the provider name and
    /// directory id through the `provider` span.
    pub fn from_config(config: &ProviderConfig, directory: DirectoryId) -> Self {
        let span = info_span!("provider", provider = %config.name, directory = %directory);
        let _enter = span.enter();

        Self {
            name: config.name.clone(),
            shared_secret: SharedSecret::new(config.shared_secret.as_bytes()),
            client_networks: CidrRuleSet::parse(&config.client_networks),
            application_slug: config.application_slug.clone(),
            flow_slug: config.auth_flow_slug.clone(),
            directory,
        }
    }

    /// Display name of the provider
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared secret for the protocol codec
    pub fn shared_secret(&self) -> &SharedSecret {
        &self.shared_secret
    }

    /// Authorized client networks, most specific first
    pub fn client_networks(&self) -> &CidrRuleSet {
        &self.client_networks
    }

    /// Application routing slug
    pub fn application_slug(&self) -> &str {
        &self.application_slug
    }

    /// Authentication flow routing slug
    pub fn flow_slug(&self) -> &str {
        &self.flow_slug
    }

    /// Directory this record was published into
    pub fn directory_id(&self) -> DirectoryId {
        self.directory
    }

    /// Most specific rule authorizing the address, if any
    pub fn matches(&self, addr: IpAddr) -> Option<&CidrRule> {
        self.client_networks.matching_rule(addr)
    }
}
