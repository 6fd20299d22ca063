//! Provider directory
//!
//! The ProviderDirectory is responsible for:
//! - Holding the active set of provider records
//! - Replacing that set wholesale from a [`ProviderSource`]
//! - Resolving a client address to the provider authorized for it
//!
//! ## Hot-swap
//!
//! ```text
//!   refresh()                                   lookup(addr)
//!      │                                             │
//!      ▼                                             ▼
//! ┌──────────────┐  build all   ┌─────────┐  load ┌──────────────────────────┐
//! │ ProviderSource│────────────▶│ new Vec │──────▶│ ArcSwap<Vec<Arc<Record>>>│
//! └──────────────┘   records    └─────────┘ store └──────────────────────────┘
//! ```
//!
//! The new set is built completely before a single `store`. Readers `load`
//! the pointer without locking and see either the old or the new set, never
//! a mix. A failed or empty fetch publishes nothing.
//!
//! ## Lookup order
//!
//! Providers are evaluated in the order the source returned them. Within a
//! provider, rules are evaluated most specific first. The first containing
//! rule wins.

pub mod cidr;
pub mod record;

pub use cidr::{CidrRule, CidrRuleSet};
pub use record::{ProviderRecord, SharedSecret};

use crate::error::{Error, Result};
use crate::traits::{ProviderConfig, ProviderSource};
use arc_swap::ArcSwap;
use ipnet::IpNet;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

static NEXT_DIRECTORY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique directory identifier
///
/// Records carry this instead of a reference to their directory, so a
/// superseded record set never keeps the directory alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectoryId(u64);

impl DirectoryId {
    /// Allocate a fresh identifier
    pub fn next() -> Self {
        Self(NEXT_DIRECTORY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "directory-{}", self.0)
    }
}

/// An immutable view of the active provider set
pub type ProviderSnapshot = Arc<Vec<Arc<ProviderRecord>>>;

/// Result of a successful lookup
#[derive(Debug, Clone)]
pub struct ProviderMatch {
    /// The authorized provider
    pub provider: Arc<ProviderRecord>,
    /// The network that matched
    pub network: IpNet,
    /// Position of the matching segment in the provider's raw network list
    pub source_index: usize,
}

/// Outcome of a successful refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Number of providers published
    pub providers: usize,
    /// Number of rules across all providers, holes included
    pub rules: usize,
    /// Number of segments that failed to parse
    pub holes: usize,
    /// When the set was published
    pub refreshed_at: chrono::DateTime<chrono::Utc>,
}

/// Holder of the active provider set
///
/// ## Threading
///
/// `lookup` and `snapshot` are lock-free and may run from any number of
/// tasks while a refresh is in flight. Concurrent refreshes are permitted;
/// the last one to publish wins.
pub struct ProviderDirectory {
    id: DirectoryId,
    providers: ArcSwap<Vec<Arc<ProviderRecord>>>,
}

impl ProviderDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            id: DirectoryId::next(),
            providers: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// This directory's identifier
    pub fn id(&self) -> DirectoryId {
        self.id
    }

    /// The active provider set
    ///
    /// The returned snapshot stays valid and unchanged even if a refresh
    /// publishes a new set afterwards.
    pub fn snapshot(&self) -> ProviderSnapshot {
        self.providers.load_full()
    }

    /// Number of active providers
    pub fn len(&self) -> usize {
        self.providers.load().len()
    }

    /// Whether no provider is active
    pub fn is_empty(&self) -> bool {
        self.providers.load().is_empty()
    }

    /// Resolve a client address to its provider
    ///
    /// Returns `None` when no provider authorizes the address. The caller
    /// must reject the request without revealing which providers exist.
    pub fn lookup(&self, addr: IpAddr) -> Option<ProviderMatch> {
        let providers = self.providers.load();

        providers.iter().find_map(|provider| {
            provider.matches(addr).and_then(|rule| {
                rule.network().map(|network| ProviderMatch {
                    provider: Arc::clone(provider),
                    network,
                    source_index: rule.source_index(),
                })
            })
        })
    }

    /// Replace the active set from the given source
    ///
    /// # Returns
    ///
    /// - `Ok(RefreshSummary)`: The new set was published
    /// - `Err(Error)`: The fetch failed or returned no provider; the active
    ///   set is unchanged
    pub async fn refresh(&self, source: &dyn ProviderSource) -> Result<RefreshSummary> {
        let configs = source.list_providers().await.inspect_err(|e| {
            warn!(source = source.source_name(), error = %e, "Failed to fetch providers");
        })?;

        self.apply(configs)
    }

    /// Refresh, giving up after `timeout`
    ///
    /// A timeout behaves like a failed fetch: nothing is published.
    pub async fn refresh_with_timeout(
        &self,
        source: &dyn ProviderSource,
        timeout: Duration,
    ) -> Result<RefreshSummary> {
        match tokio::time::timeout(timeout, self.refresh(source)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(source = source.source_name(), ?timeout, "Provider refresh timed out");
                Err(Error::Timeout(timeout))
            }
        }
    }

    /// Refresh, giving up as soon as `cancel` completes
    ///
    /// Cancellation behaves like a failed fetch: nothing is published.
    pub async fn refresh_until<F>(
        &self,
        source: &dyn ProviderSource,
        cancel: F,
    ) -> Result<RefreshSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.refresh(source) => result,
            _ = cancel => {
                debug!(source = source.source_name(), "Provider refresh cancelled");
                Err(Error::Cancelled)
            }
        }
    }

    /// Build records from `configs` and publish them as the active set
    ///
    /// An empty list is rejected with [`Error::NoProviders`] and publishes
    /// nothing.
    pub fn apply(&self, configs: Vec<ProviderConfig>) -> Result<RefreshSummary> {
        if configs.is_empty() {
            warn!("No provider configured, keeping current providers");
            return Err(Error::NoProviders);
        }

        let records: Vec<Arc<ProviderRecord>> = configs
            .iter()
            .map(|config| Arc::new(ProviderRecord::from_config(config, self.id)))
            .collect();

        let summary = RefreshSummary {
            providers: records.len(),
            rules: records.iter().map(|r| r.client_networks().len()).sum(),
            holes: records.iter().map(|r| r.client_networks().hole_count()).sum(),
            refreshed_at: chrono::Utc::now(),
        };

        self.providers.store(Arc::new(records));

        info!(
            directory = %self.id,
            providers = summary.providers,
            rules = summary.rules,
            invalid_rules = summary.holes,
            "Updated providers"
        );

        Ok(summary)
    }
}

impl Default for ProviderDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDirectory")
            .field("id", &self.id)
            .field("providers", &self.len())
            .finish()
    }
}
