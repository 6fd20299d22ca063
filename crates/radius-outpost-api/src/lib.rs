// # Outposts API Provider Source
//
// This crate provides the remote configuration source for the RADIUS outpost:
// it lists the RADIUS providers assigned to this outpost from the identity
// platform's API.
//
// ## Behaviour
//
// - Pages through the list endpoint until `pagination.next == 0`
// - Returns the complete list or an error, never a partial list
// - ❌ NO retry logic (owned by RefreshScheduler)
// - ❌ NO caching (the directory holds the active set)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Shared secrets in responses are NEVER logged
//
// ## API Reference
//
// - List RADIUS providers: GET `/api/v3/outposts/radius/?page=N`
//   Authorization: Bearer <outpost token>

use async_trait::async_trait;
use radius_outpost_core::config::ApiConfig;
use radius_outpost_core::traits::{ProviderConfig, ProviderSource};
use radius_outpost_core::{Error, Result};
use serde::Deserialize;

/// Path of the RADIUS provider list endpoint
const RADIUS_PROVIDERS_PATH: &str = "/api/v3/outposts/radius/";

/// Upper bound on pages fetched in one listing
const MAX_PAGES: u32 = 100;

/// One page of the provider list endpoint
#[derive(Debug, Deserialize)]
struct ProviderPage {
    pagination: Pagination,
    results: Vec<ProviderConfig>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    /// Next page number, 0 on the last page
    #[serde(default)]
    next: u32,
}

/// Provider source backed by the identity platform's outposts API
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct ApiProviderSource {
    /// Base URL without trailing slash
    base_url: String,

    /// Outpost API token
    /// ⚠️ NEVER log this value
    token: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ApiProviderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiProviderSource")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl ApiProviderSource {
    /// Create a new provider source
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the API configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        if config.insecure {
            tracing::warn!("TLS certificate verification disabled for the outposts API");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure)
            .user_agent(concat!("radius-outpost/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.host.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
        })
    }

    /// URL of one page of the provider list
    fn page_url(&self, page: u32) -> String {
        format!("{}{}?page={}", self.base_url, RADIUS_PROVIDERS_PATH, page)
    }

    /// Fetch a single page
    async fn fetch_page(&self, page: u32) -> Result<ProviderPage> {
        let response = self
            .client
            .get(self.page_url(page))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::config_source(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status.as_u16(), &error_text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::config_source(format!("Failed to read response: {}", e)))?;

        parse_page(&body)
    }
}

#[async_trait]
impl ProviderSource for ApiProviderSource {
    async fn list_providers(&self) -> Result<Vec<ProviderConfig>> {
        let mut providers = Vec::new();
        let mut page = 1;

        loop {
            let fetched = self.fetch_page(page).await?;
            tracing::debug!(
                page,
                count = fetched.results.len(),
                next = fetched.pagination.next,
                "Fetched provider page"
            );
            providers.extend(fetched.results);

            match next_page(page, fetched.pagination.next)? {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(providers)
    }

    fn source_name(&self) -> &'static str {
        "outposts-api"
    }
}

/// Decide which page to fetch after `current`
///
/// Rejects pagination that does not move forward or runs past [`MAX_PAGES`].
fn next_page(current: u32, next: u32) -> Result<Option<u32>> {
    if next == 0 {
        return Ok(None);
    }
    if next <= current {
        return Err(Error::config_source(format!(
            "Invalid pagination: page {} points back to page {}",
            current, next
        )));
    }
    if next > MAX_PAGES {
        return Err(Error::config_source(format!(
            "Provider list exceeds {} pages",
            MAX_PAGES
        )));
    }
    Ok(Some(next))
}

fn parse_page(body: &[u8]) -> Result<ProviderPage> {
    Ok(serde_json::from_slice(body)?)
}

/// Map a non-success HTTP status to an error
fn status_error(status: u16, error_text: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "Outpost token rejected or lacks permission. Status: {}",
            status
        )),
        429 => Error::config_source(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::config_source(format!(
            "Server error (transient): {} - {}",
            status, error_text
        )),
        _ => Error::config_source(format!(
            "Provider listing failed: {} - {}",
            status, error_text
        )),
    }
}
