//! In-process HTTP cache with conditional revalidation.
//!
//! Index payloads change rarely, so every response is kept together with its
//! `ETag`/`Last-Modified` validators and revalidated with a conditional GET
//! on the next request. A `304 Not Modified` answer is served from memory;
//! a network failure during revalidation falls back to the cached body
//! rather than surfacing an error.

use crate::error::{DepotError, Result};
use dashmap::DashMap;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on cached responses before the oldest are pruned.
const MAX_ENTRIES: usize = 1024;

/// Request timeout applied to every index call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CachedEntry {
    body: Arc<Vec<u8>>,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: Instant,
}

/// Shared HTTP cache for upstream index traffic.
///
/// Bodies are stored as `Arc<Vec<u8>>`, so repeated lookups of the same URL
/// hand out clones of one buffer instead of copying it.
///
/// # Examples
///
/// ```no_run
/// # use depot_core::HttpCache;
/// # async fn example() -> depot_core::Result<()> {
/// let cache = HttpCache::new();
/// let body = cache.get("https://pypi.org/pypi/requests/json").await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
pub struct HttpCache {
    entries: DashMap<String, CachedEntry>,
    client: Client,
}

impl HttpCache {
    /// Creates a cache with the default client (30s timeout, depot agent).
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("depot/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            entries: DashMap::new(),
            client,
        }
    }

    /// Fetches a URL, revalidating any cached copy with a conditional GET.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::Upstream`] when the request fails with no
    /// cached fallback available, and [`DepotError::UpstreamStatus`] for a
    /// non-success status code.
    pub async fn get(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        if self.entries.len() >= MAX_ENTRIES {
            self.prune_oldest();
        }

        let validators = self.entries.get(url).map(|e| (e.etag.clone(), e.last_modified.clone()));

        let mut request = self.client.get(url);
        if let Some((etag, last_modified)) = &validators {
            if let Some(etag) = etag {
                request = request.header(header::IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = last_modified {
                request = request.header(header::IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // Serve stale data over failing the caller outright.
                if let Some(entry) = self.entries.get(url) {
                    tracing::warn!("revalidation failed for {url}, serving cached copy: {e}");
                    return Ok(Arc::clone(&entry.body));
                }
                return Err(DepotError::upstream(url, e));
            }
        };

        if response.status() == StatusCode::NOT_MODIFIED {
            if let Some(entry) = self.entries.get(url) {
                tracing::debug!("not modified: {url}");
                return Ok(Arc::clone(&entry.body));
            }
            // 304 without a cached body should not happen; refetch plainly.
            return self.fetch_fresh(url).await;
        }

        if !response.status().is_success() {
            return Err(DepotError::UpstreamStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        self.store_response(url, response).await
    }

    /// Unconditional fetch, bypassing any stored validators.
    async fn fetch_fresh(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        tracing::debug!("fetching fresh: {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DepotError::upstream(url, e))?;

        if !response.status().is_success() {
            return Err(DepotError::UpstreamStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        self.store_response(url, response).await
    }

    async fn store_response(&self, url: &str, response: reqwest::Response) -> Result<Arc<Vec<u8>>> {
        let header_string = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let etag = header_string(header::ETAG);
        let last_modified = header_string(header::LAST_MODIFIED);

        let body = response
            .bytes()
            .await
            .map_err(|e| DepotError::upstream(url, e))?;
        let body = Arc::new(body.to_vec());

        self.entries.insert(
            url.to_string(),
            CachedEntry {
                body: Arc::clone(&body),
                etag,
                last_modified,
                fetched_at: Instant::now(),
            },
        );

        Ok(body)
    }

    /// Drops every cached response.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached responses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the oldest tenth of the entries once the cap is reached.
    fn prune_oldest(&self) {
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().fetched_at))
            .collect();
        by_age.sort_by_key(|(_, fetched_at)| *fetched_at);

        let evicted = by_age.len() / 10;
        for (url, _) in by_age.into_iter().take(evicted.max(1)) {
            self.entries.remove(&url);
        }
        tracing::debug!("pruned {evicted} cache entries");
    }
}

impl Default for HttpCache {
    fn default() -> Self {
        Self::new()
    }
}
