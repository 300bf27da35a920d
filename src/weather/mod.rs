// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Weather data client for the weather.com v3 API.
//!
//! Responses are cached for five minutes per URL. A failed request is retried
//! with a linear back-off and, when every attempt fails, the last cached
//! response is served even if it is stale.

pub mod lunar;
pub mod twc;

pub use twc::{LocationOrigin, TwcProvider};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rotation_core::UpstreamError;
use serde_json::Value;
use tokio::time::Instant;

/// How long a cached response is served without refetching.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Requests per fetch before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Back-off after the n-th failed attempt is n times this step.
pub const BACKOFF_STEP: Duration = Duration::from_secs(1);

/// Source of JSON documents by URL.
#[async_trait]
pub trait JsonSource: Send + Sync {
    /// Fetch `url`. An empty response body yields `Value::Null`.
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError>;
}

/// [`JsonSource`] backed by an HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonSource for HttpSource {
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

struct CacheEntry {
    body: Value,
    fetched: Instant,
}

/// Retrying, caching front for a [`JsonSource`].
pub struct CachedFetcher {
    source: Arc<dyn JsonSource>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl std::fmt::Debug for CachedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedFetcher")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CachedFetcher {
    pub fn new(source: Arc<dyn JsonSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            ttl: CACHE_TTL,
        }
    }

    /// Fetch through the cache, falling back to a stale entry on failure.
    pub async fn get(&self, url: &str) -> Result<Value, UpstreamError> {
        if let Some(body) = self.cached(url, true) {
            return Ok(body);
        }

        match self.get_uncached(url).await {
            Ok(body) => {
                self.store_in_cache(url, body.clone());
                Ok(body)
            }
            Err(e) => match self.cached(url, false) {
                Some(body) => {
                    warn!("Serving stale response for {}: {}", redact(url), e);
                    Ok(body)
                }
                None => Err(e),
            },
        }
    }

    /// Fetch with retries, bypassing the cache.
    pub async fn get_uncached(&self, url: &str) -> Result<Value, UpstreamError> {
        let mut attempt = 1;
        loop {
            match self.source.get_json(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt >= MAX_ATTEMPTS => return Err(e),
                Err(e) => {
                    debug!("Attempt {} for {} failed: {}", attempt, redact(url), e);
                    tokio::time::sleep(BACKOFF_STEP * attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Clear old cache entries
    pub fn cleanup_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, entry| entry.fetched.elapsed() < self.ttl);
        }
    }

    fn cached(&self, url: &str, fresh_only: bool) -> Option<Value> {
        let cache = self.cache.lock().ok()?;
        let entry = cache.get(url)?;
        if fresh_only && entry.fetched.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.body.clone())
    }

    fn store_in_cache(&self, url: &str, body: Value) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                url.to_string(),
                CacheEntry {
                    body,
                    fetched: Instant::now(),
                },
            );
        }
    }
}

/// Strip the query string so API keys never reach the log.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
