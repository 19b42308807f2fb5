use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry<T> {
    last_fetch_at: Instant,
    // None when the last fetch failed
    last_result: Option<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedFetch<T> {
    pub value: T,
    /// True when this call performed the fetch.
    pub fetched: bool,
}

/// Per-URL memo of the last fetch. Within `min_interval` of a fetch the
/// stored result is served instead of fetching again; a failed fetch also
/// starts the interval.
pub struct RateLimitedCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    network_fetches: u64,
}

impl<T: Clone> RateLimitedCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            network_fetches: 0,
        }
    }

    pub async fn get_or_fetch<F, Fut>(
        &mut self,
        url: &str,
        min_interval: Duration,
        fetch: F,
    ) -> Result<CachedFetch<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(url) {
            let elapsed = now.saturating_duration_since(entry.last_fetch_at);
            if elapsed < min_interval {
                return match &entry.last_result {
                    Some(value) => {
                        log::debug!("Serving cached result for {} ({:?} old)", url, elapsed);
                        Ok(CachedFetch {
                            value: value.clone(),
                            fetched: false,
                        })
                    }
                    None => Err(anyhow!(
                        "Rate limited: last fetch of {} failed {:?} ago",
                        url,
                        elapsed
                    )),
                };
            }
        }

        self.network_fetches += 1;
        let result = fetch().await;

        let last_result = result.as_ref().ok().cloned();
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                last_fetch_at: now,
                last_result,
            },
        );

        result.map(|value| CachedFetch {
            value,
            fetched: true,
        })
    }

    pub fn last_fetch_at(&self, url: &str) -> Option<Instant> {
        self.entries.get(url).map(|e| e.last_fetch_at)
    }

    pub fn network_fetches(&self) -> u64 {
        self.network_fetches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> Default for RateLimitedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
