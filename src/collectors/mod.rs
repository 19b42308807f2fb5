pub mod clean;
pub mod feed;
pub mod html;
pub mod http;

pub use clean::clean_payload;
pub use http::HttpCollector;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::collection::CollectorStrategy;
use crate::types::{CollectedData, DataSource, DataTarget, RawPayload};

/// Serves canned payloads by URL and counts fetches. Used for dry runs and
/// in tests.
pub struct StaticCollector {
    responses: HashMap<String, std::result::Result<RawPayload, String>>,
    fetches: Mutex<HashMap<String, usize>>,
    min_interval: Duration,
}

impl Default for StaticCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticCollector {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fetches: Mutex::new(HashMap::new()),
            min_interval: Duration::ZERO,
        }
    }

    pub fn with_payload(mut self, url: impl Into<String>, payload: RawPayload) -> Self {
        self.responses.insert(url.into(), Ok(payload));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, error: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Err(error.into()));
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .map(|fetches| fetches.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl CollectorStrategy for StaticCollector {
    fn name(&self) -> &str {
        "static"
    }

    fn default_min_interval(&self) -> Duration {
        self.min_interval
    }

    async fn collect(&self, target: &DataTarget) -> Result<RawPayload> {
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(target.url.clone()).or_insert(0) += 1;
        }

        match self.responses.get(&target.url) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(error)) => Err(anyhow!("{}", error)),
            None => Err(anyhow!("No response configured for {}", target.url)),
        }
    }

    fn clean(&self, raw: RawPayload, target: &DataTarget) -> Result<Vec<CollectedData>> {
        Ok(clean_payload(raw, target))
    }

    async fn test_connection(&self, source: &DataSource) -> Result<bool> {
        Ok(matches!(self.responses.get(&source.url), Some(Ok(_))))
    }
}
