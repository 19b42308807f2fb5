pub mod cache;
pub mod dedup;
pub mod pipeline;

pub use cache::{CachedFetch, RateLimitedCache};
pub use dedup::Deduplicator;
pub use pipeline::{
    CollectionAgent, CollectionOutput, CollectionPipeline, CollectionRequest, TargetFailure,
};

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::types::{CollectedData, DataSource, DataTarget, RawPayload};

/// How a collection agent talks to the outside world. The pipeline owns
/// ordering, rate limiting and deduplication; a strategy only fetches and
/// normalizes.
#[async_trait]
pub trait CollectorStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Minimum spacing between fetches of one URL unless the target overrides it.
    fn default_min_interval(&self) -> Duration;

    async fn collect(&self, target: &DataTarget) -> Result<RawPayload>;

    fn clean(&self, raw: RawPayload, target: &DataTarget) -> Result<Vec<CollectedData>>;

    async fn test_connection(&self, source: &DataSource) -> Result<bool>;
}
