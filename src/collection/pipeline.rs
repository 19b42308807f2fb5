use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::cache::RateLimitedCache;
use super::dedup::Deduplicator;
use super::CollectorStrategy;
use crate::error::AgentError;
use crate::lifecycle::{AgentBehavior, AgentEvent, LifecycleController};
use crate::storage::DataStore;
use crate::types::{
    AgentConfig, AgentStatus, CollectedData, CollectionSummary, DataSource, DataTarget,
    ExecutionContext, ExecutionId, RawPayload, RunCounters,
};

pub type CollectionAgent<S> = LifecycleController<CollectionPipeline<S>>;

/// Input of one collection run. With no explicit targets the run falls back
/// to targets registered through `set_target`, then to every configured
/// data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionRequest {
    #[serde(default)]
    pub targets: Vec<DataTarget>,
}

impl CollectionRequest {
    pub fn for_targets(targets: Vec<DataTarget>) -> Self {
        Self { targets }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetFailure {
    pub source_id: String,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionOutput {
    pub items: Vec<CollectedData>,
    pub failures: Vec<TargetFailure>,
    pub summary: CollectionSummary,

    #[serde(skip)]
    candidates: usize,
    #[serde(skip)]
    duplicates: usize,
    #[serde(skip)]
    targets: usize,
    #[serde(skip)]
    network_requests: u64,
    #[serde(skip)]
    elapsed_ms: u64,
}

/// The collection agent behavior: walks targets one at a time, fetching
/// through a per-URL rate limit, cleaning, and dropping repeats within the run.
pub struct CollectionPipeline<S: CollectorStrategy> {
    strategy: S,
    cache: RateLimitedCache<RawPayload>,
    store: Option<Arc<dyn DataStore>>,
    sources: Vec<DataSource>,
    runtime_targets: Vec<DataTarget>,
    collecting: bool,
}

impl<S: CollectorStrategy> CollectionPipeline<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            cache: RateLimitedCache::new(),
            store: None,
            sources: Vec::new(),
            runtime_targets: Vec::new(),
            collecting: false,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    pub fn runtime_targets(&self) -> &[DataTarget] {
        &self.runtime_targets
    }

    pub fn cached_urls(&self) -> usize {
        self.cache.len()
    }

    fn resolve_targets(&self, request: &CollectionRequest) -> Vec<DataTarget> {
        if !request.targets.is_empty() {
            return request.targets.clone();
        }
        if !self.runtime_targets.is_empty() {
            return self.runtime_targets.clone();
        }

        self.sources
            .iter()
            .filter_map(|source| match DataTarget::from_source(source) {
                Ok(target) => Some(target),
                Err(e) => {
                    log::warn!("Skipping data source {}: {}", source.id, e);
                    None
                }
            })
            .collect()
    }

    async fn collect_target(&mut self, target: &DataTarget) -> Result<Vec<CollectedData>> {
        let min_interval = target.min_interval(self.strategy.default_min_interval());
        let strategy = &self.strategy;

        let fetched = self
            .cache
            .get_or_fetch(&target.url, min_interval, || strategy.collect(target))
            .await?;

        fetched.value.validate_for(target)?;
        strategy.clean(fetched.value, target)
    }
}

#[async_trait]
impl<S: CollectorStrategy> AgentBehavior for CollectionPipeline<S> {
    type Input = CollectionRequest;
    type Output = CollectionOutput;

    fn agent_type(&self) -> &str {
        "collection"
    }

    fn validate_config(&self, config: &AgentConfig) -> Vec<String> {
        let mut errors = Vec::new();

        if config.data_sources.is_empty() {
            errors.push("At least one data source is required".to_string());
        }

        for source in &config.data_sources {
            if url::Url::parse(&source.url).is_err() {
                errors.push(format!(
                    "Invalid URL for data source {}: {}",
                    source.id, source.url
                ));
            }
            if source.kind().is_none() {
                errors.push(format!(
                    "Unsupported data source type for {}: {}",
                    source.id, source.source_type
                ));
            }
        }

        errors
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<()> {
        self.sources = config.data_sources.clone();
        self.runtime_targets.clear();
        self.collecting = false;

        log::debug!(
            "Collection pipeline using {} with {} sources",
            self.strategy.name(),
            self.sources.len()
        );
        Ok(())
    }

    async fn execute(
        &mut self,
        request: &CollectionRequest,
        context: &ExecutionContext,
    ) -> Result<CollectionOutput> {
        let started = Instant::now();
        let targets = self.resolve_targets(request);
        let fetches_before = self.cache.network_fetches();

        log::info!(
            "Execution {} collecting from {} targets",
            context.execution_id,
            targets.len()
        );

        let mut dedup = Deduplicator::new();
        let mut output = CollectionOutput {
            targets: targets.len(),
            ..Default::default()
        };

        // One target at a time, in order
        for target in &targets {
            match self.collect_target(target).await {
                Ok(items) => {
                    output.candidates += items.len();
                    output.items.extend(dedup.filter(items));
                }
                Err(e) => {
                    log::warn!("Collection from {} failed: {:#}", target.url, e);
                    output.failures.push(TargetFailure {
                        source_id: target.source_id.clone(),
                        url: target.url.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        output.duplicates = dedup.duplicates();
        output.network_requests = self.cache.network_fetches() - fetches_before;

        if let Some(store) = &self.store {
            if !output.items.is_empty() {
                store
                    .save_batch(&output.items)
                    .await
                    .context("Failed to persist collected data")?;
            }
        }

        output.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(output)
    }

    async fn post_execute(
        &mut self,
        mut output: CollectionOutput,
        _request: &CollectionRequest,
    ) -> Result<CollectionOutput> {
        let mut seen = HashSet::new();
        let sources = output
            .items
            .iter()
            .filter(|item| seen.insert(item.source_id.as_str()))
            .map(|item| item.source_id.clone())
            .collect();

        output.summary = CollectionSummary {
            total_items: output.candidates,
            new_items: output.items.len(),
            duplicate_items: output.duplicates,
            error_items: output.failures.len(),
            total_size: output.items.iter().map(|item| item.content.len()).sum(),
            processing_time_ms: output.elapsed_ms,
            sources,
        };

        Ok(output)
    }

    fn run_counters(&self, output: &CollectionOutput) -> RunCounters {
        RunCounters {
            network_requests: output.network_requests,
            errors: output.failures.len() as u64,
            bytes: output.summary.total_size as u64,
            degraded: output.targets > 0 && output.failures.len() == output.targets,
        }
    }

    fn on_config_updated(&mut self, config: &AgentConfig) {
        self.sources = config.data_sources.clone();
    }

    async fn cleanup(&mut self) -> Result<()> {
        self.cache.clear();
        self.runtime_targets.clear();
        self.collecting = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        for source in &self.sources {
            match self.strategy.test_connection(source).await {
                Ok(true) => {}
                Ok(false) => {
                    log::warn!("Data source {} is unreachable", source.id);
                    return Ok(false);
                }
                Err(e) => {
                    log::warn!("Connection test for {} failed: {:#}", source.id, e);
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

impl<S: CollectorStrategy> LifecycleController<CollectionPipeline<S>> {
    /// Registers a runtime target, replacing one with the same URL.
    pub fn set_target(&mut self, target: DataTarget) {
        let targets = &mut self.behavior_mut().runtime_targets;
        targets.retain(|t| t.url != target.url);
        targets.push(target.clone());

        self.events().publish(AgentEvent::TargetSet {
            agent_id: self.id().to_string(),
            target,
        });
    }

    pub fn clear_targets(&mut self) {
        self.behavior_mut().runtime_targets.clear();
    }

    pub fn start_collection(&mut self) -> crate::error::Result<()> {
        let status = self.status();
        if status != AgentStatus::Active {
            return Err(AgentError::NotReady(status));
        }
        if self.behavior().collecting {
            return Ok(());
        }

        let sources: Vec<String> = self
            .behavior()
            .resolve_targets(&CollectionRequest::default())
            .into_iter()
            .map(|t| t.source_id)
            .collect();

        self.behavior_mut().collecting = true;
        log::info!("Agent {} started collecting from {:?}", self.id(), sources);

        self.events().publish(AgentEvent::CollectionStarted {
            agent_id: self.id().to_string(),
            sources,
        });
        Ok(())
    }

    pub fn stop_collection(&mut self) {
        if !self.behavior().collecting {
            return;
        }
        self.behavior_mut().collecting = false;
        log::info!("Agent {} stopped collecting", self.id());

        self.events().publish(AgentEvent::CollectionStopped {
            agent_id: self.id().to_string(),
        });
    }

    /// Runs a collection every `interval` until `shutdown` turns true or its
    /// sender is dropped. A failed run ends the loop and is returned once
    /// collection has been stopped. Returns the number of completed runs.
    pub async fn run_until_stopped(
        &mut self,
        interval: Duration,
        template: &ExecutionContext,
        mut shutdown: watch::Receiver<bool>,
    ) -> crate::error::Result<u64> {
        self.start_collection()?;

        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut runs = 0;
        let mut failure = None;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let context = ExecutionContext {
                        execution_id: ExecutionId::new_v4(),
                        ..template.clone()
                    };
                    match self.execute(&CollectionRequest::default(), &context).await {
                        Ok(result) => {
                            runs += 1;
                            let summary = &result.data.summary;
                            log::info!(
                                "Run {} collected {} new items ({} duplicates, {} errors)",
                                runs,
                                summary.new_items,
                                summary.duplicate_items,
                                summary.error_items
                            );
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.stop_collection();
        match failure {
            Some(e) => Err(e),
            None => Ok(runs),
        }
    }
}
