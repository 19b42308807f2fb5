use async_trait::async_trait;
use chrono::Utc;
use std::time::Instant;
use tokio::sync::watch;

use super::events::{AgentEvent, EventChannel, EventSubscription};
use super::metrics::{AgentMetrics, MetricsTracker};
use super::state_machine::{AgentStateMachine, LifecycleEvent};
use super::validation::{ConfigValidator, ValidationOutcome};
use crate::error::{AgentError, Result};
use crate::types::{
    AgentConfig, AgentStatus, ConfigPatch, ExecutionContext, ExecutionMetadata,
    ExecutionMetrics, ExecutionResult, ExecutionStatus, RunCounters,
};

/// Agent-type specific hooks driven by [`LifecycleController`].
#[async_trait]
pub trait AgentBehavior: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    fn agent_type(&self) -> &str;

    fn output_format(&self) -> &str {
        "json"
    }

    /// Extra validation rules for this agent type, as messages.
    fn validate_config(&self, _config: &AgentConfig) -> Vec<String> {
        Vec::new()
    }

    async fn initialize(&mut self, config: &AgentConfig) -> anyhow::Result<()>;

    async fn execute(
        &mut self,
        input: &Self::Input,
        context: &ExecutionContext,
    ) -> anyhow::Result<Self::Output>;

    async fn post_execute(
        &mut self,
        output: Self::Output,
        _input: &Self::Input,
    ) -> anyhow::Result<Self::Output> {
        Ok(output)
    }

    fn run_counters(&self, _output: &Self::Output) -> RunCounters {
        RunCounters::default()
    }

    /// Called after a config update has been validated and applied.
    fn on_config_updated(&mut self, _config: &AgentConfig) {}

    async fn cleanup(&mut self) -> anyhow::Result<()>;

    async fn health_check(&self) -> anyhow::Result<bool>;
}

/// Drives an [`AgentBehavior`] through initialize, execute and cleanup,
/// keeping its status, metrics and last error.
pub struct LifecycleController<B: AgentBehavior> {
    config: AgentConfig,
    status: watch::Sender<AgentStatus>,
    metrics: MetricsTracker,
    events: EventChannel,
    last_error: Option<String>,
    behavior: B,
}

impl<B: AgentBehavior> LifecycleController<B> {
    pub fn new(config: AgentConfig, behavior: B) -> Self {
        Self::with_events(config, behavior, EventChannel::default())
    }

    pub fn with_events(config: AgentConfig, behavior: B, events: EventChannel) -> Self {
        let (status, _) = watch::channel(AgentStatus::Inactive);
        Self {
            config,
            status,
            metrics: MetricsTracker::new(),
            events,
            last_error: None,
            behavior,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn status(&self) -> AgentStatus {
        *self.status.borrow()
    }

    /// Lets observers follow status changes while an execution is suspended.
    pub fn watch_status(&self) -> watch::Receiver<AgentStatus> {
        self.status.subscribe()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn metrics(&self) -> AgentMetrics {
        self.metrics.snapshot()
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    pub fn validate_config(&self, config: &AgentConfig) -> ValidationOutcome {
        ConfigValidator::validate(config, self.behavior.validate_config(config))
    }

    pub async fn initialize(&mut self, config: AgentConfig) -> Result<()> {
        let from = self.status();
        if !AgentStateMachine::permits(from, LifecycleEvent::Initialized) {
            return Err(AgentError::InvalidTransition {
                from,
                event: LifecycleEvent::Initialized,
            });
        }

        let outcome = self.validate_config(&config);
        if !outcome.success {
            log::warn!(
                "Agent {} rejected config: {}",
                config.id,
                outcome.errors().join("; ")
            );
            return Err(AgentError::ConfigValidation(outcome.into_errors()));
        }

        if let Err(e) = self.behavior.initialize(&config).await {
            log::error!("Agent {} failed to initialize: {:#}", config.id, e);
            self.fail(&e);
            return Err(AgentError::Initialization(e));
        }

        self.config = config;
        self.transition(LifecycleEvent::Initialized)?;
        log::info!(
            "Agent {} ({}) initialized",
            self.config.id,
            self.behavior.agent_type()
        );

        self.events.publish(AgentEvent::Initialized {
            agent_id: self.config.id.clone(),
            config: self.config.clone(),
        });
        Ok(())
    }

    pub async fn execute(
        &mut self,
        input: &B::Input,
        context: &ExecutionContext,
    ) -> Result<ExecutionResult<B::Output>> {
        let status = self.status();
        if status != AgentStatus::Active {
            return Err(AgentError::NotReady(status));
        }

        // Status flips before the first await
        self.transition(LifecycleEvent::ExecutionStarted)?;
        self.events.publish(AgentEvent::ExecutionStarted {
            agent_id: self.config.id.clone(),
            execution_id: context.execution_id,
        });

        let start_time = Utc::now();
        let started = Instant::now();

        let outcome = match self.behavior.execute(input, context).await {
            Ok(output) => self.behavior.post_execute(output, input).await,
            Err(e) => Err(e),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                log::error!(
                    "Agent {} execution {} failed: {:#}",
                    self.config.id,
                    context.execution_id,
                    e
                );
                self.metrics.record_failure(duration_ms);
                self.fail(&e);
                return Err(AgentError::Execution(e));
            }
        };

        self.metrics.record_success(duration_ms);
        self.transition(LifecycleEvent::ExecutionSucceeded)?;

        let counters = self.behavior.run_counters(&output);
        let result = ExecutionResult {
            data: output,
            metadata: ExecutionMetadata {
                generated_at: Utc::now(),
                processing_time_ms: duration_ms,
                version: self.config.version.clone(),
                format: self.behavior.output_format().to_string(),
            },
            metrics: ExecutionMetrics {
                start_time,
                duration_ms,
                memory_used: counters.bytes,
                cpu_used: self.config.resources.cpu,
                network_requests: counters.network_requests,
                errors: counters.errors,
            },
            status: if counters.degraded {
                ExecutionStatus::Failure
            } else {
                ExecutionStatus::Success
            },
        };

        log::debug!(
            "Agent {} execution {} completed in {}ms",
            self.config.id,
            context.execution_id,
            duration_ms
        );
        self.events.publish(AgentEvent::ExecutionCompleted {
            agent_id: self.config.id.clone(),
            execution_id: context.execution_id,
            duration_ms,
        });

        Ok(result)
    }

    pub fn update_config(&mut self, patch: &ConfigPatch) -> Result<()> {
        let merged = patch.apply(&self.config);

        let outcome = self.validate_config(&merged);
        if !outcome.success {
            return Err(AgentError::ConfigUpdate(outcome.into_errors()));
        }

        self.config = merged;
        self.behavior.on_config_updated(&self.config);

        self.events.publish(AgentEvent::ConfigUpdated {
            agent_id: self.config.id.clone(),
            config: self.config.clone(),
        });
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.transition(LifecycleEvent::Paused)?;
        self.events.publish(AgentEvent::Paused {
            agent_id: self.config.id.clone(),
        });
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.transition(LifecycleEvent::Resumed)?;
        self.events.publish(AgentEvent::Resumed {
            agent_id: self.config.id.clone(),
        });
        Ok(())
    }

    /// A failing cleanup leaves the agent in `Error`.
    pub async fn cleanup(&mut self) -> Result<()> {
        let from = self.status();
        if !AgentStateMachine::permits(from, LifecycleEvent::CleanedUp) {
            return Err(AgentError::InvalidTransition {
                from,
                event: LifecycleEvent::CleanedUp,
            });
        }

        if let Err(e) = self.behavior.cleanup().await {
            log::error!("Agent {} cleanup failed: {:#}", self.config.id, e);
            self.fail(&e);
            return Err(AgentError::Cleanup(e));
        }

        self.transition(LifecycleEvent::CleanedUp)?;
        log::info!("Agent {} cleaned up", self.config.id);

        self.events.publish(AgentEvent::Cleanup {
            agent_id: self.config.id.clone(),
        });
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        match self.behavior.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                log::warn!("Agent {} health check errored: {:#}", self.config.id, e);
                false
            }
        }
    }

    fn transition(&mut self, event: LifecycleEvent) -> Result<AgentStatus> {
        let next = AgentStateMachine::transition(self.status(), event)?;
        self.status.send_replace(next);
        Ok(next)
    }

    fn fail(&mut self, error: &anyhow::Error) {
        self.last_error = Some(error.to_string());
        if let Err(e) = self.transition(LifecycleEvent::Failed) {
            log::error!("Agent {} could not record failure: {}", self.config.id, e);
        }
    }
}
