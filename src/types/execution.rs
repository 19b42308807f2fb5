use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExecutionId, ResourceLimits};

/// Supplied by the caller on every execute call. Read-only to the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub user_id: String,
    pub workflow_id: Option<String>,
    pub execution_id: ExecutionId,
    pub environment: String,
    pub resources: ResourceLimits,
}

impl ExecutionContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            workflow_id: None,
            execution_id: ExecutionId::new_v4(),
            environment: "development".to_string(),
            resources: ResourceLimits::default(),
        }
    }

    pub fn with_workflow(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failure,
}

/// Per-run figures a behavior reports back to the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub network_requests: u64,
    pub errors: u64,
    pub bytes: u64,
    // The run returned but produced nothing usable
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub version: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub start_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub memory_used: u64,
    pub cpu_used: f64,
    pub network_requests: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult<T> {
    pub data: T,
    pub metadata: ExecutionMetadata,
    pub metrics: ExecutionMetrics,
    pub status: ExecutionStatus,
}

impl<T> ExecutionResult<T> {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}
