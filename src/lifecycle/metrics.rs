use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub average_execution_time_ms: f64,
    pub last_execution_time_ms: Option<u64>,
    pub error_rate: f64,
}

/// Owns an agent's [`AgentMetrics`]. Only the lifecycle controller records
/// into it; everyone else gets copies.
#[derive(Debug, Default)]
pub struct MetricsTracker {
    metrics: AgentMetrics,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running average covers successful executions only.
    pub fn record_success(&mut self, duration_ms: u64) {
        let m = &mut self.metrics;
        m.total_executions += 1;
        m.successful_executions += 1;

        let n = m.successful_executions as f64;
        m.average_execution_time_ms += (duration_ms as f64 - m.average_execution_time_ms) / n;
        m.last_execution_time_ms = Some(duration_ms);

        self.refresh_error_rate();
    }

    pub fn record_failure(&mut self, duration_ms: u64) {
        let m = &mut self.metrics;
        m.total_executions += 1;
        m.failed_executions += 1;
        m.last_execution_time_ms = Some(duration_ms);

        self.refresh_error_rate();
    }

    pub fn snapshot(&self) -> AgentMetrics {
        self.metrics.clone()
    }

    fn refresh_error_rate(&mut self) {
        let m = &mut self.metrics;
        m.error_rate = if m.total_executions == 0 {
            0.0
        } else {
            m.failed_executions as f64 / m.total_executions as f64
        };
    }
}
