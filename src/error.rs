use thiserror::Error;

use crate::lifecycle::LifecycleEvent;
use crate::types::AgentStatus;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid configuration: {}", .0.join("; "))]
    ConfigValidation(Vec<String>),

    #[error("Configuration update rejected: {}", .0.join("; "))]
    ConfigUpdate(Vec<String>),

    // Hook failures surface the underlying message unchanged
    #[error(transparent)]
    Initialization(anyhow::Error),

    #[error(transparent)]
    Execution(anyhow::Error),

    #[error(transparent)]
    Cleanup(anyhow::Error),

    #[error("Invalid state transition from {from:?} with event {event:?}")]
    InvalidTransition {
        from: AgentStatus,
        event: LifecycleEvent,
    },

    #[error("Agent is {} and cannot execute", .0.as_str())]
    NotReady(AgentStatus),

    #[error("Failed to load config {path}: {reason}")]
    ConfigLoad { path: String, reason: String },
}

impl AgentError {
    /// Validation messages carried by config errors, empty otherwise.
    pub fn reasons(&self) -> &[String] {
        match self {
            AgentError::ConfigValidation(reasons) | AgentError::ConfigUpdate(reasons) => reasons,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
