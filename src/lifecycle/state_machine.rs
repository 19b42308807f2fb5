use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::types::AgentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Initialized,
    ExecutionStarted,
    ExecutionSucceeded,
    Failed,
    Paused,
    Resumed,
    CleanedUp,
}

pub struct AgentStateMachine;

impl AgentStateMachine {
    pub fn transition(from: AgentStatus, event: LifecycleEvent) -> Result<AgentStatus> {
        let next = match (from, event) {
            (AgentStatus::Inactive | AgentStatus::Error, LifecycleEvent::Initialized) => {
                AgentStatus::Active
            }
            (AgentStatus::Active, LifecycleEvent::ExecutionStarted) => AgentStatus::Running,
            (AgentStatus::Running, LifecycleEvent::ExecutionSucceeded) => AgentStatus::Active,

            (AgentStatus::Active, LifecycleEvent::Paused) => AgentStatus::Paused,
            (AgentStatus::Paused, LifecycleEvent::Resumed) => AgentStatus::Active,

            (
                AgentStatus::Inactive
                | AgentStatus::Active
                | AgentStatus::Paused
                | AgentStatus::Error,
                LifecycleEvent::CleanedUp,
            ) => AgentStatus::Inactive,

            (_, LifecycleEvent::Failed) => AgentStatus::Error,

            _ => return Err(AgentError::InvalidTransition { from, event }),
        };

        Ok(next)
    }

    /// Checks a transition without applying it.
    pub fn permits(from: AgentStatus, event: LifecycleEvent) -> bool {
        Self::transition(from, event).is_ok()
    }
}
