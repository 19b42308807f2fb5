pub mod controller;
pub mod events;
pub mod metrics;
pub mod state_machine;
pub mod validation;

pub use controller::{AgentBehavior, LifecycleController};
pub use events::{AgentEvent, EventChannel, EventKind, EventSubscription};
pub use metrics::{AgentMetrics, MetricsTracker};
pub use state_machine::{AgentStateMachine, LifecycleEvent};
pub use validation::{ConfigValidator, ValidationOutcome};
