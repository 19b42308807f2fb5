pub mod collection;
pub mod collectors;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod storage;
pub mod types;

pub use collection::{CollectionAgent, CollectionPipeline, CollectionRequest, CollectorStrategy};
pub use config::Config;
pub use error::AgentError;
pub use lifecycle::{AgentBehavior, AgentEvent, LifecycleController};
pub use types::*;
