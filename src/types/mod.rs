pub mod config;
pub mod data;
pub mod execution;

pub use config::{AgentConfig, ConfigPatch, DataSource, ResourceLimits};
pub use data::{
    CollectedData, CollectionSummary, DataTarget, HtmlPage, MediaItem, RawPayload, RssItem,
};
pub use execution::{
    ExecutionContext, ExecutionMetadata, ExecutionMetrics, ExecutionResult, ExecutionStatus,
    RunCounters,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AgentId = String;
pub type ExecutionId = Uuid;
pub type ItemId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Inactive, // Constructed or torn down
    Active,   // Initialized, ready to execute
    Running,  // Inside an execution
    Paused,   // Initialized but not accepting executions
    Error,    // Last hook failed
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Inactive => "inactive",
            AgentStatus::Active => "active",
            AgentStatus::Running => "running",
            AgentStatus::Paused => "paused",
            AgentStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    DataCollection,
    Analysis,
    Trading,
    Social,
    Automation,
    Monitoring,
}

impl AgentCategory {
    pub const ALL: [AgentCategory; 6] = [
        AgentCategory::DataCollection,
        AgentCategory::Analysis,
        AgentCategory::Trading,
        AgentCategory::Social,
        AgentCategory::Automation,
        AgentCategory::Monitoring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCategory::DataCollection => "data_collection",
            AgentCategory::Analysis => "analysis",
            AgentCategory::Trading => "trading",
            AgentCategory::Social => "social",
            AgentCategory::Automation => "automation",
            AgentCategory::Monitoring => "monitoring",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Rss,
    Website,
    Api,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [SourceType::Rss, SourceType::Website, SourceType::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Rss => "rss",
            SourceType::Website => "website",
            SourceType::Api => "api",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(
            AgentCategory::parse("data_collection"),
            Some(AgentCategory::DataCollection)
        );
        assert_eq!(AgentCategory::parse("weather"), None);
    }

    #[test]
    fn test_source_type_parse_matches_serde() {
        for kind in SourceType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(SourceType::parse(kind.as_str()), Some(kind));
        }
    }
}
