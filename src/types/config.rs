use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AgentCategory, AgentId, SourceType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,

    // Kept as the raw string so validation can report unknown categories
    pub category: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub resources: ResourceLimits,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_enabled() -> bool {
    true
}

impl AgentConfig {
    pub fn category(&self) -> Option<AgentCategory> {
        AgentCategory::parse(&self.category)
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    /// Megabytes.
    pub memory: u64,
    /// Cores.
    pub cpu: f64,
    #[serde(alias = "timeout")]
    pub timeout_seconds: u64,
    #[serde(rename = "storageMB", alias = "storage")]
    pub storage_mb: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory: 256,
            cpu: 0.5,
            timeout_seconds: 300,
            storage_mb: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl DataSource {
    pub fn kind(&self) -> Option<SourceType> {
        SourceType::parse(&self.source_type)
    }
}

/// Partial update for [`AgentConfig`]. Present fields replace the current
/// value wholesale; `id` is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub category: Option<String>,
    pub enabled: Option<bool>,
    pub resources: Option<ResourceLimits>,
    pub settings: Option<Map<String, Value>>,
    pub data_sources: Option<Vec<DataSource>>,
}

impl ConfigPatch {
    pub fn apply(&self, base: &AgentConfig) -> AgentConfig {
        let mut merged = base.clone();

        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(version) = &self.version {
            merged.version = version.clone();
        }
        if let Some(category) = &self.category {
            merged.category = category.clone();
        }
        if let Some(enabled) = self.enabled {
            merged.enabled = enabled;
        }
        if let Some(resources) = &self.resources {
            merged.resources = resources.clone();
        }
        if let Some(settings) = &self.settings {
            merged.settings = settings.clone();
        }
        if let Some(sources) = &self.data_sources {
            merged.data_sources = sources.clone();
        }

        merged
    }
}
