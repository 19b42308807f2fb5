use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AgentError, Result};
use crate::lifecycle::events::DEFAULT_EVENT_CAPACITY;
use crate::types::AgentConfig;

/// Process-wide runtime settings, separate from per-agent [`AgentConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub min_fetch_interval_secs: u64,
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: "Harvester/1.0".to_string(),
            fetch_timeout_secs: 30,
            min_fetch_interval_secs: 60,
            event_channel_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            user_agent: std::env::var("HARVESTER_USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout_secs: env_number("FETCH_TIMEOUT_SECS")
                .unwrap_or(defaults.fetch_timeout_secs),
            min_fetch_interval_secs: env_number("FETCH_MIN_INTERVAL_SECS")
                .unwrap_or(defaults.min_fetch_interval_secs),
            event_channel_capacity: env_number("EVENT_CHANNEL_CAPACITY")
                .unwrap_or(defaults.event_channel_capacity),
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Reads an [`AgentConfig`] from a `.json`, `.toml`, `.yaml` or `.yml` file.
/// The config is parsed, not validated.
pub fn load_agent_config(path: impl AsRef<Path>) -> Result<AgentConfig> {
    let path = path.as_ref();
    let load_error = |reason: String| AgentError::ConfigLoad {
        path: path.display().to_string(),
        reason,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(&contents).map_err(|e| load_error(e.to_string())),
        "toml" => toml::from_str(&contents).map_err(|e| load_error(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| load_error(e.to_string())),
        other => Err(load_error(format!("unsupported config format {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.min_fetch_interval_secs, 60);
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
                id = "news"
                name = "News"
                category = "data_collection"

                [resources]
                memory = 128
                cpu = 0.5
                timeoutSeconds = 60
                storageMB = 10

                [[dataSources]]
                id = "hn"
                name = "Hacker News"
                type = "rss"
                url = "https://news.ycombinator.com/rss"
            "#,
        );

        let config = load_agent_config(file.path()).unwrap();
        assert_eq!(config.id, "news");
        assert_eq!(config.resources.memory, 128);
        assert_eq!(config.data_sources[0].source_type, "rss");
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            concat!(
                "id: news\n",
                "name: News\n",
                "category: monitoring\n",
                "dataSources:\n",
                "  - id: api\n",
                "    name: API\n",
                "    type: api\n",
                "    url: https://api.test/items\n",
            ),
        );

        let config = load_agent_config(file.path()).unwrap();
        assert_eq!(config.category, "monitoring");
        assert_eq!(config.data_sources.len(), 1);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(
            ".json",
            r#"{"id": "news", "name": "News", "category": "analysis"}"#,
        );
        assert_eq!(load_agent_config(file.path()).unwrap().name, "News");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".ini", "id=news");
        let err = load_agent_config(file.path()).unwrap_err();
        assert!(matches!(err, AgentError::ConfigLoad { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_agent_config("/nonexistent/agent.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/agent.json"));
    }
}
