use serde::{Deserialize, Serialize};

use crate::types::{AgentCategory, AgentConfig};

pub const MIN_MEMORY_MB: u64 = 64;
pub const MIN_CPU_CORES: f64 = 0.1;
pub const MIN_TIMEOUT_SECONDS: u64 = 1;

/// Outcome of validating an [`AgentConfig`]. `errors` is omitted when the
/// config is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ValidationOutcome {
    pub fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self {
                success: true,
                errors: None,
            }
        } else {
            Self {
                success: false,
                errors: Some(errors),
            }
        }
    }

    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors.unwrap_or_default()
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Rules every agent type shares. Never fails; problems come back as
    /// messages.
    pub fn generic_errors(config: &AgentConfig) -> Vec<String> {
        let mut errors = Vec::new();

        if config.id.trim().is_empty() {
            errors.push("Agent id is required".to_string());
        }
        if config.name.trim().is_empty() {
            errors.push("Agent name is required".to_string());
        }
        if AgentCategory::parse(&config.category).is_none() {
            errors.push(format!("Invalid category: {}", config.category));
        }

        let resources = &config.resources;
        if resources.memory < MIN_MEMORY_MB {
            errors.push("Minimum memory allocation is 64MB".to_string());
        }
        if resources.cpu.is_nan() || resources.cpu < MIN_CPU_CORES {
            errors.push("Minimum CPU allocation is 0.1 cores".to_string());
        }
        if resources.timeout_seconds < MIN_TIMEOUT_SECONDS {
            errors.push("Minimum timeout is 1 second".to_string());
        }

        errors
    }

    /// Generic rules followed by the agent-specific ones, in that order.
    pub fn validate(config: &AgentConfig, specific: Vec<String>) -> ValidationOutcome {
        let mut errors = Self::generic_errors(config);
        errors.extend(specific);
        ValidationOutcome::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_with_resources(resources: serde_json::Value) -> AgentConfig {
        serde_json::from_value(json!({
            "id": "agent-1",
            "name": "Collector",
            "category": "data_collection",
            "resources": resources
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_config() {
        let config = config_with_resources(json!({
            "memory": 64, "cpu": 0.1, "timeoutSeconds": 1, "storageMB": 0
        }));

        let outcome = ConfigValidator::validate(&config, vec![]);
        assert!(outcome.success);
        assert!(outcome.errors.is_none());
    }

    #[test]
    fn test_all_resource_minimums() {
        let config = config_with_resources(json!({
            "memory": 32, "cpu": 0.05, "timeout": 0, "storage": 5
        }));

        let outcome = ConfigValidator::validate(&config, vec![]);
        assert!(!outcome.success);
        assert_eq!(
            outcome.errors(),
            &[
                "Minimum memory allocation is 64MB".to_string(),
                "Minimum CPU allocation is 0.1 cores".to_string(),
                "Minimum timeout is 1 second".to_string(),
            ]
        );
    }

    #[test]
    fn test_nan_cpu_is_rejected() {
        let config: AgentConfig = toml::from_str(
            r#"
                id = "agent-1"
                name = "Collector"
                category = "data_collection"

                [resources]
                memory = 128
                cpu = nan
                timeoutSeconds = 30
                storageMB = 10
            "#,
        )
        .unwrap();

        let outcome = ConfigValidator::validate(&config, vec![]);
        assert!(!outcome.success);
        assert_eq!(outcome.errors(), &["Minimum CPU allocation is 0.1 cores".to_string()]);
    }

    #[test]
    fn test_name_and_category() {
        let mut config = config_with_resources(json!({
            "memory": 128, "cpu": 1.0, "timeoutSeconds": 30, "storageMB": 10
        }));
        config.name = "  ".to_string();
        config.category = "weather".to_string();

        let errors = ConfigValidator::generic_errors(&config);
        assert_eq!(
            errors,
            vec![
                "Agent name is required".to_string(),
                "Invalid category: weather".to_string()
            ]
        );
    }

    #[test]
    fn test_specific_errors_are_appended() {
        let mut config = config_with_resources(json!({
            "memory": 128, "cpu": 1.0, "timeoutSeconds": 30, "storageMB": 10
        }));
        config.resources.memory = 1;

        let outcome =
            ConfigValidator::validate(&config, vec!["At least one data source is required".into()]);
        assert_eq!(outcome.errors().len(), 2);
        assert_eq!(outcome.errors()[1], "At least one data source is required");
    }

    #[test]
    fn test_outcome_serialization_omits_errors() {
        let ok = serde_json::to_value(ValidationOutcome::from_errors(vec![])).unwrap();
        assert_eq!(ok, json!({"success": true}));
    }
}
