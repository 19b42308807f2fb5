use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{DataSource, ItemId, SourceType};

/// A single fetch unit for one run, derived from a [`DataSource`] plus any
/// runtime overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTarget {
    pub source_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub url: String,
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default)]
    pub rate_limit_secs: Option<u64>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl DataTarget {
    pub fn new(
        source_id: impl Into<String>,
        source_type: SourceType,
        url: impl Into<String>,
    ) -> Self {
        let source_id = source_id.into();
        Self {
            name: source_id.clone(),
            source_id,
            source_type,
            url: url.into(),
            selectors: Vec::new(),
            rate_limit_secs: None,
            headers: BTreeMap::new(),
        }
    }

    /// Overrides are read from the source's free-form `config` map:
    /// `selectors` (array of strings), `rateLimitSecs` (integer) and
    /// `headers` (object of strings).
    pub fn from_source(source: &DataSource) -> Result<Self> {
        let source_type = source.kind().ok_or_else(|| {
            anyhow!(
                "Unsupported data source type for {}: {}",
                source.id,
                source.source_type
            )
        })?;

        let selectors = source
            .config
            .get("selectors")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let headers = source
            .config
            .get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            source_id: source.id.clone(),
            name: source.name.clone(),
            source_type,
            url: source.url.clone(),
            selectors,
            rate_limit_secs: source.config.get("rateLimitSecs").and_then(Value::as_u64),
            headers,
        })
    }

    pub fn min_interval(&self, default: Duration) -> Duration {
        self.rate_limit_secs
            .map(Duration::from_secs)
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: Option<String>,
    #[serde(default)]
    pub enclosures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlPage {
    pub url: String,
    pub status: u16,
    pub title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub media: Vec<String>,
    // Raw markup; target selectors are applied when cleaning
    #[serde(default)]
    pub html: String,
}

/// Raw result of fetching one target, before cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawPayload {
    Rss {
        feed_title: Option<String>,
        items: Vec<RssItem>,
    },
    Website(HtmlPage),
    Api {
        body: Value,
    },
}

impl RawPayload {
    pub fn source_type(&self) -> SourceType {
        match self {
            RawPayload::Rss { .. } => SourceType::Rss,
            RawPayload::Website(_) => SourceType::Website,
            RawPayload::Api { .. } => SourceType::Api,
        }
    }

    pub fn validate_for(&self, target: &DataTarget) -> Result<()> {
        if self.source_type() != target.source_type {
            bail!(
                "Payload kind {} does not match target type {} for {}",
                self.source_type(),
                target.source_type,
                target.url
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub url: String,
    pub media_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedData {
    pub id: ItemId,
    pub source_id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    pub collected_at: DateTime<Utc>,
    pub hash: String,
}

impl CollectedData {
    pub fn new(
        source_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let title = title.into();
        let content = content.into();
        let hash = content_hash(&url, &title, &content);

        Self {
            id: ItemId::new_v4(),
            source_id: source_id.into(),
            url,
            title,
            content,
            metadata: Map::new(),
            media: Vec::new(),
            collected_at: Utc::now(),
            hash,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_media(mut self, media: Vec<MediaItem>) -> Self {
        self.media = media;
        self
    }
}

/// SHA-256 of url, title and content, hex encoded. Fields are separated so
/// that shifting text between them changes the fingerprint.
pub fn content_hash(url: &str, title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update([0u8]);
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub total_items: usize,
    pub new_items: usize,
    pub duplicate_items: usize,
    pub error_items: usize,
    pub total_size: usize,
    pub processing_time_ms: u64,
    pub sources: Vec<String>,
}
