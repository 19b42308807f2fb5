use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::clean::clean_payload;
use super::feed::parse_feed;
use super::html::{extract_images, extract_text, extract_title};
use crate::collection::CollectorStrategy;
use crate::config::Config;
use crate::types::{
    CollectedData, DataSource, DataTarget, HtmlPage, RawPayload, SourceType,
};

/// Collector that fetches targets over HTTP(S): RSS/Atom feeds, HTML pages
/// and JSON APIs.
pub struct HttpCollector {
    client: reqwest::Client,
    min_interval: Duration,
}

struct FetchedContent {
    status_code: u16,
    content_type: String,
    body: String,
}

impl HttpCollector {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            min_interval: Duration::from_secs(config.min_fetch_interval_secs),
        })
    }

    async fn fetch(&self, target: &DataTarget) -> Result<FetchedContent> {
        let mut request = self.client.get(&target.url);
        for (name, value) in &target.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", target.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} from {}", status, target.url);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await?;

        Ok(FetchedContent {
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl CollectorStrategy for HttpCollector {
    fn name(&self) -> &str {
        "http"
    }

    fn default_min_interval(&self) -> Duration {
        self.min_interval
    }

    async fn collect(&self, target: &DataTarget) -> Result<RawPayload> {
        let content = self.fetch(target).await?;
        log::debug!(
            "Fetched {} ({} bytes, {})",
            target.url,
            content.body.len(),
            content.content_type
        );

        let payload = match target.source_type {
            SourceType::Rss => {
                let feed = parse_feed(&content.body);
                RawPayload::Rss {
                    feed_title: feed.title,
                    items: feed.items,
                }
            }
            SourceType::Website => RawPayload::Website(HtmlPage {
                url: target.url.clone(),
                status: content.status_code,
                title: extract_title(&content.body),
                text: extract_text(&content.body),
                media: extract_images(&content.body),
                html: content.body,
            }),
            SourceType::Api => RawPayload::Api {
                body: serde_json::from_str(&content.body)
                    .with_context(|| format!("Invalid JSON from {}", target.url))?,
            },
        };

        Ok(payload)
    }

    fn clean(&self, raw: RawPayload, target: &DataTarget) -> Result<Vec<CollectedData>> {
        Ok(clean_payload(raw, target))
    }

    async fn test_connection(&self, source: &DataSource) -> Result<bool> {
        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("Connection test for {} failed", source.id))?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> HttpCollector {
        HttpCollector::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_collector_creation() {
        let collector = collector();
        assert_eq!(collector.name(), "http");
        assert_eq!(collector.default_min_interval(), Duration::from_secs(60));
    }
}
