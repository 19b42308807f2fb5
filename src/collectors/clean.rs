use serde_json::{json, Value};

use super::html::select_sections;
use crate::types::{CollectedData, DataTarget, MediaItem, RawPayload};

/// Normalizes a fetched payload into collected items: one per feed entry,
/// one per page (or per element matched by the target's selectors), one per
/// JSON record. A page where no selector matches yields the whole page.
pub fn clean_payload(raw: RawPayload, target: &DataTarget) -> Vec<CollectedData> {
    match raw {
        RawPayload::Rss { feed_title, items } => items
            .into_iter()
            .filter(|item| !item.title.is_empty() || !item.description.is_empty())
            .map(|item| {
                let url = if item.link.is_empty() {
                    target.url.clone()
                } else {
                    item.link
                };
                let media = item
                    .enclosures
                    .into_iter()
                    .map(|url| MediaItem {
                        url,
                        media_type: "enclosure".to_string(),
                    })
                    .collect();

                CollectedData::new(&target.source_id, url, item.title, item.description)
                    .with_metadata("feedTitle", json!(feed_title))
                    .with_metadata("published", json!(item.published))
                    .with_media(media)
            })
            .collect(),

        RawPayload::Website(page) => {
            let title = page.title.clone().unwrap_or_else(|| target.name.clone());
            let media: Vec<MediaItem> = page
                .media
                .iter()
                .map(|src| MediaItem {
                    url: resolve_url(&page.url, src),
                    media_type: "image".to_string(),
                })
                .collect();

            let sections = select_sections(&page.html, &target.selectors);
            if sections.is_empty() {
                if page.text.is_empty() {
                    Vec::new()
                } else {
                    vec![CollectedData::new(&target.source_id, &page.url, title, page.text)
                        .with_metadata("status", json!(page.status))
                        .with_media(media)]
                }
            } else {
                sections
                    .into_iter()
                    .enumerate()
                    .map(|(index, section)| {
                        CollectedData::new(&target.source_id, &page.url, &title, section)
                            .with_metadata("status", json!(page.status))
                            .with_metadata("section", json!(index))
                    })
                    .collect()
            }
        }

        RawPayload::Api { body } => {
            let records = match body {
                Value::Array(records) => records,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            records
                .into_iter()
                .map(|record| api_record(record, target))
                .collect()
        }
    }
}

fn api_record(record: Value, target: &DataTarget) -> CollectedData {
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| record.get(*name).and_then(Value::as_str))
            .map(String::from)
    };

    let title = field(&["title", "name", "headline"]).unwrap_or_else(|| target.name.clone());
    let url = field(&["url", "link"]).unwrap_or_else(|| target.url.clone());
    let content = field(&["content", "body", "description", "text"])
        .unwrap_or_else(|| record.to_string());

    CollectedData::new(&target.source_id, url, title, content).with_metadata("raw", record)
}

fn resolve_url(base: &str, reference: &str) -> String {
    url::Url::parse(base)
        .and_then(|base| base.join(reference))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| reference.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HtmlPage, RssItem, SourceType};

    #[test]
    fn test_clean_api_array() {
        let target = DataTarget::new("prices", SourceType::Api, "https://api.test/prices");
        let raw = RawPayload::Api {
            body: json!([
                {"name": "BTC", "description": "Bitcoin", "url": "https://api.test/btc"},
                {"price": 42}
            ]),
        };

        let items = clean_payload(raw, &target);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "BTC");
        assert_eq!(items[0].url, "https://api.test/btc");
        assert_eq!(items[1].title, "prices");
        assert_eq!(items[1].content, r#"{"price":42}"#);
        assert_eq!(items[1].metadata["raw"]["price"], 42);
    }

    fn page(url: &str, html: &str) -> HtmlPage {
        HtmlPage {
            url: url.to_string(),
            status: 200,
            title: Some("Blog".to_string()),
            text: "everything".to_string(),
            media: vec![],
            html: html.to_string(),
        }
    }

    #[test]
    fn test_clean_website_sections() {
        let mut target = DataTarget::new("blog", SourceType::Website, "https://blog.test/");
        target.selectors = vec!["article".to_string()];
        let raw = RawPayload::Website(page(
            "https://blog.test/",
            "<article>Post one</article><article>Post two</article>",
        ));

        let items = clean_payload(raw, &target);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].content, "Post two");
        assert_eq!(items[1].metadata["section"], 1);
    }

    #[test]
    fn test_selectors_follow_the_target() {
        let raw = RawPayload::Website(page(
            "https://blog.test/",
            "<h2>Title A</h2><p>Body A</p>",
        ));
        let mut target = DataTarget::new("blog", SourceType::Website, "https://blog.test/");

        target.selectors = vec!["h2".to_string()];
        let headings = clean_payload(raw.clone(), &target);
        target.selectors = vec!["p".to_string()];
        let paragraphs = clean_payload(raw.clone(), &target);
        target.selectors = vec!["table".to_string()];
        let unmatched = clean_payload(raw, &target);

        assert_eq!(headings[0].content, "Title A");
        assert_eq!(paragraphs[0].content, "Body A");
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].content, "everything");
    }

    #[test]
    fn test_clean_website_resolves_media() {
        let target = DataTarget::new("blog", SourceType::Website, "https://blog.test/posts/");
        let raw = RawPayload::Website(HtmlPage {
            url: "https://blog.test/posts/".to_string(),
            status: 200,
            title: None,
            text: "Body".to_string(),
            media: vec!["../img/a.png".to_string()],
            html: "<p>Body</p>".to_string(),
        });

        let items = clean_payload(raw, &target);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "blog");
        assert_eq!(items[0].media[0].url, "https://blog.test/img/a.png");
    }

    #[test]
    fn test_clean_skips_empty_feed_items() {
        let target = DataTarget::new("feed", SourceType::Rss, "https://feed.test/rss");
        let raw = RawPayload::Rss {
            feed_title: None,
            items: vec![RssItem {
                title: String::new(),
                link: "https://feed.test/1".to_string(),
                description: String::new(),
                published: None,
                enclosures: vec![],
            }],
        };

        assert!(clean_payload(raw, &target).is_empty());
    }
}
