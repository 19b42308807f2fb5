use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::html::{extract_text, normalize_whitespace};
use crate::types::RssItem;

static RSS_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>").unwrap());
static ATOM_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<entry\b[^>]*>(.*?)</entry>").unwrap());
static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static ATOM_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b([^>]*?)\bhref\s*=\s*["']([^"']+)["']"#).unwrap()
});
static ENCLOSURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(?:enclosure|media:content)\b[^>]*?\burl\s*=\s*["']([^"']+)["']"#)
        .unwrap()
});

// Elements read from items, entries and the feed head
const ELEMENTS: [&str; 11] = [
    "title",
    "link",
    "guid",
    "description",
    "content:encoded",
    "content",
    "summary",
    "pubDate",
    "dc:date",
    "published",
    "updated",
];

static ELEMENT_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    ELEMENTS
        .iter()
        .map(|name| {
            let pattern = format!(r"(?is)<{0}(?:\s[^>]*)?>(.*?)</{0}\s*>", regex::escape(name));
            (*name, Regex::new(&pattern).unwrap())
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub items: Vec<RssItem>,
}

/// Parses RSS 2.0 `<item>`s, falling back to Atom `<entry>`s.
pub fn parse_feed(xml: &str) -> ParsedFeed {
    let items: Vec<RssItem> = RSS_ITEM
        .captures_iter(xml)
        .map(|caps| parse_rss_item(&caps[1]))
        .collect();

    let items = if items.is_empty() {
        ATOM_ENTRY
            .captures_iter(xml)
            .map(|caps| parse_atom_entry(&caps[1]))
            .collect()
    } else {
        items
    };

    ParsedFeed {
        title: feed_title(xml),
        items,
    }
}

fn feed_title(xml: &str) -> Option<String> {
    let head_end = ["<item", "<entry"]
        .iter()
        .filter_map(|marker| xml.find(marker))
        .min()
        .unwrap_or(xml.len());

    element_text(&xml[..head_end], "title")
}

fn parse_rss_item(block: &str) -> RssItem {
    let description = element_markup(block, "content:encoded")
        .or_else(|| element_markup(block, "description"))
        .unwrap_or_default();

    RssItem {
        title: element_text(block, "title").unwrap_or_default(),
        link: element_text(block, "link")
            .or_else(|| element_text(block, "guid"))
            .unwrap_or_default(),
        description,
        published: element_text(block, "pubDate").or_else(|| element_text(block, "dc:date")),
        enclosures: enclosures(block),
    }
}

fn parse_atom_entry(block: &str) -> RssItem {
    let link = ATOM_LINK
        .captures_iter(block)
        .find(|caps| {
            let attrs = caps[1].to_ascii_lowercase();
            !attrs.contains("rel=") || attrs.contains("alternate")
        })
        .map(|caps| html_escape::decode_html_entities(&caps[2]).into_owned())
        .unwrap_or_default();

    RssItem {
        title: element_text(block, "title").unwrap_or_default(),
        link,
        description: element_markup(block, "content")
            .or_else(|| element_markup(block, "summary"))
            .unwrap_or_default(),
        published: element_text(block, "published").or_else(|| element_text(block, "updated")),
        enclosures: enclosures(block),
    }
}

fn enclosures(block: &str) -> Vec<String> {
    ENCLOSURE
        .captures_iter(block)
        .map(|caps| html_escape::decode_html_entities(&caps[1]).into_owned())
        .collect()
}

/// Character data of the first `<name>` element: entities decoded once
/// outside CDATA sections, CDATA taken literally.
fn element_value(block: &str, name: &str) -> Option<String> {
    let inner = ELEMENT_PATTERNS.get(name)?.captures(block)?.get(1)?.as_str();

    let mut value = String::with_capacity(inner.len());
    let mut last = 0;
    for caps in CDATA.captures_iter(inner) {
        let (Some(whole), Some(data)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        value.push_str(&html_escape::decode_html_entities(&inner[last..whole.start()]));
        value.push_str(data.as_str());
        last = whole.end();
    }
    value.push_str(&html_escape::decode_html_entities(&inner[last..]));

    Some(value)
}

/// Plain-text element such as a title, link or date.
fn element_text(block: &str, name: &str) -> Option<String> {
    let text = normalize_whitespace(&element_value(block, name)?);
    (!text.is_empty()).then_some(text)
}

/// Element carrying HTML (descriptions, content), reduced to readable text.
fn element_markup(block: &str, name: &str) -> Option<String> {
    let text = extract_text(&element_value(block, name)?);
    (!text.is_empty()).then_some(text)
}
