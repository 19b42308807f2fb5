use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
});

/// Readable text of an HTML fragment: scripts, styles and comments dropped,
/// tags replaced by spaces, entities decoded, whitespace collapsed.
pub fn extract_text(html: &str) -> String {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    let text = html_escape::decode_html_entities(&text);
    normalize_whitespace(&text)
}

pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

pub fn extract_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .map(|caps| extract_text(&caps[1]))
        .filter(|title| !title.is_empty())
}

/// `src` of every `<img>`, in document order, without repeats.
pub fn extract_images(html: &str) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for caps in IMG_SRC.captures_iter(html) {
        let src = html_escape::decode_html_entities(&caps[1]).to_string();
        if !images.contains(&src) {
            images.push(src);
        }
    }
    images
}

/// Text of every element matched by each CSS selector, selectors in order.
/// Selectors that fail to parse are skipped.
pub fn select_sections(html: &str, selectors: &[String]) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut sections = Vec::new();

    for selector_str in selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(selector) => selector,
            Err(e) => {
                log::warn!("Ignoring invalid selector {:?}: {:?}", selector_str, e);
                continue;
            }
        };

        for element in document.select(&selector) {
            let text = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                sections.push(text);
            }
        }
    }

    sections
}
