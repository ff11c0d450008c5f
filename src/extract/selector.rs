// src/extract/selector.rs

//! Selector-dialect extraction for HTML list pages.
//!
//! Each rule string is either `"<container-selector>"` or
//! `"<container-selector> | <title-selector>"`. For every matched container
//! the engine takes an anchor's `href` as the link URL and either the
//! container's own text or the title-selector text as the title.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::LinkSet;

/// A compiled selector extraction unit.
#[derive(Debug, Clone)]
pub struct SelectorRule {
    container: Selector,
    title: Option<Selector>,
}

impl SelectorRule {
    /// Parse a rule string, compiling its selectors once.
    pub fn parse(rule: &str) -> Result<Self> {
        match rule.split_once('|') {
            Some((container, title)) => Ok(Self {
                container: parse_selector(container.trim())?,
                title: Some(parse_selector(title.trim())?),
            }),
            None => Ok(Self {
                container: parse_selector(rule.trim())?,
                title: None,
            }),
        }
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Run selector rules over a fetched list page.
///
/// Results of independent rules are unioned into one link set keyed by the
/// final resolved URL, so colliding links collapse (last-write-wins).
pub fn extract_links(base_url: &str, html: &str, rules: &[SelectorRule]) -> Result<LinkSet> {
    let base = Url::parse(base_url)?;
    let document = Html::parse_document(html);
    let anchor_sel = parse_selector("a")?;

    let mut links = LinkSet::new();
    for rule in rules {
        for container in document.select(&rule.container) {
            let Some(anchor) = find_anchor(&container, &anchor_sel) else {
                continue;
            };

            let raw_title: String = match &rule.title {
                Some(title_sel) => match container.select(title_sel).next() {
                    Some(el) => el.text().collect(),
                    None => continue,
                },
                None => container.text().collect(),
            };
            let title = raw_title.trim();
            if title.is_empty() {
                continue;
            }

            let href = anchor.value().attr("href").unwrap_or("");
            if href.is_empty() || href.starts_with("javascript:") {
                continue;
            }

            links.insert(compose_url(&base, href), title.to_string());
        }
    }
    Ok(links)
}

/// The container itself if it is an anchor, otherwise its first descendant
/// anchor.
fn find_anchor<'a>(container: &ElementRef<'a>, anchor_sel: &Selector) -> Option<ElementRef<'a>> {
    if container.value().name() == "a" {
        return Some(*container);
    }
    container.select(anchor_sel).next()
}

/// Resolve an href to an absolute URL.
///
/// Absolute hrefs pass through unchanged; scheme-relative hrefs borrow the
/// base URL's scheme; anything else resolves relative to the base.
pub fn compose_url(base: &Url, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if href.starts_with("//") {
        return format!("{}:{}", base.scheme(), href);
    }
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(base: &str, html: &str, rules: &[&str]) -> LinkSet {
        let rules: Vec<SelectorRule> =
            rules.iter().map(|r| SelectorRule::parse(r).unwrap()).collect();
        extract_links(base, html, &rules).unwrap()
    }

    #[test]
    fn test_container_is_anchor() {
        let html = r#"<ul><li><a class="title" href="/news/1">  Hello  </a></li></ul>"#;
        let links = extract("https://site.com/list", html, &["a.title"]);

        assert_eq!(links.len(), 1);
        assert_eq!(links.title("https://site.com/news/1"), Some("Hello"));
    }

    #[test]
    fn test_separate_title_selector() {
        let html = r#"
            <div class="item">
                <span class="t">Policy update</span>
                <a href="detail?id=9">read</a>
            </div>"#;
        let links = extract("https://site.com/list/", html, &["div.item | span.t"]);

        assert_eq!(
            links.title("https://site.com/list/detail?id=9"),
            Some("Policy update")
        );
    }

    #[test]
    fn test_javascript_href_excluded() {
        let html = r#"<a href="javascript:void(0)">Click</a>"#;
        let links = extract("https://site.com", html, &["a"]);
        assert!(links.is_empty());
    }

    #[test]
    fn test_empty_title_excluded() {
        let html = r#"<a href="/news/1">   </a>"#;
        let links = extract("https://site.com", html, &["a"]);
        assert!(links.is_empty());
    }

    #[test]
    fn test_empty_href_excluded() {
        let html = r#"<div class="item"><a>Title</a></div>"#;
        let links = extract("https://site.com", html, &["div.item"]);
        assert!(links.is_empty());
    }

    #[test]
    fn test_scheme_relative_href() {
        let html = r#"<a href="//cdn.example.com/a">CDN</a>"#;
        let links = extract("https://site.com", html, &["a"]);
        assert_eq!(links.title("https://cdn.example.com/a"), Some("CDN"));
    }

    #[test]
    fn test_absolute_href_unchanged() {
        let html = r#"<a href="http://other.com/x">Other</a>"#;
        let links = extract("https://site.com", html, &["a"]);
        assert_eq!(links.title("http://other.com/x"), Some("Other"));
    }

    #[test]
    fn test_multiple_rules_unioned() {
        let html = r#"
            <div class="a"><a href="/1">One</a></div>
            <div class="b"><a href="/2">Two</a></div>"#;
        let links = extract("https://site.com", html, &["div.a", "div.b"]);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_colliding_urls_collapse() {
        let html = r#"
            <div class="a"><a href="/1">First title</a></div>
            <div class="b"><a href="/1">Second title</a></div>"#;
        let links = extract("https://site.com", html, &["div.a", "div.b"]);

        assert_eq!(links.len(), 1);
        assert_eq!(links.title("https://site.com/1"), Some("Second title"));
    }

    #[test]
    fn test_invalid_selector_is_error() {
        assert!(SelectorRule::parse("[[invalid").is_err());
    }
}
