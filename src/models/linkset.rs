// src/models/linkset.rs

//! Link set produced by the extraction rule engine.

use std::collections::HashMap;

/// Links discovered on a list page, keyed by final resolved URL.
///
/// The URL key is the dedup unit: colliding resolved URLs collapse to one
/// entry with last-write-wins on the title. An optional parallel mapping
/// carries per-URL display URLs when the rule supplies them.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    titles: HashMap<String, String>,
    display_urls: HashMap<String, String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link. A repeated URL overwrites the previous title.
    pub fn insert(&mut self, url: String, title: String) {
        self.titles.insert(url, title);
    }

    /// Attach a display URL for an already-known link.
    pub fn set_display_url(&mut self, url: &str, display_url: String) {
        self.display_urls.insert(url.to_string(), display_url);
    }

    pub fn title(&self, url: &str) -> Option<&str> {
        self.titles.get(url).map(String::as_str)
    }

    /// Display URL for a link, falling back to the URL itself.
    pub fn display_url<'a>(&'a self, url: &'a str) -> &'a str {
        self.display_urls.get(url).map(String::as_str).unwrap_or(url)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.titles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_last_write_wins() {
        let mut links = LinkSet::new();
        links.insert("https://a.com/x".to_string(), "first".to_string());
        links.insert("https://a.com/x".to_string(), "second".to_string());

        assert_eq!(links.len(), 1);
        assert_eq!(links.title("https://a.com/x"), Some("second"));
    }

    #[test]
    fn test_display_url_falls_back_to_url() {
        let mut links = LinkSet::new();
        links.insert("https://a.com/x".to_string(), "t".to_string());
        assert_eq!(links.display_url("https://a.com/x"), "https://a.com/x");

        links.set_display_url("https://a.com/x", "https://mp.a.com/x".to_string());
        assert_eq!(links.display_url("https://a.com/x"), "https://mp.a.com/x");
    }
}
