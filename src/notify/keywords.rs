// src/notify/keywords.rs

//! Keyword-hit filter shared by site visibility and per-subscriber checks.

/// OR-semantics keyword filter.
///
/// An empty filter string means "always visible"; otherwise the page hits
/// iff at least one comma-separated keyword appears as a literal
/// case-sensitive substring of `"{title} {content}"`.
pub fn is_hit_keywords(title: &str, content: &str, filter_keywords: &str) -> bool {
    if filter_keywords.is_empty() {
        return true;
    }

    let text = format!("{title} {content}");
    filter_keywords
        .split(',')
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| text.contains(keyword))
}
