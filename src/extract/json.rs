// src/extract/json.rs

//! Structured-data dialect for JSON list pages.
//!
//! The rule is 4 or 5 elements:
//! `[base_path, title_path, url_path, compose_template, display_url_path?]`.
//! Paths are a JSONPath subset (leading `$`, dotted fields, `[n]` index,
//! `[*]` wildcard); the compose template is a literal string with a single
//! `$` placeholder for the raw url.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::LinkSet;

/// A parsed JSONPath-subset expression.
#[derive(Debug, Clone)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Field(String),
    Index(usize),
    Wildcard,
}

impl JsonPath {
    /// Parse an expression like `$.data.items[*].title`.
    pub fn parse(expr: &str) -> Result<Self> {
        let mut rest = expr.trim();
        rest = rest.strip_prefix('$').unwrap_or(rest);

        let mut segments = Vec::new();
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('.') {
                rest = after;
                continue;
            }
            if let Some(after) = rest.strip_prefix('[') {
                let end = after
                    .find(']')
                    .ok_or_else(|| AppError::rule(format!("unclosed '[' in path '{expr}'")))?;
                let inner = &after[..end];
                if inner == "*" {
                    segments.push(Segment::Wildcard);
                } else {
                    let index: usize = inner.parse().map_err(|_| {
                        AppError::rule(format!("bad index '{inner}' in path '{expr}'"))
                    })?;
                    segments.push(Segment::Index(index));
                }
                rest = &after[end + 1..];
                continue;
            }

            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            segments.push(Segment::Field(rest[..end].to_string()));
            rest = &rest[end..];
        }

        Ok(Self { segments })
    }

    /// All nodes matched by this path.
    pub fn find<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut nodes = vec![root];
        for segment in &self.segments {
            let mut next = Vec::new();
            for node in nodes {
                match segment {
                    Segment::Field(name) => {
                        if let Some(v) = node.get(name) {
                            next.push(v);
                        }
                    }
                    Segment::Index(i) => {
                        if let Some(v) = node.get(i) {
                            next.push(v);
                        }
                    }
                    Segment::Wildcard => match node {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                }
            }
            nodes = next;
        }
        nodes
    }

    /// First matched node, if any.
    pub fn find_first<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.find(root).into_iter().next()
    }
}

/// Compiled structured-data rule.
#[derive(Debug, Clone)]
pub struct StructuredRule {
    base_path: JsonPath,
    title_path: JsonPath,
    url_path: JsonPath,
    compose_template: String,
    display_url_path: Option<JsonPath>,
}

impl StructuredRule {
    /// Build from a raw rule list. Fewer than 4 elements is a configuration
    /// error, never a crash.
    pub fn from_rule(rule: &[String]) -> Result<Self> {
        if rule.len() < 4 {
            return Err(AppError::rule(format!(
                "structured rule needs at least 4 elements, got {}",
                rule.len()
            )));
        }

        Ok(Self {
            base_path: JsonPath::parse(&rule[0])?,
            title_path: JsonPath::parse(&rule[1])?,
            url_path: JsonPath::parse(&rule[2])?,
            compose_template: rule[3].clone(),
            display_url_path: rule.get(4).map(|p| JsonPath::parse(p)).transpose()?,
        })
    }

    /// Evaluate the rule against a fetched JSON document.
    ///
    /// The base path yields the item sequence (a matched array expands to
    /// its elements). Items missing a title or url are skipped; a document
    /// that matches nothing yields an empty link set.
    pub fn extract(&self, root: &Value) -> Result<LinkSet> {
        let mut items = Vec::new();
        for node in self.base_path.find(root) {
            match node {
                Value::Array(elements) => items.extend(elements.iter()),
                other => items.push(other),
            }
        }

        let mut links = LinkSet::new();
        for item in items {
            let Some(title) = self.title_path.find_first(item).and_then(as_text) else {
                continue;
            };
            let Some(raw_url) = self.url_path.find_first(item).and_then(as_text) else {
                continue;
            };

            let url = if self.compose_template.is_empty() {
                raw_url
            } else {
                self.compose_template.replace('$', &raw_url)
            };

            if let Some(display_path) = &self.display_url_path {
                if let Some(display) = display_path.find_first(item).and_then(as_text) {
                    links.set_display_url(&url, display);
                }
            }
            links.insert(url, title);
        }
        Ok(links)
    }
}

/// Stringify a scalar JSON node; objects, arrays and null carry no text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
