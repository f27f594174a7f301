use tracing::debug;

use crate::browser::{script, PageContext};

/// Ordered list of selector alternatives treated as one lookup strategy
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorGroup {
    pub label: &'static str,
    pub selectors: Vec<String>,
}

impl SelectorGroup {
    pub fn new(label: &'static str, selectors: &[&str]) -> Self {
        Self {
            label,
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// All alternatives of the group as one CSS union
    pub fn css_union(&self) -> String {
        self.selectors.join(", ")
    }
}

/// Outcome of a cascade lookup: the values plus which group produced them
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeHit {
    pub values: Vec<String>,
    pub group_index: usize,
    pub group_label: &'static str,
}

/// Walk `groups` in order; the first group yielding non-blank text wins.
/// A group whose evaluation fails counts as a miss, never as an error.
pub async fn resolve_texts(
    page: &dyn PageContext,
    field: &str,
    groups: &[SelectorGroup],
) -> Option<CascadeHit> {
    for (index, group) in groups.iter().enumerate() {
        match script::query_texts(page, &group.css_union()).await {
            Ok(texts) => {
                if let Some(hit) = keep_non_blank(texts, index, group.label) {
                    debug!("field '{}' matched selector group '{}'", field, group.label);
                    return Some(hit);
                }
            }
            Err(e) => {
                debug!(
                    "field '{}' group '{}' evaluation failed, treated as miss: {}",
                    field, group.label, e
                );
            }
        }
    }
    None
}

/// Cascade lookup over an attribute instead of text content
pub async fn resolve_attrs(
    page: &dyn PageContext,
    field: &str,
    groups: &[SelectorGroup],
    attr: &str,
) -> Option<CascadeHit> {
    for (index, group) in groups.iter().enumerate() {
        match script::query_attrs(page, &group.css_union(), attr).await {
            Ok(values) => {
                if let Some(hit) = keep_non_blank(values, index, group.label) {
                    debug!("field '{}' matched selector group '{}'", field, group.label);
                    return Some(hit);
                }
            }
            Err(e) => {
                debug!(
                    "field '{}' group '{}' evaluation failed, treated as miss: {}",
                    field, group.label, e
                );
            }
        }
    }
    None
}

/// First matched value of a cascade, or empty when nothing matched
pub fn first_value(hit: Option<CascadeHit>) -> String {
    hit.and_then(|h| h.values.into_iter().next())
        .unwrap_or_default()
}

fn keep_non_blank(raw: Vec<String>, index: usize, label: &'static str) -> Option<CascadeHit> {
    let values: Vec<String> = raw
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(CascadeHit {
            values,
            group_index: index,
            group_label: label,
        })
    }
}
