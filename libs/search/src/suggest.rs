//! Autocomplete suggester
//!
//! For an input like `"data scien"` the last token (`scien`) is the partial
//! word being typed and everything before it (`data`) is a fixed prefix. The
//! backend is asked for the most frequent indexed terms of the target field
//! that start with the partial word, among documents matching the whole
//! input, and each term is glued back onto the prefix.

use crate::models::SearchResponse;
use serde_json::{json, Value as JsonValue};

/// Name of the terms aggregation carrying the suggestions
pub const AUTOCOMPLETE_AGGREGATION: &str = "autocomplete";

/// Maximum number of suggestions requested from the backend
pub const MAX_SUGGESTIONS: usize = 5;

/// Characters with special meaning in the backend's term regex syntax
const REGEX_RESERVED: &[char] = &[
    '.', '?', '+', '*', '|', '{', '}', '[', ']', '(', ')', '"', '\\', '#', '@', '&', '<', '>',
    '~',
];

/// A parsed autocomplete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    term: String,
    field: String,
    prefix: String,
    partial: String,
}

impl Suggestion {
    /// Split `term` into prefix and partial token. Returns `None` for blank input.
    ///
    /// Trailing whitespace means the last word is finished: the partial token
    /// is empty and every word belongs to the prefix, so the next word is
    /// suggested.
    pub fn parse(term: &str, field: &str) -> Option<Self> {
        let mut tokens: Vec<&str> = term.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        let partial = if term.ends_with(char::is_whitespace) {
            ""
        } else {
            tokens.pop().unwrap_or_default()
        };
        let prefix = tokens.join(" ");
        let term = if prefix.is_empty() {
            partial.to_string()
        } else {
            format!("{} {}", prefix, partial)
        };

        Some(Self {
            term,
            field: field.to_string(),
            prefix,
            partial: partial.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn partial(&self) -> &str {
        &self.partial
    }

    /// Request body: matching documents only, a terms aggregation over the
    /// field restricted to terms starting with the partial token.
    pub fn body(&self) -> JsonValue {
        json!({
            "size": 0,
            "aggs": {
                AUTOCOMPLETE_AGGREGATION: {
                    "terms": {
                        "size": MAX_SUGGESTIONS,
                        "field": self.field,
                        "include": format!("{}.*", escape_term_regex(self.partial())),
                        "order": {
                            "_count": "desc"
                        }
                    }
                }
            },
            "query": {
                "query_string": {
                    "query": format!("{}*", self.term),
                    "default_operator": "AND"
                }
            }
        })
    }

    /// Rebuild full suggestions from the autocomplete buckets, keeping
    /// backend order (count descending). Single-word input returns bare keys
    /// with no leading space.
    pub fn complete(&self, response: &SearchResponse) -> Vec<String> {
        autocomplete_keys(response)
            .into_iter()
            .map(|key| {
                if self.prefix.is_empty() {
                    key
                } else {
                    format!("{} {}", self.prefix, key)
                }
            })
            .collect()
    }
}

/// Bucket keys of the autocomplete aggregation, in backend order.
pub fn autocomplete_keys(response: &SearchResponse) -> Vec<String> {
    let buckets = response
        .aggregations
        .as_ref()
        .and_then(|aggs| aggs.get(AUTOCOMPLETE_AGGREGATION))
        .and_then(|agg| agg.get("buckets"))
        .and_then(JsonValue::as_array);

    let Some(buckets) = buckets else {
        return Vec::new();
    };

    buckets
        .iter()
        .filter_map(|bucket| match bucket.get("key")? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

/// Escape a literal for use inside a term `include` regex.
pub fn escape_term_regex(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if REGEX_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
