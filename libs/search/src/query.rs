//! Query builder
//!
//! Assembles request bodies for the backend's `_search` endpoint from
//! caller-supplied parameters. The query and aggregation clauses are opaque
//! and passed through untouched.

use crate::models::{AggregationSpec, QueryParams};
use serde_json::{json, Map, Value as JsonValue};

/// Opening tag wrapped around highlighted terms
pub const HIGHLIGHT_PRE_TAG: &str = "<mark>";
/// Closing tag wrapped around highlighted terms
pub const HIGHLIGHT_POST_TAG: &str = "</mark>";

/// Fixed highlighting policy: whole fields, every field, matches from any field.
pub fn highlight_directive() -> JsonValue {
    json!({
        "number_of_fragments": 0,
        "pre_tags": [HIGHLIGHT_PRE_TAG],
        "post_tags": [HIGHLIGHT_POST_TAG],
        "fields": {
            "*": {}
        },
        "require_field_match": false
    })
}

/// Sort directive for the request. Empty unless a sort field is set.
pub fn sort_directive(params: &QueryParams) -> JsonValue {
    let Some(field) = params.sort.as_deref() else {
        return JsonValue::Array(Vec::new());
    };

    let mut options = Map::new();
    if let Some(order) = params.order {
        options.insert("order".to_string(), json!(order.as_str()));
    }
    // Documents lacking the field must not fail the whole search
    options.insert("ignore_unmapped".to_string(), json!(true));

    let mut sort = Map::new();
    sort.insert(field.to_string(), JsonValue::Object(options));
    json!([sort])
}

/// A full search request: pagination, sort, query, aggregations, highlighting.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    params: &'a QueryParams,
    query: &'a JsonValue,
    aggs: Option<&'a AggregationSpec>,
}

impl<'a> SearchRequest<'a> {
    pub fn new(
        params: &'a QueryParams,
        query: &'a JsonValue,
        aggs: Option<&'a AggregationSpec>,
    ) -> Self {
        Self {
            params,
            query,
            aggs,
        }
    }

    /// Render the JSON body.
    pub fn into_body(self) -> JsonValue {
        let mut body = Map::new();

        body.insert("sort".to_string(), sort_directive(self.params));
        if let Some(from) = self.params.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.params.size {
            body.insert("size".to_string(), json!(size));
        }
        body.insert("query".to_string(), self.query.clone());
        if let Some(clauses) = self.aggs.and_then(AggregationSpec::as_clauses) {
            body.insert("aggs".to_string(), JsonValue::Object(clauses.clone()));
        }
        body.insert("highlight".to_string(), highlight_directive());

        JsonValue::Object(body)
    }
}

/// Body for an aggregation-only request: no hits, just buckets.
pub fn aggregation_body(query: &JsonValue, aggs: &AggregationSpec) -> JsonValue {
    let mut body = Map::new();
    body.insert("size".to_string(), json!(0));
    body.insert("query".to_string(), query.clone());
    if let Some(clauses) = aggs.as_clauses() {
        body.insert("aggs".to_string(), JsonValue::Object(clauses.clone()));
    }
    JsonValue::Object(body)
}
