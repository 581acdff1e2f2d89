//! Aggregation extractor
//!
//! Flattens named aggregation results into a list of bucket lists. Ordering
//! is whatever the backend returned, for names and for buckets; nothing is
//! re-sorted here.

use crate::models::{AggregationSpec, SearchResponse};
use serde_json::Value as JsonValue;

/// Bucket lists of every named aggregation, in backend order.
///
/// An aggregation without a `buckets` member (a metric aggregation, say)
/// contributes `null` so positions still line up with the names.
pub fn aggregation_listing(response: &SearchResponse) -> Vec<JsonValue> {
    response
        .aggregations
        .as_ref()
        .map(|aggregations| {
            aggregations
                .values()
                .map(|result| result.get("buckets").cloned().unwrap_or(JsonValue::Null))
                .collect()
        })
        .unwrap_or_default()
}

/// Bucket lists for a search that carried `spec`.
///
/// `Bypass` (and no spec at all) skips extraction and yields an empty list.
pub fn extract_buckets(response: &SearchResponse, spec: Option<&AggregationSpec>) -> Vec<JsonValue> {
    match spec {
        Some(AggregationSpec::Clauses(_)) => aggregation_listing(response),
        Some(AggregationSpec::Bypass) | None => Vec::new(),
    }
}
