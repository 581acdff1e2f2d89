//! Response envelopes
//!
//! Callers get one of three JSON shapes. Which one is decided by what they
//! asked for, not by a format switch: aggregations win over a count, a count
//! wins over the bare row list.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Final payload of a read operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// `{rows, size, aggs}`
    WithAggregations {
        rows: Vec<JsonValue>,
        size: u64,
        aggs: Vec<JsonValue>,
    },
    /// `{rows, size}`
    Counted { rows: Vec<JsonValue>, size: u64 },
    /// `[...]`
    Rows(Vec<JsonValue>),
}

impl ResponseEnvelope {
    /// Pick the envelope variant for what the caller asked for.
    ///
    /// Aggregations without a count report a size of 0.
    pub fn render(rows: Vec<JsonValue>, count: Option<u64>, aggs: Option<Vec<JsonValue>>) -> Self {
        match (aggs, count) {
            (Some(aggs), count) => ResponseEnvelope::WithAggregations {
                rows,
                size: count.unwrap_or(0),
                aggs,
            },
            (None, Some(size)) => ResponseEnvelope::Counted { rows, size },
            (None, None) => ResponseEnvelope::Rows(rows),
        }
    }

    pub fn rows(&self) -> &[JsonValue] {
        match self {
            ResponseEnvelope::WithAggregations { rows, .. }
            | ResponseEnvelope::Counted { rows, .. }
            | ResponseEnvelope::Rows(rows) => rows,
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            ResponseEnvelope::WithAggregations { size, .. }
            | ResponseEnvelope::Counted { size, .. } => Some(*size),
            ResponseEnvelope::Rows(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Status-only success of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Acknowledged;

impl IntoResponse for Acknowledged {
    fn into_response(self) -> Response {
        StatusCode::OK.into_response()
    }
}
