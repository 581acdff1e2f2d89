//! Request and response models
//!
//! Everything here is transient: built per call by the collaborator (or
//! decoded from the backend), consumed once, then dropped.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Identifies which backend, index and document type a call targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Base URL of the backend, e.g. `http://localhost:9200`
    pub url: String,
    pub index: String,
    /// Document type segment; empty for typeless indices.
    #[serde(default)]
    pub doc_type: String,
}

impl IndexConfig {
    pub fn new(url: impl Into<String>, index: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index: index.into(),
            doc_type: doc_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidRequest(format!(
                "Invalid sort order '{}': expected 'asc' or 'desc'",
                other
            ))),
        }
    }
}

/// Pagination and sort directives. Absent fields mean "backend default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Field to sort by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl QueryParams {
    /// Build params from raw request query items (`from`, `size`, `sort`, `order`).
    ///
    /// Unknown keys are ignored; empty values count as absent. When a key is
    /// repeated the last occurrence wins.
    pub fn from_items(items: &[(String, String)]) -> Result<Self> {
        let mut params = QueryParams::default();

        for (key, value) in items {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "from" => params.from = Some(parse_count("from", value)?),
                "size" => params.size = Some(parse_count("size", value)?),
                "sort" => params.sort = Some(value.to_string()),
                "order" => params.order = Some(value.parse()?),
                _ => {}
            }
        }

        Ok(params)
    }
}

fn parse_count(name: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        Error::InvalidRequest(format!(
            "Invalid '{}' parameter '{}': expected a non-negative integer",
            name, value
        ))
    })
}

/// Aggregation clause of a request, decided by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationSpec {
    /// Named aggregation definitions sent verbatim to the backend
    Clauses(Map<String, JsonValue>),
    /// No aggregation clause and no bucket extraction; the caller
    /// post-processes the raw results itself.
    Bypass,
}

impl AggregationSpec {
    /// Wrap a JSON object of named aggregation definitions.
    pub fn clauses(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(AggregationSpec::Clauses(map)),
            other => Err(Error::InvalidRequest(format!(
                "Aggregations must be an object of named definitions, got: {}",
                other
            ))),
        }
    }

    /// The clause to send, if any.
    pub fn as_clauses(&self) -> Option<&Map<String, JsonValue>> {
        match self {
            AggregationSpec::Clauses(map) => Some(map),
            AggregationSpec::Bypass => None,
        }
    }
}

/// Fields persisted into an index document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationParams {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<bool>,
}

impl MutationParams {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Stored fields of a plain index call: identity and type only.
    pub fn document(&self) -> JsonValue {
        serde_json::json!({
            "id": self.id,
            "type": self.kind,
        })
    }

    /// Stored fields of an upload index call.
    pub fn upload_document(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| self.document())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    pub id: String,
}

impl DeleteParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Highlighted fragments keyed by dotted field path
pub type HighlightMap = BTreeMap<String, Vec<String>>;

/// Raw search response as returned by the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: SearchHits,
    /// Named aggregation results, in backend order
    #[serde(default)]
    pub aggregations: Option<Map<String, JsonValue>>,
}

impl SearchResponse {
    pub fn from_value(value: JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Total number of matching documents (0 when the backend omits it).
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map(HitsTotal::value).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub total: Option<HitsTotal>,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// Legacy engines report a bare count, current ones an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HitsTotal {
    Count(u64),
    Detailed {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl HitsTotal {
    pub fn value(&self) -> u64 {
        match self {
            HitsTotal::Count(n) => *n,
            HitsTotal::Detailed { value, .. } => *value,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    #[serde(rename = "_score", default)]
    pub score: Option<f64>,

    #[serde(rename = "_source", default)]
    pub source: Option<JsonValue>,

    #[serde(default)]
    pub highlight: Option<HighlightMap>,
}
