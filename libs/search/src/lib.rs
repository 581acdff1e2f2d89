//! Quarry search layer
//!
//! Turns simple request parameters into structured queries for an
//! Elasticsearch-compatible backend and normalizes the backend's answers into
//! a few stable response envelopes.
//!
//! # Examples
//!
//! ## Search with highlighting
//!
//! ```rust,no_run
//! use quarry_search::{IndexConfig, QueryParams, SearchService};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = SearchService::http();
//! let config = IndexConfig::new("http://localhost:9200", "applicants", "applicant");
//! let params = QueryParams { size: Some(20), ..Default::default() };
//!
//! let envelope = service
//!     .search(&config, &params, &json!({"match": {"skills": "rust"}}), None)
//!     .await?;
//! println!("{}", envelope.to_json());
//! # Ok(())
//! # }
//! ```
//!
//! ## Autocomplete
//!
//! ```rust,no_run
//! use quarry_search::{IndexConfig, SearchService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = SearchService::http();
//! let config = IndexConfig::new("http://localhost:9200", "applicants", "applicant");
//! let suggestions = service.suggest(&config, "data scien", "skills").await?;
//! # Ok(())
//! # }
//! ```
//!
pub mod aggregations;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod http;
pub mod models;
pub mod normalize;
pub mod query;
pub mod service;
pub mod suggest;

pub use envelope::{Acknowledged, ResponseEnvelope};
pub use error::{Error, ErrorReport, Result};
pub use gateway::{Connection, Connector, Gateway, Lease, Refresh};
pub use http::HttpConnector;
pub use models::{
    AggregationSpec, DeleteParams, IndexConfig, MutationParams, QueryParams, SearchHit,
    SearchResponse, SortOrder,
};
pub use service::{SearchResults, SearchService};
pub use suggest::Suggestion;
