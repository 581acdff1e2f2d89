//! Search service - entry points for collaborators
//!
//! Each operation:
//! - builds its request body
//! - acquires its own connection lease
//! - executes against the backend
//! - transforms the raw response and renders the envelope
//!
//! Failures are reported (logged with the operation and index) at this
//! boundary and returned as [`Error`]; no partial envelope escapes.

use crate::{
    aggregations::extract_buckets,
    envelope::{Acknowledged, ResponseEnvelope},
    error::{Error, Result},
    gateway::{Connector, Gateway, Refresh},
    http::HttpConnector,
    models::{AggregationSpec, DeleteParams, IndexConfig, MutationParams, QueryParams, SearchResponse},
    normalize::normalize_hits,
    query::{aggregation_body, SearchRequest},
    suggest::Suggestion,
};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Normalized search output before it is put into an envelope
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    /// Source documents with highlights merged, in backend order
    pub rows: Vec<JsonValue>,
    /// Total number of matching documents
    pub total: u64,
    /// One bucket list per named aggregation (empty unless clauses were sent)
    pub aggregations: Vec<JsonValue>,
}

impl SearchResults {
    /// `{rows, size, aggs}` when `with_aggregations`, `{rows, size}` otherwise.
    pub fn into_envelope(self, with_aggregations: bool) -> ResponseEnvelope {
        let aggs = with_aggregations.then_some(self.aggregations);
        ResponseEnvelope::render(self.rows, Some(self.total), aggs)
    }
}

/// Stateless front door to the search backend. Cheap to clone and safe to
/// share; every call owns its own connection.
#[derive(Debug, Clone)]
pub struct SearchService {
    gateway: Gateway,
    timeout: Option<Duration>,
}

impl SearchService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            gateway: Gateway::new(connector),
            timeout: None,
        }
    }

    /// Service talking HTTP with the default client timeout.
    pub fn http() -> Self {
        Self::new(Arc::new(HttpConnector::new()))
    }

    /// Fail any operation that takes longer than `timeout` with
    /// [`Error::BackendTimeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Search and render `{rows, size}` or, when aggregation clauses were
    /// given, `{rows, size, aggs}`.
    pub async fn search(
        &self,
        config: &IndexConfig,
        params: &QueryParams,
        query: &JsonValue,
        aggs: Option<&AggregationSpec>,
    ) -> Result<ResponseEnvelope> {
        let with_aggregations = matches!(aggs, Some(AggregationSpec::Clauses(_)));
        let results = self.search_results(config, params, query, aggs).await?;
        Ok(results.into_envelope(with_aggregations))
    }

    /// Search without rendering, for callers that post-process results
    /// themselves (typically together with [`AggregationSpec::Bypass`]).
    pub async fn search_results(
        &self,
        config: &IndexConfig,
        params: &QueryParams,
        query: &JsonValue,
        aggs: Option<&AggregationSpec>,
    ) -> Result<SearchResults> {
        self.run(
            "search",
            config,
            self.execute_search(config, params, query, aggs),
        )
        .await
    }

    /// Autocomplete the last word of `term` over `field`. Bare list of
    /// suggestion strings, most frequent first.
    pub async fn suggest(
        &self,
        config: &IndexConfig,
        term: &str,
        field: &str,
    ) -> Result<ResponseEnvelope> {
        let Some(suggestion) = Suggestion::parse(term, field) else {
            return Ok(ResponseEnvelope::render(Vec::new(), None, None));
        };

        self.run("suggest", config, self.execute_suggest(config, &suggestion))
            .await
    }

    /// Run an aggregation-only query. Bare list with one bucket list per
    /// named aggregation.
    pub async fn aggregate(
        &self,
        config: &IndexConfig,
        query: &JsonValue,
        aggs: &AggregationSpec,
    ) -> Result<ResponseEnvelope> {
        self.run("aggregate", config, self.execute_aggregate(config, query, aggs))
            .await
    }

    /// Create or overwrite the document `{id, type}`; searchable on return.
    pub async fn index(
        &self,
        config: &IndexConfig,
        params: &MutationParams,
    ) -> Result<Acknowledged> {
        self.run(
            "index",
            config,
            self.execute_index(config, "index", &params.id, params.document()),
        )
        .await
    }

    /// Create or overwrite an uploaded document
    /// `{id, type, name, content, processed}`; searchable on return.
    pub async fn index_upload(
        &self,
        config: &IndexConfig,
        params: &MutationParams,
    ) -> Result<Acknowledged> {
        self.run(
            "index_upload",
            config,
            self.execute_index(config, "index_upload", &params.id, params.upload_document()),
        )
        .await
    }

    /// Delete the document stored under `params.id`. A missing document is
    /// a [`Error::MutationConflict`].
    pub async fn delete(
        &self,
        config: &IndexConfig,
        params: &DeleteParams,
    ) -> Result<Acknowledged> {
        self.run("delete", config, self.execute_delete(config, &params.id))
            .await
    }

    async fn execute_search(
        &self,
        config: &IndexConfig,
        params: &QueryParams,
        query: &JsonValue,
        aggs: Option<&AggregationSpec>,
    ) -> Result<SearchResults> {
        let body = SearchRequest::new(params, query, aggs).into_body();

        let lease = self.gateway.acquire(config, "search").await?;
        let raw = lease.search(&body).await?;
        drop(lease);

        let response = SearchResponse::from_value(raw)?;
        let total = response.total();
        let aggregations = extract_buckets(&response, aggs);
        let rows = normalize_hits(response.hits.hits);

        tracing::debug!(rows = rows.len(), total, "Search completed");
        Ok(SearchResults {
            rows,
            total,
            aggregations,
        })
    }

    async fn execute_suggest(
        &self,
        config: &IndexConfig,
        suggestion: &Suggestion,
    ) -> Result<ResponseEnvelope> {
        let lease = self.gateway.acquire(config, "suggest").await?;
        let raw = lease.search(&suggestion.body()).await?;
        drop(lease);

        let response = SearchResponse::from_value(raw)?;
        let rows = suggestion
            .complete(&response)
            .into_iter()
            .map(JsonValue::String)
            .collect();
        Ok(ResponseEnvelope::render(rows, None, None))
    }

    async fn execute_aggregate(
        &self,
        config: &IndexConfig,
        query: &JsonValue,
        aggs: &AggregationSpec,
    ) -> Result<ResponseEnvelope> {
        let body = aggregation_body(query, aggs);

        let lease = self.gateway.acquire(config, "aggregate").await?;
        let raw = lease.search(&body).await?;
        drop(lease);

        let response = SearchResponse::from_value(raw)?;
        let rows = extract_buckets(&response, Some(aggs));
        Ok(ResponseEnvelope::render(rows, None, None))
    }

    async fn execute_index(
        &self,
        config: &IndexConfig,
        operation: &'static str,
        id: &str,
        document: JsonValue,
    ) -> Result<Acknowledged> {
        require_id(id)?;
        let lease = self.gateway.acquire(config, operation).await?;
        lease.index(id, &document, Refresh::Immediate).await?;
        tracing::debug!(operation = lease.operation(), id, "Document stored");
        Ok(Acknowledged)
    }

    async fn execute_delete(&self, config: &IndexConfig, id: &str) -> Result<Acknowledged> {
        require_id(id)?;
        let lease = self.gateway.acquire(config, "delete").await?;
        lease.delete(id).await?;
        tracing::debug!(operation = lease.operation(), id, "Document deleted");
        Ok(Acknowledged)
    }

    /// Apply the caller-level timeout and report failures.
    async fn run<T, F>(&self, operation: &'static str, config: &IndexConfig, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(Error::BackendTimeout(format!(
                    "{} did not complete within {}ms",
                    operation,
                    limit.as_millis()
                ))),
            },
            None => fut.await,
        };

        if let Err(e) = &result {
            tracing::error!(
                operation,
                index = %config.index,
                kind = e.kind(),
                error = %e,
                "Backend operation failed"
            );
        }

        result
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidRequest(
            "Document id must not be empty".to_string(),
        ));
    }
    Ok(())
}
