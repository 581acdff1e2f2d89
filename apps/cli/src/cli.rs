//! Command-line interface definition and dispatch

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use quarry_search::{
    AggregationSpec, DeleteParams, IndexConfig, MutationParams, QueryParams, SearchService,
    SortOrder,
};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

const MATCH_ALL: &str = r#"{"match_all":{}}"#;

#[derive(Debug, Parser)]
#[command(name = "quarry", version, about = "Query and maintain a search index")]
pub struct Cli {
    /// Configuration file (defaults to ./quarry.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides configuration
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Index name, overrides configuration
    #[arg(long, global = true)]
    pub index: Option<String>,

    /// Document type, overrides configuration
    #[arg(long = "doc-type", global = true)]
    pub doc_type: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search with highlighting; prints {rows, size[, aggs]}
    Search {
        /// Query clause as JSON, or @path to a JSON file
        #[arg(long, default_value = MATCH_ALL)]
        query: String,
        /// Named aggregation definitions as JSON, or @path
        #[arg(long)]
        aggs: Option<String>,
        #[arg(long)]
        from: Option<u64>,
        #[arg(long)]
        size: Option<u64>,
        /// Field to sort by
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long)]
        order: Option<SortOrder>,
    },
    /// Autocomplete the last word of a phrase
    Suggest {
        term: String,
        #[arg(long, default_value = "additionalInfo.resume")]
        field: String,
    },
    /// Print the bucket lists of an aggregation-only query
    Aggregate {
        #[arg(long)]
        aggs: String,
        #[arg(long, default_value = MATCH_ALL)]
        query: String,
    },
    /// Create or overwrite a document {id, type}
    Index {
        id: String,
        #[arg(long = "type")]
        kind: String,
    },
    /// Create or overwrite an uploaded document
    IndexUpload {
        id: String,
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        name: Option<String>,
        /// Document content, or @path to read it from a file
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        processed: Option<bool>,
    },
    /// Delete a document by id
    Delete { id: String },
}

impl Cli {
    /// Apply command-line overrides on top of the configured target.
    pub fn target(&self, configured: IndexConfig) -> IndexConfig {
        IndexConfig {
            url: self.url.clone().unwrap_or(configured.url),
            index: self.index.clone().unwrap_or(configured.index),
            doc_type: self.doc_type.clone().unwrap_or(configured.doc_type),
        }
    }
}

/// Run `command`; returns the JSON to print, if any.
pub async fn execute(
    service: &SearchService,
    target: &IndexConfig,
    command: Command,
) -> anyhow::Result<Option<JsonValue>> {
    match command {
        Command::Search {
            query,
            aggs,
            from,
            size,
            sort,
            order,
        } => {
            let query = parse_json(&query).context("Invalid --query")?;
            let aggs = aggs
                .map(|raw| {
                    parse_json(&raw)
                        .and_then(|value| Ok(AggregationSpec::clauses(value)?))
                        .context("Invalid --aggs")
                })
                .transpose()?;
            let params = QueryParams {
                from,
                size,
                sort,
                order,
            };

            let envelope = service
                .search(target, &params, &query, aggs.as_ref())
                .await?;
            Ok(Some(envelope.to_json()))
        }
        Command::Suggest { term, field } => {
            let envelope = service.suggest(target, &term, &field).await?;
            Ok(Some(envelope.to_json()))
        }
        Command::Aggregate { aggs, query } => {
            let query = parse_json(&query).context("Invalid --query")?;
            let aggs = AggregationSpec::clauses(parse_json(&aggs).context("Invalid --aggs")?)?;

            let envelope = service.aggregate(target, &query, &aggs).await?;
            Ok(Some(envelope.to_json()))
        }
        Command::Index { id, kind } => {
            service.index(target, &MutationParams::new(id, kind)).await?;
            Ok(None)
        }
        Command::IndexUpload {
            id,
            kind,
            name,
            content,
            processed,
        } => {
            let content = content.map(|raw| read_argument(&raw)).transpose()?;
            let params = MutationParams {
                id,
                kind,
                name,
                content,
                processed,
            };
            service.index_upload(target, &params).await?;
            Ok(None)
        }
        Command::Delete { id } => {
            service.delete(target, &DeleteParams::new(id)).await?;
            Ok(None)
        }
    }
}

/// Argument text, or the contents of the file named after a leading `@`.
fn read_argument(raw: &str) -> anyhow::Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
        }
        None => Ok(raw.to_string()),
    }
}

fn parse_json(raw: &str) -> anyhow::Result<JsonValue> {
    let text = read_argument(raw)?;
    Ok(serde_json::from_str(&text)?)
}
