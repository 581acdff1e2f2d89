//! Error types for the search layer
//!
//! Every backend failure ends up here. Internally the variants keep the
//! failure class apart (connection, query, timeout, conflict); across the
//! caller boundary they all collapse into one generic server error that
//! carries the message text.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Search layer errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Backend connection error: {0}")]
    BackendConnection(String),

    #[error("Backend query error: {0}")]
    BackendQuery(String),

    #[error("Backend timeout: {0}")]
    BackendTimeout(String),

    #[error("Mutation conflict on document {id}: {reason}")]
    MutationConflict { id: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Short, stable name of the failure class (used as a log field).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BackendConnection(_) => "backend_connection",
            Error::BackendQuery(_) => "backend_query",
            Error::BackendTimeout(_) => "backend_timeout",
            Error::MutationConflict { .. } => "mutation_conflict",
            Error::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Status reported to callers. Every failure is a generic server error;
    /// the message is the only thing that tells them apart.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Caller-facing rendition of this error.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            status: self.status().as_u16(),
            message: self.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::BackendTimeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Error::BackendConnection(err.to_string())
        } else if err.is_decode() {
            Error::BackendQuery(format!("Undecodable backend response: {}", err))
        } else {
            Error::BackendConnection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::BackendQuery(format!("Malformed backend response: {}", err))
    }
}

/// What a caller sees when an operation fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let report = self.report();
        let status =
            StatusCode::from_u16(report.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, report.message).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}
