//! Search client gateway
//!
//! A connection to the backend lives for exactly one logical operation. The
//! operation acquires it through [`Gateway::acquire`] and holds the returned
//! [`Lease`]; dropping the lease releases the connection. That covers normal
//! return, `?` early return, unwinding and cancellation of the owning future
//! alike, and a lease can only be dropped once.

use crate::error::Result;
use crate::models::IndexConfig;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Visibility of a write to subsequent searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Refresh the index before returning; the write is searchable at once
    Immediate,
    /// Leave visibility to the index's refresh interval
    Eventual,
}

/// One live connection to the backend, bound to a single index target
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a search request body and return the raw response.
    async fn search(&self, body: &JsonValue) -> Result<JsonValue>;

    /// Create or overwrite the document stored under `id`.
    async fn index(&self, id: &str, document: &JsonValue, refresh: Refresh) -> Result<()>;

    /// Remove the document stored under `id`.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Release the connection's resources. Called once, by the owning lease.
    fn close(&mut self);
}

/// Opens connections to a backend
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &IndexConfig) -> Result<Box<dyn Connection>>;
}

/// Exclusive ownership of one connection for one operation
pub struct Lease {
    connection: Option<Box<dyn Connection>>,
    operation: &'static str,
}

impl Lease {
    fn new(connection: Box<dyn Connection>, operation: &'static str) -> Self {
        Self {
            connection: Some(connection),
            operation,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Deref for Lease {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the connection out
        match &self.connection {
            Some(connection) => connection.as_ref(),
            None => unreachable!("lease used after release"),
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            tracing::debug!(operation = self.operation, "Released backend connection");
        }
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("operation", &self.operation)
            .field("released", &self.connection.is_none())
            .finish()
    }
}

/// Hands out per-operation connection leases
#[derive(Clone)]
pub struct Gateway {
    connector: Arc<dyn Connector>,
}

impl Gateway {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Open a connection for `operation` against `config`.
    ///
    /// When connecting fails there is nothing to release.
    pub async fn acquire(&self, config: &IndexConfig, operation: &'static str) -> Result<Lease> {
        let connection = self.connector.connect(config).await?;
        tracing::debug!(
            operation,
            index = %config.index,
            "Acquired backend connection"
        );
        Ok(Lease::new(connection, operation))
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    struct CountingConnection {
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl Connection for CountingConnection {
        async fn search(&self, _body: &JsonValue) -> Result<JsonValue> {
            Err(Error::BackendQuery("boom".to_string()))
        }

        async fn index(&self, _id: &str, _document: &JsonValue, _refresh: Refresh) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingConnector {
        counters: Arc<Counters>,
        refuse: bool,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(&self, _config: &IndexConfig) -> Result<Box<dyn Connection>> {
            if self.refuse {
                return Err(Error::BackendConnection("refused".to_string()));
            }
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingConnection {
                counters: self.counters.clone(),
            }))
        }
    }

    fn gateway(refuse: bool) -> (Gateway, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let connector = CountingConnector {
            counters: counters.clone(),
            refuse,
        };
        (Gateway::new(Arc::new(connector)), counters)
    }

    fn config() -> IndexConfig {
        IndexConfig::new("http://localhost:9200", "applicants", "applicant")
    }

    #[tokio::test]
    async fn test_lease_released_on_success() {
        let (gateway, counters) = gateway(false);
        {
            let lease = gateway.acquire(&config(), "index").await.unwrap();
            lease.index("1", &serde_json::json!({}), Refresh::Immediate).await.unwrap();
            assert_eq!(counters.closed.load(Ordering::SeqCst), 0);
        }
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lease_released_on_error_path() {
        let (gateway, counters) = gateway(false);

        async fn failing(gateway: &Gateway) -> Result<JsonValue> {
            let lease = gateway.acquire(&config(), "search").await?;
            let resp = lease.search(&serde_json::json!({})).await?;
            Ok(resp)
        }

        assert!(failing(&gateway).await.is_err());
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_releases_nothing() {
        let (gateway, counters) = gateway(true);
        let err = gateway.acquire(&config(), "search").await.unwrap_err();

        assert!(matches!(err, Error::BackendConnection(_)));
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 0);
    }
}
