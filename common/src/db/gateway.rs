// Request-scoped data-access gateway
//
// A gateway owns at most one store connection for the lifetime of a single
// request. It is not `Clone`, and `execute` and `release` take
// `&mut self`, so no other request can observe or close its connection.

use crate::db::store::{QueryOutcome, SqlParam, StoreConnection, StoreConnector};
use crate::errors::DataAccessError;
use crate::telemetry;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Lifecycle phase of a gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPhase {
    Unconnected,
    Connected,
    Closed,
}

enum Connection {
    Unconnected,
    Connected(Box<dyn StoreConnection>),
    Closed,
}

impl Connection {
    fn phase(&self) -> GatewayPhase {
        match self {
            Connection::Unconnected => GatewayPhase::Unconnected,
            Connection::Connected(_) => GatewayPhase::Connected,
            Connection::Closed => GatewayPhase::Closed,
        }
    }
}

/// Hands out a fresh gateway per request
///
/// Holds only the immutable connector and timeout, so it can live in shared
/// application state.
#[derive(Clone)]
pub struct GatewayFactory {
    connector: Arc<dyn StoreConnector>,
    query_timeout: Duration,
}

impl GatewayFactory {
    pub fn new(connector: Arc<dyn StoreConnector>, query_timeout: Duration) -> Self {
        Self {
            connector,
            query_timeout,
        }
    }

    /// A new, unconnected gateway
    pub fn open(&self) -> Gateway {
        Gateway::new(self.connector.clone(), self.query_timeout)
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Round trip to the store on a throwaway gateway
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), DataAccessError> {
        self.open()
            .scoped(|gw| Box::pin(async move { gw.execute(PING, Vec::new()).await }))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Store health check failed");
                e
            })?;

        debug!("Store health check passed");
        Ok(())
    }
}

/// Statement used by health checks
pub const PING: &str = "SELECT 1";

impl fmt::Debug for GatewayFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayFactory")
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

/// One request's handle on the store
pub struct Gateway {
    connector: Arc<dyn StoreConnector>,
    connection: Connection,
    scope_id: Uuid,
    query_timeout: Duration,
}

impl Gateway {
    pub fn new(connector: Arc<dyn StoreConnector>, query_timeout: Duration) -> Self {
        Self {
            connector,
            connection: Connection::Unconnected,
            scope_id: Uuid::new_v4(),
            query_timeout,
        }
    }

    /// Identifier attached to every log line of this gateway
    pub fn scope_id(&self) -> Uuid {
        self.scope_id
    }

    pub fn phase(&self) -> GatewayPhase {
        self.connection.phase()
    }

    /// Open the connection
    ///
    /// A failed attempt leaves the gateway unconnected. Acquiring while
    /// already connected is a no-op; acquiring after release is refused.
    #[instrument(skip(self), fields(scope_id = %self.scope_id))]
    pub async fn acquire(&mut self) -> Result<(), DataAccessError> {
        match self.connection.phase() {
            GatewayPhase::Connected => {
                debug!("Connection already held");
                Ok(())
            }
            GatewayPhase::Closed => {
                warn!("Acquire attempted on a released gateway");
                Err(DataAccessError::NotConnected)
            }
            GatewayPhase::Unconnected => {
                let conn = self.connector.connect().await.map_err(|e| {
                    telemetry::record_connection_failure();
                    tracing::error!(error = %e, "Failed to open store connection");
                    e
                })?;
                telemetry::record_connection_opened();
                self.connection = Connection::Connected(conn);
                debug!("Store connection opened");
                Ok(())
            }
        }
    }

    /// Run one parameterized statement on the held connection
    ///
    /// Each statement is bounded by the gateway's query timeout.
    #[instrument(skip(self, params), fields(scope_id = %self.scope_id))]
    pub async fn execute(
        &mut self,
        statement: &str,
        params: Vec<SqlParam>,
    ) -> Result<QueryOutcome, DataAccessError> {
        let phase = self.connection.phase();
        let Connection::Connected(conn) = &mut self.connection else {
            warn!(?phase, "Execute attempted without a live connection");
            return Err(DataAccessError::NotConnected);
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(self.query_timeout, conn.query(statement, params))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DataAccessError::Timeout(self.query_timeout)),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(DataAccessError::Timeout(_)) => "timeout",
            Err(_) => "error",
        };
        telemetry::record_query(outcome, started.elapsed());
        debug!(outcome, elapsed_ms = started.elapsed().as_millis() as u64, "Statement finished");

        result
    }

    /// Close the held connection
    ///
    /// Idempotent: without a live connection this does nothing. A close
    /// error is logged; the handle is dropped either way.
    #[instrument(skip(self), fields(scope_id = %self.scope_id))]
    pub async fn release(&mut self) {
        match std::mem::replace(&mut self.connection, Connection::Closed) {
            Connection::Connected(mut conn) => {
                if let Err(e) = conn.close().await {
                    warn!(error = %e, "Store connection did not close cleanly");
                }
                telemetry::record_connection_closed("released");
                debug!("Store connection released");
            }
            other => self.connection = other,
        }
    }

    /// Acquire, run `body`, release
    ///
    /// The connection is released on every exit path of `body`, including
    /// errors and statement timeouts, before the body's result is returned.
    pub async fn scoped<T, F>(mut self, body: F) -> Result<T, DataAccessError>
    where
        F: for<'g> FnOnce(&'g mut Gateway) -> BoxFuture<'g, Result<T, DataAccessError>>,
    {
        self.acquire().await?;
        let result = body(&mut self).await;
        self.release().await;
        result
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        if let Connection::Connected(_) = self.connection {
            // The boxed connection closes its socket when dropped
            warn!(scope_id = %self.scope_id, "Gateway dropped while holding a connection");
            telemetry::record_connection_closed("dropped");
        }
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("scope_id", &self.scope_id)
            .field("phase", &self.phase())
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}
