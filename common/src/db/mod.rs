// Database layer: request-scoped gateway, store connectors, repositories

pub mod gateway;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod mysql;
pub mod repositories;
pub mod store;

pub use gateway::{Gateway, GatewayFactory, GatewayPhase};
pub use mysql::MySqlConnector;
pub use store::{QueryOutcome, Row, SqlParam, StoreConnection, StoreConnector};
