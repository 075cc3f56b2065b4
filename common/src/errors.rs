// Error handling for the data-access layer and the resource handlers

use std::time::Duration;
use thiserror::Error;

/// Store access errors raised by the gateway
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataAccessError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("No live store connection held by this gateway")]
    NotConnected,

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Request payload validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Errors surfaced by resource handler operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}
