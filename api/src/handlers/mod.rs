pub mod books;
pub mod categories;
pub mod health;
pub mod metrics;

// Common response types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use livraria_common::errors::ResourceError;

/// Body returned for any missing required field
pub const MISSING_FIELDS_MESSAGE: &str = "Todos os campos são obrigatórios.";

/// Generic 500 bodies; the diagnostic only goes to the log
pub const SERVER_ERROR: &str = "Server ERROR";
pub const INTERNAL_ERROR: &str = "Erro interno do servidor.";
pub const CATEGORIES_LOAD_ERROR: &str = "Erro ao carregar categorias";

/// Error response of the catalogue endpoints, rendered as plain text
#[derive(Debug)]
pub enum ApiError {
    /// A required field is absent or falsy
    MissingFields,
    /// The body could not be parsed
    BadRequest(String),
    /// Any store failure, with the message shown to the client
    Internal(&'static str),
}

impl ApiError {
    /// Convert a handler failure, logging store diagnostics
    pub fn from_resource(err: ResourceError, public_message: &'static str) -> Self {
        match err {
            ResourceError::Validation(e) => {
                tracing::debug!(error = %e, "Rejected payload");
                ApiError::MissingFields
            }
            ResourceError::DataAccess(e) => {
                tracing::error!(error = %e, "Store operation failed");
                ApiError::Internal(public_message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Malformed JSON body");
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingFields => {
                (StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE).into_response()
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}
