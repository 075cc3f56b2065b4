use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::handlers::{ApiError, INTERNAL_ERROR, SERVER_ERROR};
use crate::state::AppState;
use livraria_common::models::{Book, BookChanges, BookDraft, WriteReceipt};

pub const CREATED_MESSAGE: &str = "Livro cadastrado com sucesso!";
pub const UPDATED_MESSAGE: &str = "Livro atualizado com sucesso!";
pub const DELETED_MESSAGE: &str = "Livro excluído com sucesso!";

/// Confirmation body for a created book
#[derive(Debug, Serialize)]
pub struct BookCreatedResponse {
    pub message: &'static str,
    pub result: WriteReceipt,
}

/// List every book
#[tracing::instrument(skip(state))]
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state
        .books()
        .list()
        .await
        .map_err(|e| ApiError::from_resource(e, SERVER_ERROR))?;

    Ok(Json(books))
}

/// Fetch one book; a missing id answers 200 with an empty body
#[tracing::instrument(skip(state))]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let book = state
        .books()
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_resource(e, SERVER_ERROR))?;

    Ok(match book {
        Some(book) => Json(book).into_response(),
        None => {
            tracing::debug!(book_id = id, "Book not found");
            StatusCode::OK.into_response()
        }
    })
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<BookDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<BookCreatedResponse>), ApiError> {
    let Json(draft) = payload?;

    let receipt = state
        .books()
        .create(draft)
        .await
        .map_err(|e| ApiError::from_resource(e, INTERNAL_ERROR))?;

    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            message: CREATED_MESSAGE,
            result: receipt,
        }),
    ))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<BookChanges>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(changes) = payload?;

    state
        .books()
        .update(id, changes)
        .await
        .map_err(|e| ApiError::from_resource(e, INTERNAL_ERROR))?;

    Ok(UPDATED_MESSAGE)
}

#[tracing::instrument(skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<&'static str, ApiError> {
    state
        .books()
        .delete(id)
        .await
        .map_err(|e| ApiError::from_resource(e, INTERNAL_ERROR))?;

    Ok(DELETED_MESSAGE)
}
