use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::handlers::{ApiError, CATEGORIES_LOAD_ERROR, INTERNAL_ERROR};
use crate::state::AppState;
use livraria_common::models::{Category, CategoryChanges, CategoryDraft};

pub const CREATED_MESSAGE: &str = "Categoria cadastrada com sucesso!";
pub const UPDATED_MESSAGE: &str = "Categoria atualizada com sucesso!";
pub const DELETED_MESSAGE: &str = "Categoria excluída com sucesso!";

#[tracing::instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state
        .categories()
        .list()
        .await
        .map_err(|e| ApiError::from_resource(e, CATEGORIES_LOAD_ERROR))?;

    Ok(Json(categories))
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CategoryDraft>, JsonRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let Json(draft) = payload?;

    state
        .categories()
        .create(draft)
        .await
        .map_err(|e| ApiError::from_resource(e, INTERNAL_ERROR))?;

    Ok((StatusCode::CREATED, CREATED_MESSAGE))
}

/// Rename a category
#[tracing::instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<CategoryChanges>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(changes) = payload?;

    state
        .categories()
        .update(id, changes)
        .await
        .map_err(|e| ApiError::from_resource(e, INTERNAL_ERROR))?;

    Ok(UPDATED_MESSAGE)
}

#[tracing::instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<&'static str, ApiError> {
    state
        .categories()
        .delete(id)
        .await
        .map_err(|e| ApiError::from_resource(e, INTERNAL_ERROR))?;

    Ok(DELETED_MESSAGE)
}
