use crate::error::AppError;
use crate::handlers::SearchQuery;
use crate::models::{Item, ItemPayload, ItemWithStock, SetActivePayload};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemWithStock>>, AppError> {
    let items = state.db.list_items().await?;
    Ok(Json(items))
}

/// Autocomplete search. Archived items never appear here.
pub async fn search_items(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let items = state.db.search_items(&query.q).await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let item = state.db.create_item(&payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state.db.update_item(id, &payload).await?;
    Ok(Json(json!({ "message": "Item updated" })))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_item(id).await?;
    Ok(Json(json!({ "message": "Item deleted" })))
}

pub async fn set_item_active(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SetActivePayload>,
) -> Result<impl IntoResponse, AppError> {
    state.db.set_item_active(id, payload.active).await?;
    Ok(Json(json!({ "message": "Item status updated" })))
}
