use crate::error::AppError;
use crate::models::{InventoryPool, PoolPayload};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

pub async fn list_pools(
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryPool>>, AppError> {
    let pools = state.db.list_pools().await?;
    Ok(Json(pools))
}

pub async fn create_pool(
    State(state): State<AppState>,
    Json(payload): Json<PoolPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let pool = state.db.create_pool(&payload).await?;
    Ok((StatusCode::CREATED, Json(pool)))
}

pub async fn update_pool(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PoolPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state.db.update_pool(id, &payload).await?;
    Ok(Json(json!({ "message": "Inventory pool updated" })))
}

pub async fn delete_pool(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_pool(id).await?;
    Ok(Json(json!({ "message": "Inventory pool deleted" })))
}
