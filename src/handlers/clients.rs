use crate::error::AppError;
use crate::handlers::SearchQuery;
use crate::models::{Client, ClientPayload};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

pub async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<Client>>, AppError> {
    let clients = state.db.list_clients().await?;
    Ok(Json(clients))
}

pub async fn search_clients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    let clients = state.db.search_clients(&query.q).await?;
    Ok(Json(clients))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let client = state.db.create_client(&payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state.db.update_client(id, &payload).await?;
    Ok(Json(json!({ "message": "Client updated" })))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_client(id).await?;
    Ok(Json(json!({ "message": "Client deleted" })))
}
