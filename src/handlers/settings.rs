use crate::error::AppError;
use crate::models::{BusinessSettings, SettingsPayload};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<BusinessSettings>, AppError> {
    let settings = state.db.get_settings().await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state.db.update_settings(&payload).await?;
    Ok(Json(json!({ "message": "Settings updated" })))
}
