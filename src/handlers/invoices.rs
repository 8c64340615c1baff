use crate::error::AppError;
use crate::models::{
    CreateInvoicePayload, Invoice, InvoiceSummary, LineItemDetail, ReplaceInvoicePayload,
    UpdatePaymentPayload,
};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Invoice with its line items, as returned by the detail endpoint.
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<LineItemDetail>,
}

pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceSummary>>, AppError> {
    let invoices = state.db.list_invoices().await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InvoiceDetail>, AppError> {
    let invoice = state
        .db
        .get_invoice(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    let items = state.db.get_line_items(id).await?;
    Ok(Json(InvoiceDetail { invoice, items }))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.coordinator.create_invoice(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReplaceInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    state.coordinator.replace_invoice(id, &payload).await?;
    Ok(Json(json!({ "message": "Invoice updated" })))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let next = state.coordinator.update_payment(id, &payload).await?;
    Ok(Json(json!({
        "message": "Payment updated",
        "payment_status": next.status.as_str(),
        "amount_paid": next.amount_paid,
        "payment_date": next.payment_date,
    })))
}

pub async fn void_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.coordinator.void_invoice(id).await?;
    Ok(Json(json!({ "message": "Invoice voided" })))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.coordinator.delete_invoice(id).await?;
    Ok(Json(json!({ "message": "Invoice deleted" })))
}
