//! Invoice model and lifecycle payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::LineItemPayload;

/// Payment status of an invoice.
///
/// `Voided` is terminal and can only be entered through the void operation,
/// never through a payment-status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Voided,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Voided => "voided",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "partial" => Some(PaymentStatus::Partial),
            "paid" => Some(PaymentStatus::Paid),
            "voided" => Some(PaymentStatus::Voided),
            _ => None,
        }
    }
}

/// Invoice row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub client_id: Option<i64>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_status: String,
    pub amount_paid: f64,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub total: f64,
    pub created_at: String,
}

/// Invoice row joined with the client name, for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceSummary {
    pub id: i64,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_status: String,
    pub amount_paid: f64,
    pub payment_date: Option<NaiveDate>,
    pub total: f64,
    pub created_at: String,
    pub client_name: Option<String>,
}

/// Identifier pair returned by a successful create.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedInvoice {
    pub id: i64,
    pub invoice_number: String,
}

/// Input for creating an invoice. The invoice number, due date, and initial
/// payment fields are derived server-side.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoicePayload {
    pub client_id: Option<i64>,
    pub invoice_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(range(min = 0.0, message = "Total must be a non-negative number"))]
    pub total: f64,
    #[validate(nested)]
    pub items: Vec<LineItemPayload>,
}

/// Input for a full replace of an existing invoice.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceInvoicePayload {
    pub client_id: Option<i64>,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default = "default_payment_status")]
    pub payment_status: String,
    pub amount_paid: Option<f64>,
    pub notes: Option<String>,
    #[validate(range(min = 0.0, message = "Total must be a non-negative number"))]
    pub total: f64,
    #[validate(nested)]
    pub items: Vec<LineItemPayload>,
}

fn default_payment_status() -> String {
    "unpaid".to_string()
}

/// Input for a payment-status transition.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentPayload {
    pub payment_status: String,
    pub amount_paid: Option<f64>,
}
