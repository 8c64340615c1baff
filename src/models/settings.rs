//! Business settings singleton.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// The singleton settings row. Besides business identity it carries the
/// invoice-number sequence counter and the default payment terms.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessSettings {
    pub id: i64,
    pub business_name: String,
    pub business_street: String,
    pub business_street2: String,
    pub business_city: String,
    pub business_state: String,
    pub business_zip: String,
    pub business_phone: String,
    pub business_email: String,
    pub tax_rate: f64,
    pub invoice_number_prefix: String,
    pub invoice_number_next_sequence: i64,
    pub default_payment_term_days: i64,
}

/// Input for updating the settings row.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SettingsPayload {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub business_street: String,
    #[serde(default)]
    pub business_street2: String,
    #[serde(default)]
    pub business_city: String,
    #[serde(default)]
    pub business_state: String,
    #[serde(default)]
    pub business_zip: String,
    #[serde(default)]
    pub business_phone: String,
    #[serde(default)]
    pub business_email: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Tax rate must be a non-negative number"))]
    pub tax_rate: f64,
    #[validate(length(min = 1, message = "Invoice number prefix is required"))]
    pub invoice_number_prefix: String,
    #[validate(range(min = 1, message = "Next sequence must be a positive integer"))]
    pub invoice_number_next_sequence: i64,
    #[validate(range(min = 0, message = "Payment terms must be a non-negative integer"))]
    pub default_payment_term_days: i64,
}
