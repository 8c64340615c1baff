//! Invoice line items.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Line item on an invoice. `price` is the unit price at time of sale and may
/// differ from the item's current price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub id: i64,
    pub invoice_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub price: f64,
    pub tax_exempt: bool,
}

/// Line item joined with its item's current name and cost. The joined fields
/// are null when the item has since been deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LineItemDetail {
    pub id: i64,
    pub invoice_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub price: f64,
    pub tax_exempt: bool,
    pub item_name: Option<String>,
    pub item_cost: Option<f64>,
}

/// Input line item for create/replace operations.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LineItemPayload {
    pub item_id: i64,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i64,
    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    pub price: f64,
    #[serde(default)]
    pub tax_exempt: bool,
}
