//! Sellable items and shared inventory pools.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A sellable item. When `base_inventory_id` is set, stock authority lives in
/// the referenced pool and the item's own `inventory` count is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub cost: f64,
    pub inventory: i64,
    pub reorder_level: i64,
    pub base_inventory_id: Option<i64>,
    pub active: bool,
}

/// Item row joined with its shared pool, for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemWithStock {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub cost: f64,
    pub inventory: i64,
    pub reorder_level: i64,
    pub base_inventory_id: Option<i64>,
    pub active: bool,
    pub pool_name: Option<String>,
    pub pool_quantity: Option<i64>,
}

/// Input for creating or updating an item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ItemPayload {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    pub price: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Cost must be a non-negative number"))]
    pub cost: f64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Inventory must be a non-negative integer"))]
    pub inventory: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Reorder level must be a non-negative integer"))]
    pub reorder_level: i64,
    #[serde(default)]
    pub base_inventory_id: Option<i64>,
}

/// Archive/unarchive toggle.
#[derive(Debug, Clone, Deserialize)]
pub struct SetActivePayload {
    pub active: bool,
}

/// A named stock counter shared by zero or more items.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryPool {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub reorder_level: i64,
}

/// Input for creating or updating an inventory pool.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PoolPayload {
    #[validate(length(min = 1, message = "Pool name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity must be a non-negative integer"))]
    pub quantity: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Reorder level must be a non-negative integer"))]
    pub reorder_level: i64,
}
