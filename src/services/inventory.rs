//! Stock resolution and adjustment inside a write transaction.
//!
//! Every item draws stock from exactly one place: the shared pool named by
//! `base_inventory_id` when set, otherwise the item's own `inventory` column.
//! All functions here run against a transaction connection so callers decide
//! whether the adjustments commit or roll back as a unit.

use crate::error::AppError;
use sqlx::SqliteConnection;

/// Where an item's stock lives, with the current available quantity.
#[derive(Debug, Clone)]
pub struct StockSource {
    pub item_id: i64,
    /// Set when the item draws from a shared pool.
    pub pool_id: Option<i64>,
    /// Item name for direct stock, pool name for shared stock. Used in
    /// insufficient-inventory messages.
    pub name: String,
    pub available: i64,
}

#[derive(sqlx::FromRow)]
struct StockRow {
    item_name: String,
    item_inventory: i64,
    pool_id: Option<i64>,
    pool_name: Option<String>,
    pool_quantity: Option<i64>,
}

/// Resolve the stock source for an item. Fails with `NotFound` when the item
/// does not exist; callers that tolerate dangling item ids handle that case.
pub async fn resolve(conn: &mut SqliteConnection, item_id: i64) -> Result<StockSource, AppError> {
    let row = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT i.name AS item_name, i.inventory AS item_inventory,
               p.id AS pool_id, p.name AS pool_name, p.quantity AS pool_quantity
        FROM items i
        LEFT JOIN inventory_pools p ON i.base_inventory_id = p.id
        WHERE i.id = ?
        "#,
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to resolve stock: {}", e)))?
    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item {} not found", item_id)))?;

    Ok(match (row.pool_id, row.pool_name, row.pool_quantity) {
        (Some(pool_id), Some(pool_name), Some(pool_quantity)) => StockSource {
            item_id,
            pool_id: Some(pool_id),
            name: pool_name,
            available: pool_quantity,
        },
        _ => StockSource {
            item_id,
            pool_id: None,
            name: row.item_name,
            available: row.item_inventory,
        },
    })
}

/// Check that `requested` units can be drawn from the source.
pub fn check_available(source: &StockSource, requested: i64) -> Result<(), AppError> {
    if requested > source.available {
        return Err(AppError::InsufficientInventory {
            name: source.name.clone(),
            available: source.available,
            requested,
        });
    }
    Ok(())
}

/// Apply a stock delta (negative deducts, positive restores) to wherever the
/// item's stock lives.
pub async fn adjust(
    conn: &mut SqliteConnection,
    source: &StockSource,
    delta: i64,
) -> Result<(), AppError> {
    match source.pool_id {
        Some(pool_id) => {
            sqlx::query("UPDATE inventory_pools SET quantity = quantity + ? WHERE id = ?")
                .bind(delta)
                .bind(pool_id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to adjust pool stock: {}", e))
                })?;
        }
        None => {
            sqlx::query("UPDATE items SET inventory = inventory + ? WHERE id = ?")
                .bind(delta)
                .bind(source.item_id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to adjust item stock: {}", e))
                })?;
        }
    }
    Ok(())
}
