//! Database service: connection pool, migrations, and the exclusive writer.
//!
//! All invoice lifecycle operations go through [`Database::begin_write`],
//! which pairs a process-wide writer mutex with a `BEGIN IMMEDIATE`
//! transaction so that no other writer can interleave between a check and
//! the write it informs. Plain reads use the pool directly and may run
//! concurrently with an in-flight write transaction.

use crate::error::AppError;
use crate::models::{
    BusinessSettings, Client, ClientPayload, InventoryPool, Invoice, InvoiceSummary, Item,
    ItemPayload, ItemWithStock, LineItemDetail, PoolPayload, SettingsPayload,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument};

/// Connection pool wrapper plus the process-wide write lock.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

/// An exclusive write transaction. Holds the writer mutex for its lifetime;
/// dropping it without [`WriteTransaction::commit`] rolls everything back.
pub struct WriteTransaction {
    tx: Transaction<'static, Sqlite>,
    _lock: OwnedMutexGuard<()>,
}

impl WriteTransaction {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))
    }
}

impl Database {
    /// Open (creating if necessary) the database and build the pool.
    #[instrument(skip(database_url))]
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!(max_connections, "SQLite connection pool established");

        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Acquire the writer mutex and open a `BEGIN IMMEDIATE` transaction.
    pub async fn begin_write(&self) -> Result<WriteTransaction, AppError> {
        let lock = self.write_lock.clone().lock_owned().await;
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
            })?;
        Ok(WriteTransaction { tx, _lock: lock })
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    /// Fetch the singleton settings row (seeded by the initial migration).
    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<BusinessSettings, AppError> {
        sqlx::query_as::<_, BusinessSettings>(
            r#"
            SELECT id, business_name, business_street, business_street2, business_city,
                business_state, business_zip, business_phone, business_email, tax_rate,
                invoice_number_prefix, invoice_number_next_sequence, default_payment_term_days
            FROM settings
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get settings: {}", e)))
    }

    #[instrument(skip(self, payload))]
    pub async fn update_settings(&self, payload: &SettingsPayload) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE settings SET
                business_name = ?, business_street = ?, business_street2 = ?,
                business_city = ?, business_state = ?, business_zip = ?,
                business_phone = ?, business_email = ?, tax_rate = ?,
                invoice_number_prefix = ?, invoice_number_next_sequence = ?,
                default_payment_term_days = ?
            WHERE id = 1
            "#,
        )
        .bind(&payload.business_name)
        .bind(&payload.business_street)
        .bind(&payload.business_street2)
        .bind(&payload.business_city)
        .bind(&payload.business_state)
        .bind(&payload.business_zip)
        .bind(&payload.business_phone)
        .bind(&payload.business_email)
        .bind(payload.tax_rate)
        .bind(&payload.invoice_number_prefix)
        .bind(payload.invoice_number_next_sequence)
        .bind(payload.default_payment_term_days)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update settings: {}", e)))?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Clients
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        sqlx::query_as::<_, Client>(
            "SELECT id, name, street, street2, city, state, zip, phone, email FROM clients ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list clients: {}", e)))
    }

    #[instrument(skip(self))]
    pub async fn search_clients(&self, query: &str) -> Result<Vec<Client>, AppError> {
        sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, street, street2, city, state, zip, phone, email
            FROM clients
            WHERE name LIKE ?
            ORDER BY name
            LIMIT 10
            "#,
        )
        .bind(format!("%{}%", query))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search clients: {}", e)))
    }

    #[instrument(skip(self, payload))]
    pub async fn create_client(&self, payload: &ClientPayload) -> Result<Client, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, street, street2, city, state, zip, phone, email)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, street, street2, city, state, zip, phone, email
            "#,
        )
        .bind(payload.name.trim())
        .bind(&payload.street)
        .bind(&payload.street2)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.zip)
        .bind(&payload.phone)
        .bind(&payload.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create client: {}", e)))?;

        info!(client_id = client.id, "Client created");

        Ok(client)
    }

    #[instrument(skip(self, payload))]
    pub async fn update_client(&self, id: i64, payload: &ClientPayload) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = ?, street = ?, street2 = ?, city = ?, state = ?, zip = ?, phone = ?, email = ?
            WHERE id = ?
            "#,
        )
        .bind(payload.name.trim())
        .bind(&payload.street)
        .bind(&payload.street2)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.zip)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update client: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Client not found")));
        }

        Ok(())
    }

    /// Delete a client. Rejected while the client still has invoices.
    #[instrument(skip(self))]
    pub async fn delete_client(&self, id: i64) -> Result<(), AppError> {
        let invoice_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE client_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
                })?;

        if invoice_count > 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot delete: this client has {} invoice(s). Delete or reassign invoices first.",
                invoice_count
            )));
        }

        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete client: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Client not found")));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// List all items joined with their shared pool, when linked.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<ItemWithStock>, AppError> {
        sqlx::query_as::<_, ItemWithStock>(
            r#"
            SELECT i.id, i.name, i.price, i.cost, i.inventory, i.reorder_level,
                   i.base_inventory_id, i.active,
                   p.name AS pool_name, p.quantity AS pool_quantity
            FROM items i
            LEFT JOIN inventory_pools p ON i.base_inventory_id = p.id
            ORDER BY i.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))
    }

    /// Autocomplete search over active items only.
    #[instrument(skip(self))]
    pub async fn search_items(&self, query: &str) -> Result<Vec<Item>, AppError> {
        sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, price, cost, inventory, reorder_level, base_inventory_id, active
            FROM items
            WHERE name LIKE ? AND active = 1
            ORDER BY name
            LIMIT 15
            "#,
        )
        .bind(format!("%{}%", query))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search items: {}", e)))
    }

    #[instrument(skip(self, payload))]
    pub async fn create_item(&self, payload: &ItemPayload) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, price, cost, inventory, reorder_level, base_inventory_id, active)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            RETURNING id, name, price, cost, inventory, reorder_level, base_inventory_id, active
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.price)
        .bind(payload.cost)
        .bind(payload.inventory)
        .bind(payload.reorder_level)
        .bind(payload.base_inventory_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Item '{}' already exists", payload.name.trim()))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create item: {}", e)),
        })?;

        info!(item_id = item.id, name = %item.name, "Item created");

        Ok(item)
    }

    #[instrument(skip(self, payload))]
    pub async fn update_item(&self, id: i64, payload: &ItemPayload) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?, price = ?, cost = ?, inventory = ?, reorder_level = ?, base_inventory_id = ?
            WHERE id = ?
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.price)
        .bind(payload.cost)
        .bind(payload.inventory)
        .bind(payload.reorder_level)
        .bind(payload.base_inventory_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Item '{}' already exists", payload.name.trim()))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update item: {}", e)),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Item not found")));
        }

        Ok(())
    }

    /// Delete an item. Rejected while invoice line items still reference it.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i64) -> Result<(), AppError> {
        let usage_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoice_line_items WHERE item_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count line items: {}", e))
                })?;

        if usage_count > 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot delete: this item is used in {} invoice(s).",
                usage_count
            )));
        }

        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete item: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Item not found")));
        }

        Ok(())
    }

    /// Archive or unarchive an item.
    #[instrument(skip(self))]
    pub async fn set_item_active(&self, id: i64, active: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE items SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update item status: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Item not found")));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inventory pools
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_pools(&self) -> Result<Vec<InventoryPool>, AppError> {
        sqlx::query_as::<_, InventoryPool>(
            "SELECT id, name, quantity, reorder_level FROM inventory_pools ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list pools: {}", e)))
    }

    #[instrument(skip(self, payload))]
    pub async fn create_pool(&self, payload: &PoolPayload) -> Result<InventoryPool, AppError> {
        let pool = sqlx::query_as::<_, InventoryPool>(
            r#"
            INSERT INTO inventory_pools (name, quantity, reorder_level)
            VALUES (?, ?, ?)
            RETURNING id, name, quantity, reorder_level
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.quantity)
        .bind(payload.reorder_level)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Inventory pool '{}' already exists",
                    payload.name.trim()
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create pool: {}", e)),
        })?;

        info!(pool_id = pool.id, name = %pool.name, "Inventory pool created");

        Ok(pool)
    }

    #[instrument(skip(self, payload))]
    pub async fn update_pool(&self, id: i64, payload: &PoolPayload) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE inventory_pools SET name = ?, quantity = ?, reorder_level = ? WHERE id = ?",
        )
        .bind(payload.name.trim())
        .bind(payload.quantity)
        .bind(payload.reorder_level)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Inventory pool '{}' already exists",
                    payload.name.trim()
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update pool: {}", e)),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Inventory pool not found")));
        }

        Ok(())
    }

    /// Delete a pool. Rejected while items still draw stock from it.
    #[instrument(skip(self))]
    pub async fn delete_pool(&self, id: i64) -> Result<(), AppError> {
        let item_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE base_inventory_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count items: {}", e))
                })?;

        if item_count > 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot delete: {} item(s) draw stock from this pool.",
                item_count
            )));
        }

        let result = sqlx::query("DELETE FROM inventory_pools WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete pool: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Inventory pool not found")));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Invoice reads
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
        sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT i.id, i.invoice_number, i.invoice_date, i.due_date, i.payment_status,
                   i.amount_paid, i.payment_date, i.total, i.created_at,
                   c.name AS client_name
            FROM invoices i
            LEFT JOIN clients c ON i.client_id = c.id
            ORDER BY i.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>, AppError> {
        sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, client_id, invoice_number, invoice_date, due_date, payment_status,
                   amount_paid, payment_date, notes, total, created_at
            FROM invoices
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))
    }

    /// Line items for an invoice, joined with the current item name and cost.
    #[instrument(skip(self))]
    pub async fn get_line_items(&self, invoice_id: i64) -> Result<Vec<LineItemDetail>, AppError> {
        sqlx::query_as::<_, LineItemDetail>(
            r#"
            SELECT li.id, li.invoice_id, li.item_id, li.quantity, li.price, li.tax_exempt,
                   it.name AS item_name, it.cost AS item_cost
            FROM invoice_line_items li
            LEFT JOIN items it ON li.item_id = it.id
            WHERE li.invoice_id = ?
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))
    }
}
