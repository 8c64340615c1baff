#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use invoicing_server::services::{Database, InvoiceCoordinator};
use invoicing_server::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// In-memory application under test. The router is driven directly with
/// `oneshot`, no port is bound. A single-connection pool keeps the
/// in-memory database alive and shared for the test's lifetime.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub coordinator: InvoiceCoordinator,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db = Database::new("sqlite::memory:", 1)
            .await
            .expect("failed to open in-memory database");
        db.run_migrations().await.expect("failed to run migrations");

        let coordinator = InvoiceCoordinator::new(db.clone());
        let router = build_router(AppState {
            db: db.clone(),
            coordinator: coordinator.clone(),
        });

        Self {
            router,
            db,
            coordinator,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None).await
    }

    // ---------------------------------------------------------------------
    // Seed and inspection helpers, bypassing the HTTP surface
    // ---------------------------------------------------------------------

    pub async fn seed_client(&self, name: &str) -> i64 {
        sqlx::query("INSERT INTO clients (name) VALUES (?)")
            .bind(name)
            .execute(self.db.pool())
            .await
            .expect("failed to seed client")
            .last_insert_rowid()
    }

    pub async fn seed_item(&self, name: &str, price: f64, inventory: i64) -> i64 {
        sqlx::query("INSERT INTO items (name, price, cost, inventory) VALUES (?, ?, 0, ?)")
            .bind(name)
            .bind(price)
            .bind(inventory)
            .execute(self.db.pool())
            .await
            .expect("failed to seed item")
            .last_insert_rowid()
    }

    pub async fn seed_pool(&self, name: &str, quantity: i64) -> i64 {
        sqlx::query("INSERT INTO inventory_pools (name, quantity) VALUES (?, ?)")
            .bind(name)
            .bind(quantity)
            .execute(self.db.pool())
            .await
            .expect("failed to seed pool")
            .last_insert_rowid()
    }

    pub async fn seed_pooled_item(&self, name: &str, price: f64, pool_id: i64) -> i64 {
        sqlx::query(
            "INSERT INTO items (name, price, cost, inventory, base_inventory_id) VALUES (?, ?, 0, 0, ?)",
        )
        .bind(name)
        .bind(price)
        .bind(pool_id)
        .execute(self.db.pool())
        .await
        .expect("failed to seed pooled item")
        .last_insert_rowid()
    }

    pub async fn item_inventory(&self, id: i64) -> i64 {
        sqlx::query_scalar("SELECT inventory FROM items WHERE id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await
            .expect("failed to read item inventory")
    }

    pub async fn pool_quantity(&self, id: i64) -> i64 {
        sqlx::query_scalar("SELECT quantity FROM inventory_pools WHERE id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await
            .expect("failed to read pool quantity")
    }

    /// (payment_status, amount_paid, payment_date) of an invoice row.
    pub async fn payment_fields(&self, id: i64) -> (String, f64, Option<String>) {
        sqlx::query_as("SELECT payment_status, amount_paid, payment_date FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await
            .expect("failed to read invoice payment fields")
    }

    pub async fn line_item_count(&self, invoice_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM invoice_line_items WHERE invoice_id = ?")
            .bind(invoice_id)
            .fetch_one(self.db.pool())
            .await
            .expect("failed to count line items")
    }
}

/// Build a create-invoice body with one line.
pub fn one_line_invoice(item_id: i64, quantity: i64, price: f64) -> Value {
    json!({
        "total": quantity as f64 * price,
        "items": [{ "item_id": item_id, "quantity": quantity, "price": price }],
    })
}
