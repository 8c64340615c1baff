mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use common::{one_line_invoice, TestApp};
use invoicing_server::models::CreateInvoicePayload;
use serde_json::json;

#[tokio::test]
async fn invoice_numbers_are_sequential() {
    let app = TestApp::spawn().await;
    let item = app.seed_item("Widget", 10.0, 1000).await;
    let year = Utc::now().year();

    for expected in [
        format!("INV-{year}-001"),
        format!("INV-{year}-002"),
        format!("INV-{year}-003"),
    ] {
        let (status, body) = app.post("/invoices", one_line_invoice(item, 1, 10.0)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["invoice_number"], expected.as_str());
    }
}

#[tokio::test]
async fn wide_sequences_are_not_truncated() {
    let app = TestApp::spawn().await;
    let item = app.seed_item("Widget", 10.0, 10).await;
    sqlx::query("UPDATE settings SET invoice_number_next_sequence = 1000")
        .execute(app.db.pool())
        .await
        .unwrap();

    let (status, body) = app.post("/invoices", one_line_invoice(item, 1, 10.0)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["invoice_number"],
        format!("INV-{}-1000", Utc::now().year()).as_str()
    );
}

#[tokio::test]
async fn concurrent_creates_get_distinct_numbers() {
    let app = TestApp::spawn().await;

    let payload = CreateInvoicePayload {
        client_id: None,
        invoice_date: None,
        notes: None,
        total: 0.0,
        items: vec![],
    };

    let (a, b) = tokio::join!(
        app.coordinator.create_invoice(&payload),
        app.coordinator.create_invoice(&payload),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert_ne!(a.invoice_number, b.invoice_number);
}

#[tokio::test]
async fn void_restores_stock_and_clears_payment_but_keeps_lines() {
    let app = TestApp::spawn().await;
    let item = app.seed_item("Widget", 10.0, 100).await;

    let (_, body) = app.post("/invoices", one_line_invoice(item, 10, 10.0)).await;
    let id = body["id"].as_i64().unwrap();
    assert_eq!(app.item_inventory(item).await, 90);

    app.patch(
        &format!("/invoices/{id}/payment"),
        json!({ "payment_status": "partial", "amount_paid": 40.0 }),
    )
    .await;

    let (status, _) = app.patch(&format!("/invoices/{id}/void"), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.item_inventory(item).await, 100);
    let (payment_status, amount_paid, payment_date) = app.payment_fields(id).await;
    assert_eq!(payment_status, "voided");
    assert_eq!(amount_paid, 0.0);
    assert_eq!(payment_date, None);
    assert_eq!(app.line_item_count(id).await, 1);
}

#[tokio::test]
async fn deleting_a_voided_invoice_does_not_restore_twice() {
    let app = TestApp::spawn().await;
    let item = app.seed_item("Widget", 10.0, 100).await;

    let (_, body) = app.post("/invoices", one_line_invoice(item, 10, 10.0)).await;
    let id = body["id"].as_i64().unwrap();
    assert_eq!(app.item_inventory(item).await, 90);

    app.patch(&format!("/invoices/{id}/void"), json!({})).await;
    assert_eq!(app.item_inventory(item).await, 100);

    let (status, _) = app.delete(&format!("/invoices/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.item_inventory(item).await, 100);

    let (status, _) = app.get(&format!("/invoices/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_an_active_invoice_restores_stock_and_removes_lines() {
    let app = TestApp::spawn().await;
    let item = app.seed_item("Widget", 10.0, 100).await;

    let (_, body) = app.post("/invoices", one_line_invoice(item, 10, 10.0)).await;
    let id = body["id"].as_i64().unwrap();
    assert_eq!(app.item_inventory(item).await, 90);

    let (status, _) = app.delete(&format!("/invoices/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.item_inventory(item).await, 100);
    assert_eq!(app.line_item_count(id).await, 0);
}

#[tokio::test]
async fn voiding_twice_is_rejected_without_side_effects() {
    let app = TestApp::spawn().await;
    let item = app.seed_item("Widget", 10.0, 100).await;

    let (_, body) = app.post("/invoices", one_line_invoice(item, 10, 10.0)).await;
    let id = body["id"].as_i64().unwrap();

    app.patch(&format!("/invoices/{id}/void"), json!({})).await;
    assert_eq!(app.item_inventory(item).await, 100);

    let (status, body) = app.patch(&format!("/invoices/{id}/void"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invoice is already voided");
    assert_eq!(app.item_inventory(item).await, 100);
}

#[tokio::test]
async fn editing_a_voided_invoice_is_rejected() {
    let app = TestApp::spawn().await;
    let item = app.seed_item("Widget", 10.0, 100).await;

    let (_, body) = app.post("/invoices", one_line_invoice(item, 5, 10.0)).await;
    let id = body["id"].as_i64().unwrap();
    app.patch(&format!("/invoices/{id}/void"), json!({})).await;

    let (status, body) = app
        .put(
            &format!("/invoices/{id}"),
            json!({
                "invoice_date": "2026-08-01",
                "due_date": "2026-08-31",
                "total": 0.0,
                "items": [],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot edit a voided invoice");
}

#[tokio::test]
async fn deleting_a_missing_invoice_returns_not_found() {
    let app = TestApp::spawn().await;
    let (status, _) = app.delete("/invoices/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
