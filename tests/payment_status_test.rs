mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{one_line_invoice, TestApp};
use serde_json::json;

/// Create an invoice with total 100 and return its id.
async fn invoice_of_100(app: &TestApp) -> i64 {
    let item = app.seed_item("Widget", 10.0, 1000).await;
    let (status, body) = app.post("/invoices", one_line_invoice(item, 10, 10.0)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn partial_payment_records_amount_without_a_date() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    let (status, _) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "partial", "amount_paid": 50.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (payment_status, amount_paid, payment_date) = app.payment_fields(id).await;
    assert_eq!(payment_status, "partial");
    assert_eq!(amount_paid, 50.0);
    assert_eq!(payment_date, None);
}

#[tokio::test]
async fn marking_paid_forces_full_amount_and_stamps_today() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    let (status, _) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "paid", "amount_paid": 30.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (payment_status, amount_paid, payment_date) = app.payment_fields(id).await;
    assert_eq!(payment_status, "paid");
    assert_eq!(amount_paid, 100.0);
    assert_eq!(payment_date, Some(Utc::now().date_naive().to_string()));
}

#[tokio::test]
async fn reverting_to_unpaid_clears_amount_and_date() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    app.patch(
        &format!("/invoices/{id}/payment"),
        json!({ "payment_status": "paid" }),
    )
    .await;
    let (status, _) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "unpaid" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (payment_status, amount_paid, payment_date) = app.payment_fields(id).await;
    assert_eq!(payment_status, "unpaid");
    assert_eq!(amount_paid, 0.0);
    assert_eq!(payment_date, None);
}

#[tokio::test]
async fn repaying_a_paid_invoice_keeps_the_original_date() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    app.patch(
        &format!("/invoices/{id}/payment"),
        json!({ "payment_status": "paid" }),
    )
    .await;
    let (_, _, first_date) = app.payment_fields(id).await;
    assert!(first_date.is_some());

    app.patch(
        &format!("/invoices/{id}/payment"),
        json!({ "payment_status": "paid" }),
    )
    .await;
    let (_, _, second_date) = app.payment_fields(id).await;
    assert_eq!(first_date, second_date);
}

#[tokio::test]
async fn overpayment_is_rejected_with_the_total_in_the_message() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    let (status, body) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "partial", "amount_paid": 150.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("$100.00"));
}

#[tokio::test]
async fn zero_partial_payment_is_rejected() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    let (status, _) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "partial", "amount_paid": 0.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    let (status, _) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "partial", "amount_paid": -5.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_updates_on_a_voided_invoice_are_rejected() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;
    app.patch(&format!("/invoices/{id}/void"), json!({})).await;

    let (status, body) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "paid" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot update payment on a voided invoice");
}

#[tokio::test]
async fn unknown_payment_status_is_rejected() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    let (status, _) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "refunded" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn setting_voided_through_payment_update_is_rejected() {
    let app = TestApp::spawn().await;
    let id = invoice_of_100(&app).await;

    let (status, _) = app.patch(
            &format!("/invoices/{id}/payment"),
            json!({ "payment_status": "voided" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (payment_status, _, _) = app.payment_fields(id).await;
    assert_eq!(payment_status, "unpaid");
}
