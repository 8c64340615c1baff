//! Invoice lifecycle coordination.
//!
//! Each public method is one atomic unit of work: it takes the exclusive
//! write transaction, applies every stock movement and row change, and
//! commits at the end. Any error before the commit drops the transaction
//! and rolls the whole operation back, invoice number allocation included.
//!
//! Line items referencing items that no longer exist are tolerated
//! throughout: they are persisted and returned, but skipped by every stock
//! check and adjustment. Imported and historical invoices depend on this.

use crate::error::AppError;
use crate::models::{
    CreateInvoicePayload, CreatedInvoice, Invoice, LineItemPayload, PaymentStatus,
    ReplaceInvoicePayload, UpdatePaymentPayload,
};
use crate::services::database::Database;
use crate::services::inventory::{self, StockSource};
use crate::services::payment::{self, PaymentState};
use crate::services::sequence;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Clone)]
pub struct InvoiceCoordinator {
    db: Database,
}

impl InvoiceCoordinator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an invoice: allocate the next number, insert the rows, and
    /// deduct stock for every line, all in one transaction.
    #[instrument(skip(self, payload))]
    pub async fn create_invoice(
        &self,
        payload: &CreateInvoicePayload,
    ) -> Result<CreatedInvoice, AppError> {
        payload.validate()?;

        let mut tx = self.db.begin_write().await?;

        let term_days: i64 = sqlx::query_scalar(
            "SELECT default_payment_term_days FROM settings WHERE id = 1",
        )
        .fetch_one(tx.conn())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to read payment terms: {}", e))
        })?;

        let invoice_date = payload.invoice_date.unwrap_or_else(today);
        let due_date = invoice_date + Duration::days(term_days);

        let allocated = sequence::allocate(tx.conn()).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO invoices
                (client_id, invoice_number, invoice_date, due_date, payment_status,
                 amount_paid, payment_date, notes, total)
            VALUES (?, ?, ?, ?, 'unpaid', 0, NULL, ?, ?)
            "#,
        )
        .bind(payload.client_id)
        .bind(&allocated.invoice_number)
        .bind(invoice_date)
        .bind(due_date)
        .bind(&payload.notes)
        .bind(payload.total)
        .execute(tx.conn())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Invoice number conflict. Please try again."))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)),
        })?;
        let invoice_id = result.last_insert_rowid();

        apply_lines(tx.conn(), invoice_id, &payload.items).await?;

        tx.commit().await?;

        info!(
            invoice_id,
            invoice_number = %allocated.invoice_number,
            "Invoice created"
        );

        Ok(CreatedInvoice {
            id: invoice_id,
            invoice_number: allocated.invoice_number,
        })
    }

    /// Replace an invoice's content wholesale. Stock held by the old lines
    /// is restored first, then the new lines are checked and deducted, so a
    /// quantity edit only needs the net change to be in stock.
    #[instrument(skip(self, payload))]
    pub async fn replace_invoice(
        &self,
        id: i64,
        payload: &ReplaceInvoicePayload,
    ) -> Result<(), AppError> {
        payload.validate()?;

        if payload.due_date < payload.invoice_date {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Due date cannot be before the invoice date"
            )));
        }
        let target_status = parse_status(&payload.payment_status)?;

        let mut tx = self.db.begin_write().await?;

        let invoice = fetch_invoice(tx.conn(), id).await?;
        let current = payment_state_of(&invoice)?;
        if current.status == PaymentStatus::Voided {
            return Err(AppError::InvalidStateTransition(
                "Cannot edit a voided invoice".to_string(),
            ));
        }

        restore_lines(tx.conn(), id).await?;
        sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = ?")
            .bind(id)
            .execute(tx.conn())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete line items: {}", e))
            })?;

        apply_lines(tx.conn(), id, &payload.items).await?;

        let next = payment::transition(
            &current,
            target_status,
            payload.amount_paid,
            payload.total,
            today(),
        )?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = ?, invoice_date = ?, due_date = ?, payment_status = ?,
                amount_paid = ?, payment_date = ?, notes = ?, total = ?
            WHERE id = ?
            "#,
        )
        .bind(payload.client_id)
        .bind(payload.invoice_date)
        .bind(payload.due_date)
        .bind(next.status.as_str())
        .bind(next.amount_paid)
        .bind(next.payment_date)
        .bind(&payload.notes)
        .bind(payload.total)
        .bind(id)
        .execute(tx.conn())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        tx.commit().await?;

        info!(invoice_id = id, "Invoice replaced");

        Ok(())
    }

    /// Void an invoice: restore its stock and clear its payment fields.
    /// Line items stay on the invoice for the record.
    #[instrument(skip(self))]
    pub async fn void_invoice(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin_write().await?;

        let invoice = fetch_invoice(tx.conn(), id).await?;
        if invoice.payment_status == PaymentStatus::Voided.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Invoice is already voided".to_string(),
            ));
        }

        restore_lines(tx.conn(), id).await?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET payment_status = 'voided', amount_paid = 0, payment_date = NULL
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(tx.conn())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to void invoice: {}", e)))?;

        tx.commit().await?;

        info!(invoice_id = id, "Invoice voided");

        Ok(())
    }

    /// Delete an invoice and its lines. Stock is restored unless the
    /// invoice was already voided, which restored it once.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin_write().await?;

        let invoice = fetch_invoice(tx.conn(), id).await?;
        if invoice.payment_status != PaymentStatus::Voided.as_str() {
            restore_lines(tx.conn(), id).await?;
        }

        sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = ?")
            .bind(id)
            .execute(tx.conn())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete line items: {}", e))
            })?;
        sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(tx.conn())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        tx.commit().await?;

        info!(invoice_id = id, "Invoice deleted");

        Ok(())
    }

    /// Transition the payment fields without touching lines or stock.
    #[instrument(skip(self, payload))]
    pub async fn update_payment(
        &self,
        id: i64,
        payload: &UpdatePaymentPayload,
    ) -> Result<PaymentState, AppError> {
        let target = parse_status(&payload.payment_status)?;

        let mut tx = self.db.begin_write().await?;

        let invoice = fetch_invoice(tx.conn(), id).await?;
        let current = payment_state_of(&invoice)?;

        let next = payment::transition(&current, target, payload.amount_paid, invoice.total, today())?;

        sqlx::query(
            "UPDATE invoices SET payment_status = ?, amount_paid = ?, payment_date = ? WHERE id = ?",
        )
        .bind(next.status.as_str())
        .bind(next.amount_paid)
        .bind(next.payment_date)
        .bind(id)
        .execute(tx.conn())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update payment: {}", e)))?;

        tx.commit().await?;

        info!(invoice_id = id, status = next.status.as_str(), "Payment updated");

        Ok(next)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn parse_status(s: &str) -> Result<PaymentStatus, AppError> {
    PaymentStatus::from_string(s)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown payment status '{}'", s)))
}

fn payment_state_of(invoice: &Invoice) -> Result<PaymentState, AppError> {
    let status = PaymentStatus::from_string(&invoice.payment_status).ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Invoice {} has unrecognized payment status '{}'",
            invoice.id,
            invoice.payment_status
        ))
    })?;
    Ok(PaymentState {
        status,
        amount_paid: invoice.amount_paid,
        payment_date: invoice.payment_date,
    })
}

async fn fetch_invoice(conn: &mut SqliteConnection, id: i64) -> Result<Invoice, AppError> {
    sqlx::query_as::<_, Invoice>(
        r#"
        SELECT id, client_id, invoice_number, invoice_date, due_date, payment_status,
               amount_paid, payment_date, notes, total, created_at
        FROM invoices
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch invoice: {}", e)))?
    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))
}

/// Resolve an item's stock source, treating a dangling item id as absent.
async fn resolve_tolerant(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> Result<Option<StockSource>, AppError> {
    match inventory::resolve(conn, item_id).await {
        Ok(source) => Ok(Some(source)),
        Err(AppError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Return the stock held by an invoice's current lines. Lines whose item no
/// longer exists are skipped.
async fn restore_lines(conn: &mut SqliteConnection, invoice_id: i64) -> Result<(), AppError> {
    #[derive(sqlx::FromRow)]
    struct HeldLine {
        item_id: i64,
        quantity: i64,
    }

    let lines = sqlx::query_as::<_, HeldLine>(
        "SELECT item_id, quantity FROM invoice_line_items WHERE invoice_id = ?",
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to read line items: {}", e)))?;

    for line in lines {
        if let Some(source) = resolve_tolerant(conn, line.item_id).await? {
            inventory::adjust(conn, &source, line.quantity).await?;
        }
    }

    Ok(())
}

/// Insert new lines, checking and deducting stock one line at a time so
/// multiple lines drawing from the same pool are enforced against the
/// running balance.
async fn apply_lines(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    lines: &[LineItemPayload],
) -> Result<(), AppError> {
    for line in lines {
        if let Some(source) = resolve_tolerant(conn, line.item_id).await? {
            inventory::check_available(&source, line.quantity)?;
            inventory::adjust(conn, &source, -line.quantity).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO invoice_line_items (invoice_id, item_id, quantity, price, tax_exempt)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.price)
        .bind(line.tax_exempt)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert line item: {}", e))
        })?;
    }

    Ok(())
}
