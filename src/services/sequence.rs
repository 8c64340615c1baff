//! Invoice number allocation.
//!
//! Numbers follow `{prefix}-{year}-{seq:03}`. The sequence is zero-padded to
//! three digits but never truncated, and it never resets: a new year keeps
//! counting from wherever the sequence left off. Allocation must happen
//! inside the caller's write transaction so a rolled-back create returns the
//! number to the counter.

use crate::error::AppError;
use chrono::{Datelike, Utc};
use sqlx::SqliteConnection;

#[derive(Debug, Clone)]
pub struct AllocatedNumber {
    pub invoice_number: String,
    pub sequence: i64,
}

#[derive(sqlx::FromRow)]
struct CounterRow {
    invoice_number_prefix: String,
    invoice_number_next_sequence: i64,
}

/// Take the next number from the settings counter and advance it.
pub async fn allocate(conn: &mut SqliteConnection) -> Result<AllocatedNumber, AppError> {
    let counter = sqlx::query_as::<_, CounterRow>(
        "SELECT invoice_number_prefix, invoice_number_next_sequence FROM settings WHERE id = 1",
    )
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        AppError::DatabaseError(anyhow::anyhow!("Failed to read invoice counter: {}", e))
    })?;

    let sequence = counter.invoice_number_next_sequence;
    let invoice_number = format_number(&counter.invoice_number_prefix, Utc::now().year(), sequence);

    sqlx::query("UPDATE settings SET invoice_number_next_sequence = ? WHERE id = 1")
        .bind(sequence + 1)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance invoice counter: {}", e))
        })?;

    Ok(AllocatedNumber {
        invoice_number,
        sequence,
    })
}

fn format_number(prefix: &str, year: i32, sequence: i64) -> String {
    format!("{}-{}-{:03}", prefix, year, sequence)
}
