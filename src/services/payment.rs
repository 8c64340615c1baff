//! Payment state machine.
//!
//! Pure transition logic: callers load the current state, compute the next
//! one here, and persist it inside their own transaction. Voided is terminal
//! and is entered only through the void operation, never through a payment
//! transition.

use crate::error::AppError;
use crate::models::PaymentStatus;
use chrono::NaiveDate;

/// The payment fields of an invoice, as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentState {
    pub status: PaymentStatus,
    pub amount_paid: f64,
    pub payment_date: Option<NaiveDate>,
}

/// Compute the state after transitioning to `target` with an optional
/// explicit amount. Rules are checked in order so that, e.g., an overpaying
/// request against a voided invoice reports the void, not the overpayment.
pub fn transition(
    current: &PaymentState,
    target: PaymentStatus,
    amount: Option<f64>,
    total: f64,
    today: NaiveDate,
) -> Result<PaymentState, AppError> {
    if current.status == PaymentStatus::Voided {
        return Err(AppError::InvalidStateTransition(
            "Cannot update payment on a voided invoice".to_string(),
        ));
    }
    if target == PaymentStatus::Voided {
        return Err(AppError::InvalidStateTransition(
            "Cannot set payment status to voided; use the void operation".to_string(),
        ));
    }

    if let Some(amount) = amount {
        if amount < 0.0 {
            return Err(AppError::InvalidStateTransition(
                "Amount paid cannot be negative".to_string(),
            ));
        }
        if amount > total {
            return Err(AppError::InvalidStateTransition(format!(
                "Amount paid cannot exceed the invoice total of ${:.2}",
                total
            )));
        }
    }

    match target {
        PaymentStatus::Voided => Err(AppError::InvalidStateTransition(
            "Cannot set payment status to voided; use the void operation".to_string(),
        )),
        PaymentStatus::Paid => {
            // Re-paying an already-paid invoice keeps the original date.
            let payment_date = if current.status == PaymentStatus::Paid {
                current.payment_date
            } else {
                Some(today)
            };
            Ok(PaymentState {
                status: PaymentStatus::Paid,
                amount_paid: total,
                payment_date,
            })
        }
        PaymentStatus::Unpaid => Ok(PaymentState {
            status: PaymentStatus::Unpaid,
            amount_paid: 0.0,
            payment_date: None,
        }),
        PaymentStatus::Partial => {
            let amount = amount.unwrap_or(0.0);
            if amount <= 0.0 {
                return Err(AppError::InvalidStateTransition(
                    "Partial payment requires an amount greater than zero".to_string(),
                ));
            }
            Ok(PaymentState {
                status: PaymentStatus::Partial,
                amount_paid: amount,
                payment_date: None,
            })
        }
    }
}
