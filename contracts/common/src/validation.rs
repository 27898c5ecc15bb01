//! Validation Helpers for the Contribution Pool
//!
//! Guard-clause helpers shared by the pool handlers. Each returns the
//! precise rejection so the caller can propagate it with `?`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chipin_common::validation::{check, require_creator};
//!
//! check!(amount <= maximum, PoolError::ExceedsMaximum { amount, maximum });
//! require_creator(&config.creator, &sender)?;
//! ```

use crate::{
    errors::{PoolError, PoolResult},
    ledger::LedgerView,
    types::{Address, Payment},
};

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
///
/// # Examples
///
/// ```rust,ignore
/// check!(
///     env.group_size() == CONTRIBUTE_GROUP_SIZE,
///     PoolError::InvalidGroupSize { expected: 2, actual: env.group_size() }
/// );
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use check;

// ============ Common Validation Helpers ============

/// Require the sender to be the pool creator.
pub fn require_creator(creator: &Address, sender: &Address) -> PoolResult<()> {
    if creator != sender {
        return Err(PoolError::Unauthorized {
            expected: *creator,
            actual: *sender,
        });
    }
    Ok(())
}

/// Require the atomic group to hold exactly `expected` transactions.
pub fn require_group_size<L: LedgerView>(ledger: &L, expected: usize) -> PoolResult<()> {
    let actual = ledger.group_size();
    if actual != expected {
        return Err(PoolError::InvalidGroupSize { expected, actual });
    }
    Ok(())
}

/// Fetch the payment at `index` of the group and require it to pay the
/// application's holding account.
pub fn require_payment_to_holding<L: LedgerView>(ledger: &L, index: usize) -> PoolResult<Payment> {
    let payment = ledger
        .group_txn(index)
        .and_then(|txn| txn.as_payment())
        .copied()
        .ok_or(PoolError::MissingPayment { index })?;

    let holding = ledger.holding_address();
    if payment.receiver != holding {
        return Err(PoolError::WrongPaymentReceiver {
            expected: holding,
            actual: payment.receiver,
        });
    }

    Ok(payment)
}

/// Require sufficient balance for an operation.
pub fn require_sufficient_balance(available: u64, requested: u64) -> PoolResult<()> {
    if available < requested {
        return Err(PoolError::InsufficientBalance {
            available,
            requested,
        });
    }
    Ok(())
}

/// Require a value not to exceed an optional maximum.
pub fn require_within_maximum(amount: u64, maximum: Option<u64>) -> PoolResult<()> {
    match maximum {
        Some(maximum) if amount > maximum => Err(PoolError::ExceedsMaximum { amount, maximum }),
        _ => Ok(()),
    }
}
