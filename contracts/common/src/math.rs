//! Integer Utilities for the Contribution Pool
//!
//! Checked balance arithmetic and the ledger's big-endian integer
//! encoding for application arguments.

use crate::errors::{PoolError, PoolResult};

/// Add to a balance, rejecting on overflow
pub fn checked_credit(balance: u64, amount: u64) -> PoolResult<u64> {
    balance.checked_add(amount).ok_or(PoolError::Overflow)
}

/// Subtract from a balance, rejecting on underflow
///
/// The ledger aborts a program whose uint64 subtraction underflows, so a
/// counter can never be driven below zero.
pub fn checked_debit(balance: u64, amount: u64) -> PoolResult<u64> {
    balance.checked_sub(amount).ok_or(PoolError::Underflow)
}

/// Sum amounts, rejecting on overflow
pub fn checked_sum(amounts: &[u64]) -> PoolResult<u64> {
    amounts
        .iter()
        .try_fold(0u64, |acc, &x| acc.checked_add(x))
        .ok_or(PoolError::Overflow)
}

/// Encode an integer as an 8-byte big-endian argument
pub fn itob(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode a big-endian argument of at most 8 bytes
///
/// Shorter inputs are zero-extended on the left; the empty slice is 0.
pub fn btoi(bytes: &[u8]) -> PoolResult<u64> {
    if bytes.len() > 8 {
        return Err(PoolError::InvalidInteger { len: bytes.len() });
    }

    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}
