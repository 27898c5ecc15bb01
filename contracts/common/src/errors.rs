//! Error Types for the Contribution Pool
//!
//! Every rejection is detected before the pool state is touched, so an
//! error always means the whole call (and its atomic group) never happened.
//! The ledger only sees accept/reject; `code()` and `kind()` are there for
//! hosts, tooling and tests.

use crate::types::{Address, PoolOperation};

/// Result type alias for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Main error enum for all pool errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // ============ Authorization Errors ============
    /// Caller is not authorized for this operation
    Unauthorized { expected: Address, actual: Address },

    // ============ Group Errors ============
    /// Atomic group has the wrong number of transactions
    InvalidGroupSize { expected: usize, actual: usize },

    /// Expected a payment at the given group position
    MissingPayment { index: usize },

    /// Payment does not go to the pool's holding account
    WrongPaymentReceiver { expected: Address, actual: Address },

    // ============ Balance Errors ============
    /// Insufficient balance for operation
    InsufficientBalance { available: u64, requested: u64 },

    /// Amount exceeds maximum allowed
    ExceedsMaximum { amount: u64, maximum: u64 },

    // ============ State Errors ============
    /// Account has no participant record
    NotEnrolled { account: Address },

    /// Account already holds a participant record
    AlreadyEnrolled { account: Address },

    /// Pool already created for this application
    AlreadyInitialized,

    /// Pool has not been created yet
    NotInitialized,

    /// Update and delete are never allowed
    ImmutableOperation { operation: PoolOperation },

    // ============ Input Errors ============
    /// First argument is not a known opcode
    UnknownOpcode,

    /// Required application argument is absent
    MissingArgument { index: usize },

    /// Integer argument longer than 8 bytes
    InvalidInteger { len: usize },

    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    // ============ Ledger Errors ============
    /// Account is unknown to the ledger
    UnknownAccount { account: Address },

    /// Transfer would leave an account below its minimum balance
    BelowMinimumBalance { account: Address, balance: u64, minimum: u64 },

    /// Group fees do not cover every outer and inner transaction
    InsufficientFee { paid: u64, required: u64 },

    /// State does not fit the declared schema
    StorageSchema { key: &'static str, reason: &'static str },
}

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong invoker for a privileged operation
    Authorization,
    /// Malformed group, wrong destination, insufficient balance, missing record
    Precondition,
    /// Update/delete
    ImmutableOperation,
    /// Undecodable call arguments
    Input,
    /// Checked arithmetic failed
    Arithmetic,
    /// Rejected by the host ledger rather than the contract
    Ledger,
}

impl PoolError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "E001_UNAUTHORIZED",
            Self::InvalidGroupSize { .. } => "E010_GROUP_SIZE",
            Self::MissingPayment { .. } => "E011_MISSING_PAYMENT",
            Self::WrongPaymentReceiver { .. } => "E012_WRONG_RECEIVER",
            Self::InsufficientBalance { .. } => "E020_INSUFFICIENT_BALANCE",
            Self::ExceedsMaximum { .. } => "E021_EXCEEDS_MAXIMUM",
            Self::NotEnrolled { .. } => "E030_NOT_ENROLLED",
            Self::AlreadyEnrolled { .. } => "E033_ALREADY_ENROLLED",
            Self::AlreadyInitialized => "E031_ALREADY_INIT",
            Self::NotInitialized => "E032_NOT_INIT",
            Self::ImmutableOperation { .. } => "E040_IMMUTABLE",
            Self::UnknownOpcode => "E050_UNKNOWN_OPCODE",
            Self::MissingArgument { .. } => "E051_MISSING_ARG",
            Self::InvalidInteger { .. } => "E052_INVALID_INT",
            Self::InvalidInput { .. } => "E053_INVALID_INPUT",
            Self::Overflow => "E060_OVERFLOW",
            Self::Underflow => "E061_UNDERFLOW",
            Self::UnknownAccount { .. } => "E070_UNKNOWN_ACCOUNT",
            Self::BelowMinimumBalance { .. } => "E071_MIN_BALANCE",
            Self::InsufficientFee { .. } => "E072_INSUFFICIENT_FEE",
            Self::StorageSchema { .. } => "E073_SCHEMA",
        }
    }

    /// Where this error sits in the taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::InvalidGroupSize { .. }
            | Self::MissingPayment { .. }
            | Self::WrongPaymentReceiver { .. }
            | Self::InsufficientBalance { .. }
            | Self::ExceedsMaximum { .. }
            | Self::NotEnrolled { .. }
            | Self::AlreadyEnrolled { .. }
            | Self::AlreadyInitialized
            | Self::NotInitialized => ErrorKind::Precondition,
            Self::ImmutableOperation { .. } => ErrorKind::ImmutableOperation,
            Self::UnknownOpcode
            | Self::MissingArgument { .. }
            | Self::InvalidInteger { .. }
            | Self::InvalidInput { .. } => ErrorKind::Input,
            Self::Overflow | Self::Underflow => ErrorKind::Arithmetic,
            Self::UnknownAccount { .. }
            | Self::BelowMinimumBalance { .. }
            | Self::InsufficientFee { .. }
            | Self::StorageSchema { .. } => ErrorKind::Ledger,
        }
    }

    /// Returns true if resubmitting a corrected request can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientBalance { .. } => true, // Wait for contributions
            Self::NotEnrolled { .. } => true,         // Opt in first
            Self::InvalidGroupSize { .. } => true,
            Self::WrongPaymentReceiver { .. } => true,
            Self::InsufficientFee { .. } => true,
            _ => false,
        }
    }
}
