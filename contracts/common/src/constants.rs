//! Protocol Constants
//!
//! Opcodes, storage keys, schema sizes and ledger parameters for the
//! contribution pool.
//!
//! # Withdrawal guard
//!
//! Use the `strict-withdraw` feature to make [`policy::DEFAULT_WITHDRAW_GUARD`]
//! check withdrawals against the tracked pool total instead of the holding
//! account's live balance:
//!
//! ```toml
//! chipin-common = { path = "...", features = ["strict-withdraw"] }
//! ```

/// Application call opcodes (first application argument of a NoOp call)
pub mod opcodes {
    /// Contribute to the pool (paired with a payment to the holding account)
    pub const PAY: &[u8] = b"pay";
    /// Creator withdraws funds from the holding account
    pub const WITHDRAW: &[u8] = b"withdraw";
}

/// Storage keys, as they appear in the application's key-value state
pub mod keys {
    // Global state
    pub const CREATOR: &[u8] = b"Creator";
    pub const POOL_NAME: &[u8] = b"PoolName";
    pub const CONTRIBUTION_AMOUNT: &[u8] = b"ContributionAmount";
    pub const TOTAL_FUNDS: &[u8] = b"TotalFunds";

    // Local (per-participant) state
    pub const HAS_PAID: &[u8] = b"HasPaid";
    pub const AMOUNT_PAID: &[u8] = b"AmountPaid";
}

/// State schema declared when the application is created
pub mod schema {
    /// ContributionAmount, TotalFunds
    pub const GLOBAL_NUM_UINTS: u8 = 2;
    /// Creator, PoolName
    pub const GLOBAL_NUM_BYTE_SLICES: u8 = 2;
    /// HasPaid, AmountPaid
    pub const LOCAL_NUM_UINTS: u8 = 2;
    pub const LOCAL_NUM_BYTE_SLICES: u8 = 0;

    /// Maximum length of a state key
    pub const MAX_KEY_LEN: usize = 64;
    /// Maximum combined length of a key and a byte-slice value
    pub const MAX_KEY_VALUE_LEN: usize = 128;
}

/// Atomic group layout for a contribution
pub mod group {
    /// The `pay` call must travel in a group of exactly this size
    pub const CONTRIBUTE_GROUP_SIZE: usize = 2;
    /// Position of the accompanying payment inside the group
    pub const PAYMENT_INDEX: usize = 1;
}

/// Ledger parameters used by the sandbox host
pub mod network {
    /// Base units per whole coin (6 decimals)
    pub const ONE: u64 = 1_000_000;

    /// Minimum balance every funded account must keep (0.1 coin)
    pub const MIN_BALANCE: u64 = 100_000;

    /// Minimum fee per transaction, inner transactions included
    pub const MIN_TXN_FEE: u64 = 1_000;

    /// Maximum number of transactions in one atomic group
    pub const MAX_GROUP_SIZE: usize = 16;

    /// Maximum number of application arguments
    pub const MAX_APP_ARGS: usize = 16;

    /// Maximum combined size of all application arguments
    pub const MAX_APP_ARGS_LEN: usize = 2048;

    /// Domain prefix hashed with the app id to derive its holding address
    pub const APP_ADDRESS_PREFIX: &[u8] = b"appID";
}

/// Implementation policy defaults
pub mod policy {
    use crate::types::WithdrawGuard;

    /// Which bound a withdrawal is checked against
    #[cfg(feature = "strict-withdraw")]
    pub const DEFAULT_WITHDRAW_GUARD: WithdrawGuard = WithdrawGuard::TrackedFunds;
    #[cfg(not(feature = "strict-withdraw"))]
    pub const DEFAULT_WITHDRAW_GUARD: WithdrawGuard = WithdrawGuard::HoldingBalance;
}
