//! Core Types for the Contribution Pool
//!
//! Pool state, participant records, the typed call surface and the
//! transaction shapes a pool handler can inspect.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{opcodes, policy};
use crate::math::itob;
use crate::Vec;

/// Type alias for account addresses (32 bytes, ed25519 public key)
pub type Address = [u8; 32];

/// Type alias for application identifiers (0 while being created)
pub type AppId = u64;

// ============ Pool State ============

/// Pool-wide metadata, created once when the application is instantiated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolConfig {
    /// Account that instantiated the pool, never reassigned
    pub creator: Address,
    /// Opaque label
    pub pool_name: Vec<u8>,
    /// Total each participant is expected to contribute
    pub contribution_amount: u64,
    /// Funds currently accounted to the pool
    pub total_funds: u64,
}

impl PoolConfig {
    pub fn new(creator: Address, pool_name: Vec<u8>, contribution_amount: u64) -> Self {
        Self {
            creator,
            pool_name,
            contribution_amount,
            total_funds: 0,
        }
    }
}

/// Enrollment and payment progress of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ParticipantRecord {
    /// True once `amount_paid >= contribution_amount`
    pub has_paid: bool,
    /// Cumulative contribution while enrolled
    pub amount_paid: u64,
}

impl ParticipantRecord {
    /// Fresh record for a newly (re-)enrolled account
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount still owed against the required contribution
    pub fn outstanding(&self, contribution_amount: u64) -> u64 {
        contribution_amount.saturating_sub(self.amount_paid)
    }
}

/// Read-only overview of the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolSummary {
    pub creator: Address,
    pub pool_name: Vec<u8>,
    pub contribution_amount: u64,
    pub total_funds: u64,
    /// Accounts currently enrolled
    pub participant_count: u32,
    /// Enrolled accounts that have paid in full
    pub paid_count: u32,
}

// ============ Policy ============

/// Upper bound a withdrawal is checked against before paying out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum WithdrawGuard {
    /// Live balance of the holding account (may include reserves the
    /// counter never saw); the counter subtraction still has to succeed
    HoldingBalance,
    /// `amount <= total_funds` is checked up front
    TrackedFunds,
}

/// Implementation choices layered on top of the contract rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolPolicy {
    pub withdraw_guard: WithdrawGuard,
    /// Optional sanity bound on `contribution_amount` at creation
    pub max_contribution_amount: Option<u64>,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            withdraw_guard: policy::DEFAULT_WITHDRAW_GUARD,
            max_contribution_amount: None,
        }
    }
}

impl PoolPolicy {
    /// Policy that checks withdrawals against the tracked total
    pub fn strict() -> Self {
        Self {
            withdraw_guard: WithdrawGuard::TrackedFunds,
            ..Self::default()
        }
    }
}

// ============ Operations ============

/// Operation kinds, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum PoolOperation {
    Create = 0x00,
    Enroll = 0x01,
    Contribute = 0x02,
    Withdraw = 0x03,
    Exit = 0x04,
    ClearState = 0x05,
    Update = 0x06,
    Delete = 0x07,
}

/// Decoded pool call with its typed arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolAction {
    /// Instantiate the pool
    Create {
        pool_name: Vec<u8>,
        contribution_amount: u64,
    },
    /// Opt in and start tracking payment progress
    Enroll,
    /// Contribute the payment that travels in the same group
    Contribute,
    /// Creator pays `amount` out of the holding account
    Withdraw { amount: u64 },
    /// Close out of the pool
    Exit,
    /// Forced local state removal
    ClearState,
    /// Replace the application's programs (always rejected)
    Update,
    /// Destroy the application (always rejected)
    Delete,
}

impl PoolAction {
    pub fn operation(&self) -> PoolOperation {
        match self {
            Self::Create { .. } => PoolOperation::Create,
            Self::Enroll => PoolOperation::Enroll,
            Self::Contribute => PoolOperation::Contribute,
            Self::Withdraw { .. } => PoolOperation::Withdraw,
            Self::Exit => PoolOperation::Exit,
            Self::ClearState => PoolOperation::ClearState,
            Self::Update => PoolOperation::Update,
            Self::Delete => PoolOperation::Delete,
        }
    }
}

// ============ Transactions ============

/// What the ledger does with an application call after the program approves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OnCompletion {
    #[default]
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

/// Application call transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ApplicationCall {
    pub sender: Address,
    /// Target application, 0 when creating
    pub app_id: AppId,
    pub on_completion: OnCompletion,
    pub args: Vec<Vec<u8>>,
    pub fee: u64,
}

impl ApplicationCall {
    fn new(sender: Address, app_id: AppId, on_completion: OnCompletion, args: Vec<Vec<u8>>) -> Self {
        Self {
            sender,
            app_id,
            on_completion,
            args,
            fee: crate::constants::network::MIN_TXN_FEE,
        }
    }

    /// Creation call: `[pool_name, itob(contribution_amount)]`
    pub fn create(sender: Address, pool_name: &[u8], contribution_amount: u64) -> Self {
        let mut args = Vec::new();
        args.push(pool_name.to_vec());
        args.push(itob(contribution_amount).to_vec());
        Self::new(sender, 0, OnCompletion::NoOp, args)
    }

    pub fn opt_in(sender: Address, app_id: AppId) -> Self {
        Self::new(sender, app_id, OnCompletion::OptIn, Vec::new())
    }

    /// `pay` call, to be grouped with a payment to the holding address
    pub fn pay(sender: Address, app_id: AppId) -> Self {
        let mut args = Vec::new();
        args.push(opcodes::PAY.to_vec());
        Self::new(sender, app_id, OnCompletion::NoOp, args)
    }

    /// `withdraw` call: `["withdraw", itob(amount)]`
    pub fn withdraw(sender: Address, app_id: AppId, amount: u64) -> Self {
        let mut args = Vec::new();
        args.push(opcodes::WITHDRAW.to_vec());
        args.push(itob(amount).to_vec());
        Self::new(sender, app_id, OnCompletion::NoOp, args)
    }

    pub fn close_out(sender: Address, app_id: AppId) -> Self {
        Self::new(sender, app_id, OnCompletion::CloseOut, Vec::new())
    }

    pub fn clear_state(sender: Address, app_id: AppId) -> Self {
        Self::new(sender, app_id, OnCompletion::ClearState, Vec::new())
    }

    pub fn update(sender: Address, app_id: AppId) -> Self {
        Self::new(sender, app_id, OnCompletion::UpdateApplication, Vec::new())
    }

    pub fn delete(sender: Address, app_id: AppId) -> Self {
        Self::new(sender, app_id, OnCompletion::DeleteApplication, Vec::new())
    }

    /// Override the fee (e.g. to cover an inner payment)
    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }
}

/// Plain value transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Payment {
    pub sender: Address,
    pub receiver: Address,
    pub amount: u64,
    pub fee: u64,
}

impl Payment {
    pub fn new(sender: Address, receiver: Address, amount: u64) -> Self {
        Self {
            sender,
            receiver,
            amount,
            fee: crate::constants::network::MIN_TXN_FEE,
        }
    }
}

/// One member of an atomic group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum GroupTxn {
    AppCall(ApplicationCall),
    Payment(Payment),
}

impl GroupTxn {
    pub fn fee(&self) -> u64 {
        match self {
            Self::AppCall(call) => call.fee,
            Self::Payment(payment) => payment.fee,
        }
    }

    pub fn as_payment(&self) -> Option<&Payment> {
        match self {
            Self::Payment(payment) => Some(payment),
            Self::AppCall(_) => None,
        }
    }
}

impl From<ApplicationCall> for GroupTxn {
    fn from(call: ApplicationCall) -> Self {
        Self::AppCall(call)
    }
}

impl From<Payment> for GroupTxn {
    fn from(payment: Payment) -> Self {
        Self::Payment(payment)
    }
}

/// Payment issued by the contract from its holding account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct InnerPayment {
    pub receiver: Address,
    pub amount: u64,
    /// 0 means the fee is pooled from the outer group
    pub fee: u64,
}
