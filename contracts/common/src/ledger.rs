//! Ledger View
//!
//! The primitives a pool handler reads from its host while executing one
//! application call. Handlers never write through this trait: their
//! effects come back as a transition that the host commits or discards.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::address::application_address;
use crate::types::{Address, AppId, GroupTxn};
use crate::Vec;

/// Read-only view of the ledger from inside an application call
pub trait LedgerView {
    /// Application being called (0 during creation)
    fn app_id(&self) -> AppId;

    /// Account that signed the application call
    fn sender(&self) -> Address;

    /// Current round, stamped on emitted events
    fn round(&self) -> u64;

    /// Number of transactions in the atomic group
    fn group_size(&self) -> usize;

    /// Transaction at `index` in the atomic group
    fn group_txn(&self, index: usize) -> Option<&GroupTxn>;

    /// Live balance of the application's holding account
    fn holding_balance(&self) -> u64;

    /// Address of the application's holding account
    fn holding_address(&self) -> Address {
        application_address(self.app_id())
    }
}

/// Snapshot of everything a handler may read, captured by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CallEnv {
    pub app_id: AppId,
    pub sender: Address,
    pub round: u64,
    pub group: Vec<GroupTxn>,
    pub holding_balance: u64,
}

impl CallEnv {
    /// Environment for a call travelling alone
    pub fn single(app_id: AppId, sender: Address, round: u64, holding_balance: u64) -> Self {
        Self {
            app_id,
            sender,
            round,
            group: Vec::new(),
            holding_balance,
        }
    }

    /// Attach the atomic group the call belongs to
    pub fn with_group(mut self, group: Vec<GroupTxn>) -> Self {
        self.group = group;
        self
    }
}

impl LedgerView for CallEnv {
    fn app_id(&self) -> AppId {
        self.app_id
    }

    fn sender(&self) -> Address {
        self.sender
    }

    fn round(&self) -> u64 {
        self.round
    }

    fn group_size(&self) -> usize {
        // A lone transaction is a group of one
        self.group.len().max(1)
    }

    fn group_txn(&self, index: usize) -> Option<&GroupTxn> {
        self.group.get(index)
    }

    fn holding_balance(&self) -> u64 {
        self.holding_balance
    }
}
