//! Contribution Pool Contract
//!
//! A group of participants each chip in a fixed amount toward a shared
//! pool. Funds sit in the application's holding account and only the
//! pool's creator can withdraw them.
//!
//! ## Execution Model
//!
//! Every application call is decoded by the [`router`] into a
//! [`PoolAction`] and run by a handler against a working copy of the
//! [`PoolState`]. A handler either succeeds and yields a [`Transition`]
//! (new state, inner payments, events) or fails and leaves nothing behind:
//!
//! ```text
//! ApplicationCall --router--> PoolAction --execute--> Transition | PoolError
//!                                             ^
//!                           LedgerView (sender, group, holding balance)
//! ```
//!
//! The host commits a transition together with the rest of the atomic
//! group. [`sandbox::Sandbox`] is an in-process host; with the `charms`
//! feature the [`charms`] module validates transitions inside a spell.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod router;
pub mod sandbox;
pub mod witness;

// Charms SDK integration (conditional compilation)
#[cfg(feature = "charms")]
pub mod charms;


use chipin_common::{
    constants::group::{CONTRIBUTE_GROUP_SIZE, PAYMENT_INDEX},
    errors::{PoolError, PoolResult},
    events::{EventLog, PoolEvent},
    ledger::LedgerView,
    math::{checked_credit, checked_debit},
    storage::{self, KeyValueStore, StateSchema},
    types::{
        Address, ApplicationCall, InnerPayment, ParticipantRecord, PoolAction, PoolConfig,
        PoolPolicy, PoolSummary, WithdrawGuard,
    },
    validation::{
        check, require_creator, require_group_size, require_payment_to_holding,
        require_sufficient_balance, require_within_maximum,
    },
    BTreeMap, Vec,
};

// ============ Pool State ============

/// Complete state of one pool application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolState {
    /// Global state, `None` until the creation call commits
    pub config: Option<PoolConfig>,
    /// Local state of every opted-in account
    pub participants: BTreeMap<Address, ParticipantRecord>,
    /// Implementation policy, fixed with the program
    pub policy: PoolPolicy,
}

impl PoolState {
    /// Uninitialized state, waiting for its creation call
    pub fn new(policy: PoolPolicy) -> Self {
        Self {
            config: None,
            participants: BTreeMap::new(),
            policy,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Pool metadata, or `NotInitialized`
    pub fn config(&self) -> PoolResult<&PoolConfig> {
        self.config.as_ref().ok_or(PoolError::NotInitialized)
    }

    pub fn participant(&self, account: &Address) -> Option<&ParticipantRecord> {
        self.participants.get(account)
    }

    pub fn is_enrolled(&self, account: &Address) -> bool {
        self.participants.contains_key(account)
    }

    /// Whether `account` is enrolled and has paid in full
    pub fn has_paid(&self, account: &Address) -> bool {
        self.participant(account).is_some_and(|record| record.has_paid)
    }

    /// Amount `account` still owes, 0 once paid in full
    pub fn outstanding(&self, account: &Address) -> PoolResult<u64> {
        let config = self.config()?;
        let record = self
            .participant(account)
            .ok_or(PoolError::NotEnrolled { account: *account })?;
        Ok(record.outstanding(config.contribution_amount))
    }

    /// Read-only overview for dashboards
    pub fn summary(&self) -> PoolResult<PoolSummary> {
        let config = self.config()?;
        let paid_count = self.participants.values().filter(|r| r.has_paid).count();

        Ok(PoolSummary {
            creator: config.creator,
            pool_name: config.pool_name.clone(),
            contribution_amount: config.contribution_amount,
            total_funds: config.total_funds,
            participant_count: saturating_count(self.participants.len()),
            paid_count: saturating_count(paid_count),
        })
    }

    /// Global state as the ledger stores it
    pub fn global_state(&self) -> PoolResult<KeyValueStore> {
        Ok(storage::encode_global(self.config()?))
    }

    /// Local state of `account` as the ledger stores it
    pub fn local_state(&self, account: &Address) -> Option<KeyValueStore> {
        self.participant(account).map(storage::encode_local)
    }

    /// Check the relations between the stored values
    ///
    /// - no participant records before creation
    /// - `has_paid` only once `amount_paid >= contribution_amount`
    /// - any non-zero `amount_paid` reaching the contribution sets `has_paid`
    ///
    /// A fresh record in a zero-contribution pool is `{false, 0}` until its
    /// first payment, so reaching the amount alone does not imply `has_paid`.
    pub fn check_invariants(&self) -> PoolResult<()> {
        let Some(config) = &self.config else {
            if self.participants.is_empty() {
                return Ok(());
            }
            return Err(PoolError::NotInitialized);
        };

        for record in self.participants.values() {
            let reached = record.amount_paid >= config.contribution_amount;
            check!(
                !record.has_paid || reached,
                PoolError::InvalidInput {
                    param: "has_paid",
                    reason: "set before the contribution was reached",
                }
            );
            check!(
                record.has_paid || record.amount_paid == 0 || !reached,
                PoolError::InvalidInput {
                    param: "has_paid",
                    reason: "not set after the contribution was reached",
                }
            );
        }

        Ok(())
    }

    /// Serialize the full state (snapshots, charm payloads)
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

impl Default for PoolState {
    fn default() -> Self {
        Self::new(PoolPolicy::default())
    }
}

// ============ Execution Context ============

/// Working area for one call; dropped on rejection
pub struct PoolContext<'a, L: LedgerView> {
    /// Host view (sender, group, holding balance)
    pub ledger: &'a L,
    /// Working copy of the pool state
    pub state: PoolState,
    /// Payments the host must issue from the holding account
    pub inner_payments: Vec<InnerPayment>,
    /// Event log
    pub events: EventLog,
}

impl<'a, L: LedgerView> PoolContext<'a, L> {
    pub fn new(state: &PoolState, ledger: &'a L) -> Self {
        Self {
            ledger,
            state: state.clone(),
            inner_payments: Vec::new(),
            events: EventLog::new(),
        }
    }

    /// Finish the call, handing its effects to the host
    pub fn into_transition(self) -> Transition {
        Transition {
            state: self.state,
            inner_payments: self.inner_payments,
            events: self.events,
        }
    }
}

/// Effects of an accepted call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: PoolState,
    pub inner_payments: Vec<InnerPayment>,
    pub events: EventLog,
}

// ============ Entry Points ============

/// Decode and execute a raw application call
pub fn process_call<L: LedgerView>(
    state: &PoolState,
    call: &ApplicationCall,
    ledger: &L,
) -> PoolResult<Transition> {
    if call.sender != ledger.sender() {
        return Err(PoolError::InvalidInput {
            param: "sender",
            reason: "call sender differs from the signing account",
        });
    }

    let action = router::decode_call(call)?;
    execute(state, &action, ledger)
}

/// Execute a decoded action against a working copy of `state`
pub fn execute<L: LedgerView>(
    state: &PoolState,
    action: &PoolAction,
    ledger: &L,
) -> PoolResult<Transition> {
    let mut ctx = PoolContext::new(state, ledger);
    validate(&mut ctx, action)?;
    Ok(ctx.into_transition())
}

/// Main dispatch over the fixed operation set
pub fn validate<L: LedgerView>(ctx: &mut PoolContext<'_, L>, action: &PoolAction) -> PoolResult<()> {
    match action {
        PoolAction::Create { pool_name, contribution_amount } => {
            handle_create(ctx, pool_name, *contribution_amount)
        }
        PoolAction::Enroll => handle_enroll(ctx),
        PoolAction::Contribute => handle_contribute(ctx),
        PoolAction::Withdraw { amount } => handle_withdraw(ctx, *amount),
        PoolAction::Exit => handle_exit(ctx),
        PoolAction::ClearState => handle_clear_state(ctx),
        PoolAction::Update | PoolAction::Delete => Err(PoolError::ImmutableOperation {
            operation: action.operation(),
        }),
    }
}

/// Narrow a count for [`PoolSummary`], pinning at `u32::MAX`
fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

// ============ Handlers ============

/// Instantiate the pool
fn handle_create<L: LedgerView>(
    ctx: &mut PoolContext<'_, L>,
    pool_name: &[u8],
    contribution_amount: u64,
) -> PoolResult<()> {
    // 1. Only once per application
    check!(!ctx.state.is_initialized(), PoolError::AlreadyInitialized);

    // 2. Optional sanity bound
    require_within_maximum(contribution_amount, ctx.state.policy.max_contribution_amount)?;

    // 3. Creator is whoever signs the creation call
    let creator = ctx.ledger.sender();
    let config = PoolConfig::new(creator, pool_name.to_vec(), contribution_amount);

    // 4. Global state must fit the declared schema
    StateSchema::GLOBAL.validate(&storage::encode_global(&config))?;

    ctx.state.config = Some(config);

    ctx.events.emit(PoolEvent::PoolCreated {
        app_id: ctx.ledger.app_id(),
        creator,
        pool_name: pool_name.to_vec(),
        contribution_amount,
        round: ctx.ledger.round(),
    });

    Ok(())
}

/// Opt in: start tracking the sender's payments from zero
fn handle_enroll<L: LedgerView>(ctx: &mut PoolContext<'_, L>) -> PoolResult<()> {
    ctx.state.config()?;

    let account = ctx.ledger.sender();
    check!(!ctx.state.is_enrolled(&account), PoolError::AlreadyEnrolled { account });

    ctx.state.participants.insert(account, ParticipantRecord::new());

    ctx.events.emit(PoolEvent::ParticipantEnrolled {
        account,
        round: ctx.ledger.round(),
    });

    Ok(())
}

/// Credit the payment travelling in the same group
fn handle_contribute<L: LedgerView>(ctx: &mut PoolContext<'_, L>) -> PoolResult<()> {
    // 1. Exactly [app call, payment]
    require_group_size(ctx.ledger, CONTRIBUTE_GROUP_SIZE)?;

    // 2. The payment goes to this pool's holding account
    let payment = require_payment_to_holding(ctx.ledger, PAYMENT_INDEX)?;

    let account = ctx.ledger.sender();
    let round = ctx.ledger.round();
    let config = ctx.state.config.as_mut().ok_or(PoolError::NotInitialized)?;

    // 3. Sender must be enrolled
    let record = ctx
        .state
        .participants
        .get_mut(&account)
        .ok_or(PoolError::NotEnrolled { account })?;

    // 4. Compute everything before writing anything
    let amount_paid = checked_credit(record.amount_paid, payment.amount)?;
    let total_funds = checked_credit(config.total_funds, payment.amount)?;
    let newly_paid = !record.has_paid && amount_paid >= config.contribution_amount;

    record.amount_paid = amount_paid;
    if amount_paid >= config.contribution_amount {
        record.has_paid = true;
    }
    config.total_funds = total_funds;

    ctx.events.emit(PoolEvent::ContributionReceived {
        account,
        amount: payment.amount,
        amount_paid,
        total_funds,
        round,
    });

    if newly_paid {
        ctx.events.emit(PoolEvent::ParticipantPaidInFull {
            account,
            amount_paid,
            round,
        });
    }

    Ok(())
}

/// Pay `amount` from the holding account to the creator
fn handle_withdraw<L: LedgerView>(ctx: &mut PoolContext<'_, L>, amount: u64) -> PoolResult<()> {
    let sender = ctx.ledger.sender();
    let holding_balance = ctx.ledger.holding_balance();
    let guard = ctx.state.policy.withdraw_guard;
    let config = ctx.state.config.as_mut().ok_or(PoolError::NotInitialized)?;

    // 1. Creator only
    require_creator(&config.creator, &sender)?;

    // 2. Strict policy bounds by the tracked total first
    if guard == WithdrawGuard::TrackedFunds {
        require_sufficient_balance(config.total_funds, amount)?;
    }

    // 3. The holding account must actually hold the amount
    require_sufficient_balance(holding_balance, amount)?;

    // 4. Tracked total can never go below zero
    let total_funds = checked_debit(config.total_funds, amount)?;
    config.total_funds = total_funds;

    // Fee 0: covered by the outer group
    ctx.inner_payments.push(InnerPayment {
        receiver: sender,
        amount,
        fee: 0,
    });

    ctx.events.emit(PoolEvent::FundsWithdrawn {
        creator: sender,
        amount,
        total_funds,
        round: ctx.ledger.round(),
    });

    Ok(())
}

/// Close out; contributed funds stay in the pool
fn handle_exit<L: LedgerView>(ctx: &mut PoolContext<'_, L>) -> PoolResult<()> {
    let record = remove_participant(ctx)?;

    ctx.events.emit(PoolEvent::ParticipantExited {
        account: ctx.ledger.sender(),
        amount_paid: record.amount_paid,
        round: ctx.ledger.round(),
    });

    Ok(())
}

fn handle_clear_state<L: LedgerView>(ctx: &mut PoolContext<'_, L>) -> PoolResult<()> {
    remove_participant(ctx)?;

    ctx.events.emit(PoolEvent::LocalStateCleared {
        account: ctx.ledger.sender(),
        round: ctx.ledger.round(),
    });

    Ok(())
}

fn remove_participant<L: LedgerView>(ctx: &mut PoolContext<'_, L>) -> PoolResult<ParticipantRecord> {
    ctx.state.config()?;

    let account = ctx.ledger.sender();
    ctx.state
        .participants
        .remove(&account)
        .ok_or(PoolError::NotEnrolled { account })
}

// ============ Tests ============
