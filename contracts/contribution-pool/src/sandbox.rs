//! In-Process Ledger
//!
//! A small ledger that hosts one pool application: account balances, the
//! minimum balance rule, per-transaction fees with fee pooling, and atomic
//! groups. Used by tests and local scenarios.
//!
//! Groups run one transaction at a time against copies of the balances and
//! the pool state. Only a fully accepted group is written back, so a failing
//! app call also undoes the payment it was grouped with.

use chipin_common::{
    address::application_address,
    constants::network::{MAX_GROUP_SIZE, MIN_BALANCE, MIN_TXN_FEE},
    errors::{PoolError, PoolResult},
    events::EventLog,
    ledger::CallEnv,
    math::{checked_credit, checked_debit, checked_sum},
    types::{Address, AppId, ApplicationCall, GroupTxn, InnerPayment, Payment, PoolPolicy},
    BTreeMap, Vec,
};

use crate::{process_call, PoolState};

/// Outcome of a committed group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReceipt {
    /// Round the group was committed in
    pub round: u64,
    /// Application created by the group, if any
    pub created_app: Option<AppId>,
    /// Payments issued by the application
    pub inner_payments: Vec<InnerPayment>,
    pub events: EventLog,
}

/// Working copy of everything a group may change
struct Pending {
    balances: BTreeMap<Address, u64>,
    app: Option<(AppId, PoolState)>,
    created_app: Option<AppId>,
    inner_payments: Vec<InnerPayment>,
    events: EventLog,
}

/// Single-application ledger
#[derive(Debug, Clone)]
pub struct Sandbox {
    round: u64,
    balances: BTreeMap<Address, u64>,
    app: Option<(AppId, PoolState)>,
    next_app_id: AppId,
    policy: PoolPolicy,
    events: EventLog,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_policy(PoolPolicy::default())
    }

    /// Ledger whose pool will be created with `policy`
    pub fn with_policy(policy: PoolPolicy) -> Self {
        Self {
            round: 1,
            balances: BTreeMap::new(),
            app: None,
            next_app_id: 1,
            policy,
            events: EventLog::new(),
        }
    }

    /// Credit an account outside of any transaction
    pub fn fund(&mut self, account: Address, amount: u64) -> PoolResult<()> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = checked_credit(*balance, amount)?;
        Ok(())
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn app_id(&self) -> Option<AppId> {
        self.app.as_ref().map(|(app_id, _)| *app_id)
    }

    pub fn holding_address(&self) -> Option<Address> {
        self.app_id().map(application_address)
    }

    /// Committed pool state
    pub fn pool(&self) -> Option<&PoolState> {
        self.app.as_ref().map(|(_, state)| state)
    }

    /// Events of every committed group
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Submit a transaction on its own
    pub fn submit(&mut self, txn: impl Into<GroupTxn>) -> PoolResult<GroupReceipt> {
        self.submit_group(Vec::from([txn.into()]))
    }

    /// Submit an atomic group: all transactions commit or none do
    pub fn submit_group(&mut self, group: Vec<GroupTxn>) -> PoolResult<GroupReceipt> {
        if group.is_empty() || group.len() > MAX_GROUP_SIZE {
            return Err(PoolError::InvalidInput {
                param: "group",
                reason: "group must hold 1 to 16 transactions",
            });
        }

        let mut pending = Pending {
            balances: self.balances.clone(),
            app: self.app.clone(),
            created_app: None,
            inner_payments: Vec::new(),
            events: EventLog::new(),
        };

        for txn in &group {
            match txn {
                GroupTxn::Payment(payment) => apply_payment(&mut pending.balances, payment)?,
                GroupTxn::AppCall(call) => self.apply_app_call(&mut pending, call, &group)?,
            }
        }

        // Fee pooling: outer fees pay for the inner transactions too
        let fees: Vec<u64> = group.iter().map(GroupTxn::fee).collect();
        let paid = checked_sum(&fees)?;
        let required = MIN_TXN_FEE.saturating_mul((group.len() + pending.inner_payments.len()) as u64);
        if paid < required {
            return Err(PoolError::InsufficientFee { paid, required });
        }

        // Commit
        let receipt = GroupReceipt {
            round: self.round,
            created_app: pending.created_app,
            inner_payments: pending.inner_payments,
            events: pending.events.clone(),
        };

        self.balances = pending.balances;
        self.app = pending.app;
        if pending.created_app.is_some() {
            self.next_app_id += 1;
        }
        self.events.append(pending.events);
        self.round += 1;

        Ok(receipt)
    }

    fn apply_app_call(
        &self,
        pending: &mut Pending,
        call: &ApplicationCall,
        group: &[GroupTxn],
    ) -> PoolResult<()> {
        debit(&mut pending.balances, &call.sender, call.fee)?;

        let app_id = if call.app_id == 0 {
            if pending.app.is_some() {
                return Err(PoolError::AlreadyInitialized);
            }
            let app_id = self.next_app_id;
            pending.app = Some((app_id, PoolState::new(self.policy)));
            pending.created_app = Some(app_id);
            app_id
        } else {
            match &pending.app {
                Some((app_id, _)) if *app_id == call.app_id => *app_id,
                _ => {
                    return Err(PoolError::InvalidInput {
                        param: "app_id",
                        reason: "unknown application",
                    })
                }
            }
        };

        let holding = application_address(app_id);
        let env = CallEnv::single(
            app_id,
            call.sender,
            self.round,
            pending.balances.get(&holding).copied().unwrap_or(0),
        )
        .with_group(group.to_vec());

        let state = match &pending.app {
            Some((_, state)) => state,
            None => return Err(PoolError::NotInitialized),
        };
        let transition = process_call(state, call, &env)?;

        for inner in &transition.inner_payments {
            apply_payment(
                &mut pending.balances,
                &Payment {
                    sender: holding,
                    receiver: inner.receiver,
                    amount: inner.amount,
                    fee: inner.fee,
                },
            )?;
        }

        pending.app = Some((app_id, transition.state));
        pending.inner_payments.extend(transition.inner_payments);
        pending.events.append(transition.events);

        Ok(())
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_payment(balances: &mut BTreeMap<Address, u64>, payment: &Payment) -> PoolResult<()> {
    let outgoing = checked_credit(payment.amount, payment.fee)?;
    debit(balances, &payment.sender, outgoing)?;

    let balance = balances.entry(payment.receiver).or_insert(0);
    let credited = checked_credit(*balance, payment.amount)?;
    if credited < MIN_BALANCE {
        return Err(PoolError::BelowMinimumBalance {
            account: payment.receiver,
            balance: credited,
            minimum: MIN_BALANCE,
        });
    }
    *balance = credited;

    Ok(())
}

/// Take `amount` from `account`, keeping the minimum balance
fn debit(balances: &mut BTreeMap<Address, u64>, account: &Address, amount: u64) -> PoolResult<()> {
    let balance = balances
        .get_mut(account)
        .ok_or(PoolError::UnknownAccount { account: *account })?;

    let remaining = checked_debit(*balance, amount).map_err(|_| PoolError::InsufficientBalance {
        available: *balance,
        requested: amount,
    })?;
    if remaining < MIN_BALANCE {
        return Err(PoolError::BelowMinimumBalance {
            account: *account,
            balance: remaining,
            minimum: MIN_BALANCE,
        });
    }

    *balance = remaining;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipin_common::constants::network::ONE;

    const ALICE: Address = [2u8; 32];
    const BOB: Address = [3u8; 32];

    fn funded() -> Sandbox {
        let mut sandbox = Sandbox::new();
        sandbox.fund(ALICE, 10 * ONE).unwrap();
        sandbox
    }

    #[test]
    fn test_plain_payment() {
        let mut sandbox = funded();
        let receipt = sandbox.submit(Payment::new(ALICE, BOB, ONE)).unwrap();

        assert_eq!(receipt.round, 1);
        assert_eq!(sandbox.balance(&BOB), ONE);
        assert_eq!(sandbox.balance(&ALICE), 9 * ONE - MIN_TXN_FEE);
        assert_eq!(sandbox.round(), 2);
    }

    #[test]
    fn test_unknown_sender() {
        let mut sandbox = funded();
        assert_eq!(
            sandbox.submit(Payment::new(BOB, ALICE, 1)),
            Err(PoolError::UnknownAccount { account: BOB })
        );
    }

    #[test]
    fn test_payment_below_minimum_balance() {
        let mut sandbox = funded();

        // New receiver would hold less than the minimum
        let result = sandbox.submit(Payment::new(ALICE, BOB, MIN_BALANCE - 1));
        assert!(matches!(result, Err(PoolError::BelowMinimumBalance { account, .. }) if account == BOB));

        // Sender would drop below the minimum
        let result = sandbox.submit(Payment::new(ALICE, BOB, 10 * ONE - MIN_TXN_FEE));
        assert!(matches!(result, Err(PoolError::BelowMinimumBalance { account, .. }) if account == ALICE));

        assert_eq!(sandbox.balance(&ALICE), 10 * ONE);
        assert_eq!(sandbox.round(), 1);
    }

    #[test]
    fn test_insufficient_fee() {
        let mut sandbox = funded();
        let mut payment = Payment::new(ALICE, BOB, ONE);
        payment.fee = MIN_TXN_FEE - 1;

        assert_eq!(
            sandbox.submit(payment),
            Err(PoolError::InsufficientFee { paid: MIN_TXN_FEE - 1, required: MIN_TXN_FEE })
        );
        assert_eq!(sandbox.balance(&BOB), 0);
    }

    #[test]
    fn test_fee_pooling_across_group() {
        let mut sandbox = funded();
        let mut free = Payment::new(ALICE, BOB, ONE);
        free.fee = 0;
        let mut generous = Payment::new(ALICE, BOB, ONE);
        generous.fee = 2 * MIN_TXN_FEE;

        assert!(sandbox.submit_group(Vec::from([GroupTxn::from(free), GroupTxn::from(generous)])).is_ok());
        assert_eq!(sandbox.balance(&BOB), 2 * ONE);
    }

    #[test]
    fn test_group_size_limits() {
        let mut sandbox = funded();
        assert!(matches!(sandbox.submit_group(Vec::new()), Err(PoolError::InvalidInput { .. })));

        let oversized = vec![GroupTxn::from(Payment::new(ALICE, BOB, ONE)); MAX_GROUP_SIZE + 1];
        assert!(matches!(sandbox.submit_group(oversized), Err(PoolError::InvalidInput { .. })));
    }

    #[test]
    fn test_call_to_unknown_application() {
        let mut sandbox = funded();
        let result = sandbox.submit(ApplicationCall::opt_in(ALICE, 77));
        assert!(matches!(result, Err(PoolError::InvalidInput { param: "app_id", .. })));
    }

    #[test]
    fn test_single_application() {
        let mut sandbox = funded();
        let receipt = sandbox.submit(ApplicationCall::create(ALICE, b"Rent", ONE)).unwrap();
        assert_eq!(receipt.created_app, Some(1));
        assert_eq!(sandbox.holding_address(), Some(application_address(1)));

        assert_eq!(
            sandbox.submit(ApplicationCall::create(ALICE, b"Rent again", ONE)),
            Err(PoolError::AlreadyInitialized)
        );
        assert_eq!(sandbox.app_id(), Some(1));
    }
}
