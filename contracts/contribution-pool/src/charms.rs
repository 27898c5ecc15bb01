//! Charms SDK Integration for the Contribution Pool
//!
//! Bridges Charms transactions to the pool program. The pool state travels
//! as a charm: a call spends the current state charm and recreates it with
//! the state the call produces.
//!
//! ```text
//! Create:
//!   IN:  []
//!   OUT: [Pool state charm]
//!
//! Enroll / pay / withdraw / exit / clear state:
//!   IN:  [Pool state charm]
//!   OUT: [Pool state charm (after the call)]
//! ```
//!
//! The witness carries the application call and the environment it ran in
//! (sender, atomic group, holding balance). That environment is only
//! trusted as far as the transaction backs it: the signer is the owner of
//! the spent pool state, and native value comes from `coin_ins` and
//! `coin_outs`. Update and delete calls decode fine but are always
//! rejected by the program.

use charms_data::{App, Data, Transaction};
use chipin_common::types::Address;

use crate::{
    witness::{PoolWitness, TxObservation},
    PoolState,
};

/// Validates a pool operation within a Charms transaction.
///
/// # Arguments
/// * `app` - The pool app definition
/// * `tx` - The transaction being validated
/// * `_x` - Public inputs (unused)
/// * `w` - Witness data ([`PoolWitness`])
///
/// # Returns
/// `true` if the output state is exactly what the call produces
pub fn validate_pool_operation(app: &App, tx: &Transaction, _x: &Data, w: &Data) -> bool {
    // 1. Parse witness
    let witness = match parse_witness(w) {
        Some(w) => w,
        None => return false,
    };

    // 2. Input state is absent only on creation
    let input_state = extract_input_state(app, tx);

    // 3. Output state is always required
    let output_state = match extract_output_state(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // 4. What the transaction itself shows
    let observed = observe(tx, input_state.as_ref());

    // 5. Bind the claimed environment, then replay and compare
    witness
        .verify_observed(&observed, input_state.as_ref(), &output_state)
        .is_ok()
}

fn observe(tx: &Transaction, input_state: Option<&PoolState>) -> TxObservation {
    let (value_in, value_out) = calculate_native_flows(tx);

    TxObservation {
        signer: extract_signer(input_state),
        value_in,
        value_out,
    }
}

// ============ Parsing Functions ============

fn parse_witness(w: &Data) -> Option<PoolWitness> {
    w.value::<PoolWitness>().ok()
}

// ============ State Extraction ============

fn extract_input_state(app: &App, tx: &Transaction) -> Option<PoolState> {
    tx.ins.iter().find_map(|(_, charms)| {
        charms.get(app).and_then(|data| data.value::<PoolState>().ok())
    })
}

fn extract_output_state(app: &App, tx: &Transaction) -> Option<PoolState> {
    tx.outs
        .iter()
        .find_map(|charms| charms.get(app).and_then(|data| data.value::<PoolState>().ok()))
}

/// The pool state is held by the creator, so spending it carries the
/// creator's signature. Nothing is signed on creation.
fn extract_signer(input_state: Option<&PoolState>) -> Option<Address> {
    input_state
        .and_then(|state| state.config.as_ref())
        .map(|config| config.creator)
}

/// Calculate total native value flowing in and out
fn calculate_native_flows(tx: &Transaction) -> (u64, u64) {
    let inputs = tx
        .coin_ins
        .as_ref()
        .map(|ins| ins.iter().fold(0u64, |acc, o| acc.saturating_add(o.amount)))
        .unwrap_or(0);

    let outputs = tx
        .coin_outs
        .as_ref()
        .map(|outs| outs.iter().fold(0u64, |acc, o| acc.saturating_add(o.amount)))
        .unwrap_or(0);

    (inputs, outputs)
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chipin_common::{
        address::application_address,
        errors::PoolError,
        ledger::CallEnv,
        types::{ApplicationCall, GroupTxn, Payment, PoolPolicy},
    };

    const APP_ID: u64 = 3;
    const CREATOR: [u8; 32] = [1u8; 32];
    const ALICE: [u8; 32] = [2u8; 32];

    fn create_empty_tx() -> Transaction {
        Transaction {
            ins: Vec::new(),
            refs: Vec::new(),
            outs: Vec::new(),
            coin_ins: None,
            coin_outs: None,
            prev_txs: BTreeMap::new(),
            app_public_inputs: BTreeMap::new(),
        }
    }

    fn enrolled_pool() -> PoolState {
        let create = PoolWitness::new(
            ApplicationCall::create(CREATOR, b"Trip", 500_000),
            CallEnv::single(APP_ID, CREATOR, 1, 0),
        );
        let created = create.replay(None, PoolPolicy::default()).unwrap().state;

        let enroll = PoolWitness::new(
            ApplicationCall::opt_in(ALICE, APP_ID),
            CallEnv::single(APP_ID, ALICE, 2, 0),
        );
        enroll.replay(Some(&created), created.policy).unwrap().state
    }

    #[test]
    fn test_observe_empty_transaction() {
        let state = enrolled_pool();
        let observed = observe(&create_empty_tx(), Some(&state));

        assert_eq!(observed.signer, Some(CREATOR));
        assert_eq!(observed.value_in, 0);
        assert_eq!(observed.value_out, 0);
        assert_eq!(observe(&create_empty_tx(), None).signer, None);
    }

    #[test]
    fn test_payment_without_coins_rejected() {
        let input = enrolled_pool();
        let call = ApplicationCall::pay(ALICE, APP_ID);
        let env = CallEnv::single(APP_ID, ALICE, 3, 0).with_group(vec![
            GroupTxn::from(call.clone()),
            GroupTxn::from(Payment::new(ALICE, application_address(APP_ID), 500_000)),
        ]);
        let witness = PoolWitness::new(call, env);
        let output = witness.replay(Some(&input), input.policy).unwrap().state;

        let observed = observe(&create_empty_tx(), Some(&input));
        assert!(matches!(
            witness.verify_observed(&observed, Some(&input), &output),
            Err(PoolError::InvalidInput { param: "group", .. })
        ));
    }

    #[test]
    fn test_witness_serialization() {
        let creator = [1u8; 32];
        let witness = PoolWitness::new(
            ApplicationCall::withdraw(creator, 3, 750_000),
            CallEnv::single(3, creator, 12, 900_000),
        );

        let data = Data::from(&witness);
        let parsed = parse_witness(&data).unwrap();

        assert_eq!(parsed, witness);
    }

    #[test]
    fn test_state_charm_serialization() {
        let state = PoolState::new(PoolPolicy::strict());
        let data = Data::from(&state);

        assert_eq!(data.value::<PoolState>().ok(), Some(state));
    }
}
