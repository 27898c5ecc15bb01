//! Call Witness
//!
//! Everything needed to replay one application call away from the ledger:
//! the call itself and the environment the host observed when it ran. A
//! verifier holding the state before and after the call can check that the
//! claimed output is exactly what the pool program produces.
//!
//! ```text
//! IN:  [pool state]  (absent on creation)
//! OUT: [pool state]  == execute(IN, witness.call, witness.env).state
//! ```
//!
//! The environment is the prover's claim. Before replaying, it is held
//! against a [`TxObservation`] the host derives from the transaction
//! itself: creator-only calls need the observed signer, and the holding
//! balance and payments into the pool need native value that actually
//! moves.

use serde::{Deserialize, Serialize};

use chipin_common::{
    errors::{PoolError, PoolResult},
    ledger::{CallEnv, LedgerView},
    math::checked_sum,
    types::{Address, ApplicationCall, GroupTxn, PoolAction, PoolPolicy},
    Vec,
};

use crate::{process_call, router::decode_call, PoolState, Transition};

/// What the enclosing transaction shows, independent of the witness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxObservation {
    /// Account whose signature the transaction carries
    pub signer: Option<Address>,
    /// Native value spent by the transaction
    pub value_in: u64,
    /// Native value created by the transaction
    pub value_out: u64,
}

/// Witness data for one pool operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolWitness {
    pub call: ApplicationCall,
    /// Sender, group and holding balance seen by the host
    pub env: CallEnv,
}

impl PoolWitness {
    pub fn new(call: ApplicationCall, env: CallEnv) -> Self {
        Self { call, env }
    }

    pub fn is_creation(&self) -> bool {
        self.call.app_id == 0
    }

    /// Replay the call against `input`
    ///
    /// Creation starts from an empty pool carrying `policy`; every other
    /// call needs the existing state.
    pub fn replay(&self, input: Option<&PoolState>, policy: PoolPolicy) -> PoolResult<Transition> {
        if !self.is_creation() && self.call.app_id != self.env.app_id {
            return Err(PoolError::InvalidInput {
                param: "app_id",
                reason: "call targets another application",
            });
        }

        match (self.is_creation(), input) {
            (true, None) => process_call(&PoolState::new(policy), &self.call, &self.env),
            (true, Some(_)) => Err(PoolError::AlreadyInitialized),
            (false, Some(state)) => process_call(state, &self.call, &self.env),
            (false, None) => Err(PoolError::NotInitialized),
        }
    }

    /// Hold the claimed environment against what the transaction shows
    ///
    /// - withdraw, update and delete must be signed by `env.sender`
    /// - the holding balance cannot exceed the value spent
    /// - payments into the holding account cannot exceed the value created
    pub fn check_bindings(&self, observed: &TxObservation) -> PoolResult<()> {
        let action = decode_call(&self.call)?;
        if matches!(action, PoolAction::Withdraw { .. } | PoolAction::Update | PoolAction::Delete)
            && observed.signer != Some(self.env.sender)
        {
            return Err(PoolError::Unauthorized {
                expected: observed.signer.unwrap_or([0u8; 32]),
                actual: self.env.sender,
            });
        }

        if self.env.holding_balance > observed.value_in {
            return Err(PoolError::InvalidInput {
                param: "holding_balance",
                reason: "exceeds the value spent by the transaction",
            });
        }

        let holding = self.env.holding_address();
        let paid_in: Vec<u64> = self
            .env
            .group
            .iter()
            .filter_map(GroupTxn::as_payment)
            .filter(|payment| payment.receiver == holding)
            .map(|payment| payment.amount)
            .collect();
        if checked_sum(&paid_in)? > observed.value_out {
            return Err(PoolError::InvalidInput {
                param: "group",
                reason: "payment not backed by transaction value",
            });
        }

        Ok(())
    }

    /// [`Self::verify`] after [`Self::check_bindings`]
    pub fn verify_observed(
        &self,
        observed: &TxObservation,
        input: Option<&PoolState>,
        output: &PoolState,
    ) -> PoolResult<Transition> {
        self.check_bindings(observed)?;
        self.verify(input, output)
    }

    /// Check that `output` is the state this call produces from `input`
    pub fn verify(&self, input: Option<&PoolState>, output: &PoolState) -> PoolResult<Transition> {
        // The policy is fixed at creation and carried by every later state
        let policy = input.map_or(output.policy, |state| state.policy);
        let transition = self.replay(input, policy)?;

        if transition.state != *output {
            return Err(PoolError::InvalidInput {
                param: "output",
                reason: "output state does not match the executed call",
            });
        }

        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipin_common::{
        address::application_address,
        types::{GroupTxn, Payment},
    };

    const APP_ID: u64 = 9;
    const CREATOR: [u8; 32] = [1u8; 32];
    const ALICE: [u8; 32] = [2u8; 32];

    fn created() -> PoolState {
        let witness = PoolWitness::new(
            ApplicationCall::create(CREATOR, b"Trip", 500_000),
            CallEnv::single(APP_ID, CREATOR, 1, 0),
        );
        witness.replay(None, PoolPolicy::default()).unwrap().state
    }

    fn contribution_witness(amount: u64) -> PoolWitness {
        let call = ApplicationCall::pay(ALICE, APP_ID);
        let env = CallEnv::single(APP_ID, ALICE, 3, 0).with_group(vec![
            GroupTxn::from(call.clone()),
            GroupTxn::from(Payment::new(ALICE, application_address(APP_ID), amount)),
        ]);
        PoolWitness::new(call, env)
    }

    #[test]
    fn test_verify_creation() {
        let witness = PoolWitness::new(
            ApplicationCall::create(CREATOR, b"Trip", 500_000),
            CallEnv::single(APP_ID, CREATOR, 1, 0),
        );
        let output = created();

        assert!(witness.verify(None, &output).is_ok());
        assert_eq!(witness.verify(Some(&output), &output), Err(PoolError::AlreadyInitialized));
    }

    #[test]
    fn test_verify_contribution() {
        let input = enrolled();

        let witness = contribution_witness(500_000);
        let honest = witness.replay(Some(&input), input.policy).unwrap().state;
        assert!(witness.verify(Some(&input), &honest).is_ok());

        // Output claims more funds than were paid
        let mut inflated = honest.clone();
        if let Some(config) = inflated.config.as_mut() {
            config.total_funds += 1;
        }
        assert!(matches!(
            witness.verify(Some(&input), &inflated),
            Err(PoolError::InvalidInput { param: "output", .. })
        ));
    }

    fn enrolled() -> PoolState {
        let enroll = PoolWitness::new(
            ApplicationCall::opt_in(ALICE, APP_ID),
            CallEnv::single(APP_ID, ALICE, 2, 0),
        );
        enroll.replay(Some(&created()), PoolPolicy::default()).unwrap().state
    }

    #[test]
    fn test_forged_payment_rejected() {
        let input = enrolled();
        let witness = contribution_witness(500_000);
        let output = witness.replay(Some(&input), input.policy).unwrap().state;

        // No coins move, yet the group claims a payment into the pool
        let nothing_moved = TxObservation::default();
        assert!(matches!(
            witness.verify_observed(&nothing_moved, Some(&input), &output),
            Err(PoolError::InvalidInput { param: "group", .. })
        ));

        let backed = TxObservation { signer: None, value_in: 500_000, value_out: 500_000 };
        assert!(witness.verify_observed(&backed, Some(&input), &output).is_ok());
    }

    #[test]
    fn test_withdraw_needs_observed_signer() {
        let witness = PoolWitness::new(
            ApplicationCall::withdraw(CREATOR, APP_ID, 200_000),
            CallEnv::single(APP_ID, CREATOR, 4, 500_000),
        );
        let funded = TxObservation { signer: Some(CREATOR), value_in: 500_000, value_out: 0 };
        assert!(witness.check_bindings(&funded).is_ok());

        // Claims to be the creator, but Alice signed
        let alice_signed = TxObservation { signer: Some(ALICE), ..funded };
        assert!(matches!(
            witness.check_bindings(&alice_signed),
            Err(PoolError::Unauthorized { expected, actual }) if expected == ALICE && actual == CREATOR
        ));

        let unsigned = TxObservation { signer: None, ..funded };
        assert!(matches!(witness.check_bindings(&unsigned), Err(PoolError::Unauthorized { .. })));
    }

    #[test]
    fn test_inflated_holding_balance_rejected() {
        let witness = PoolWitness::new(
            ApplicationCall::withdraw(CREATOR, APP_ID, 200_000),
            CallEnv::single(APP_ID, CREATOR, 4, 900_000),
        );
        let observed = TxObservation { signer: Some(CREATOR), value_in: 300_000, value_out: 0 };
        assert!(matches!(
            witness.check_bindings(&observed),
            Err(PoolError::InvalidInput { param: "holding_balance", .. })
        ));
    }

    #[test]
    fn test_participant_calls_need_no_signer() {
        let enroll = PoolWitness::new(
            ApplicationCall::opt_in(ALICE, APP_ID),
            CallEnv::single(APP_ID, ALICE, 2, 0),
        );
        assert!(enroll.check_bindings(&TxObservation::default()).is_ok());
    }

    #[test]
    fn test_verify_requires_input_state() {
        let witness = contribution_witness(1);
        assert_eq!(witness.verify(None, &created()), Err(PoolError::NotInitialized));
    }

    #[test]
    fn test_witness_for_other_application() {
        let mut witness = contribution_witness(1);
        witness.env.app_id = APP_ID + 1;
        assert!(matches!(
            witness.replay(Some(&created()), PoolPolicy::default()),
            Err(PoolError::InvalidInput { param: "app_id", .. })
        ));
    }

    #[test]
    fn test_witness_cbor_encoding() {
        let witness = contribution_witness(250_000);

        let mut bytes = Vec::new();
        ciborium::into_writer(&witness, &mut bytes).unwrap();
        let decoded: PoolWitness = ciborium::from_reader(bytes.as_slice()).unwrap();

        assert_eq!(decoded, witness);
    }

    #[test]
    fn test_pool_state_cbor_encoding() {
        let state = created();

        let mut bytes = Vec::new();
        ciborium::into_writer(&state, &mut bytes).unwrap();
        let decoded: PoolState = ciborium::from_reader(bytes.as_slice()).unwrap();

        assert_eq!(decoded, state);
    }
}
