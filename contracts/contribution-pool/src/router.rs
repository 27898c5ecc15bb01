//! Call Router
//!
//! Maps a raw application call onto the operation it requests:
//!
//! | Call                         | Action                 |
//! |------------------------------|------------------------|
//! | app id 0 (any on-completion) | `Create`               |
//! | OptIn                        | `Enroll`               |
//! | CloseOut                     | `Exit`                 |
//! | ClearState                   | `ClearState`           |
//! | UpdateApplication            | `Update` (rejected)    |
//! | DeleteApplication            | `Delete` (rejected)    |
//! | NoOp `["pay"]`               | `Contribute`           |
//! | NoOp `["withdraw", itob(n)]` | `Withdraw { amount }`  |
//!
//! Any other NoOp opcode is rejected.

use chipin_common::{
    constants::{
        network::{MAX_APP_ARGS, MAX_APP_ARGS_LEN},
        opcodes,
    },
    errors::{PoolError, PoolResult},
    math::btoi,
    types::{ApplicationCall, OnCompletion, PoolAction},
};

/// Decode an application call into a pool action
pub fn decode_call(call: &ApplicationCall) -> PoolResult<PoolAction> {
    check_arg_limits(&call.args)?;

    if call.app_id == 0 {
        return decode_create(call);
    }

    match call.on_completion {
        OnCompletion::OptIn => Ok(PoolAction::Enroll),
        OnCompletion::CloseOut => Ok(PoolAction::Exit),
        OnCompletion::ClearState => Ok(PoolAction::ClearState),
        OnCompletion::UpdateApplication => Ok(PoolAction::Update),
        OnCompletion::DeleteApplication => Ok(PoolAction::Delete),
        OnCompletion::NoOp => decode_noop(&call.args),
    }
}

/// Creation ignores the on-completion action: app id 0 always creates
fn decode_create(call: &ApplicationCall) -> PoolResult<PoolAction> {
    let pool_name = arg(&call.args, 0)?.to_vec();
    let contribution_amount = btoi(arg(&call.args, 1)?)?;

    Ok(PoolAction::Create { pool_name, contribution_amount })
}

fn decode_noop(args: &[Vec<u8>]) -> PoolResult<PoolAction> {
    let opcode = arg(args, 0)?;

    if opcode == opcodes::PAY {
        Ok(PoolAction::Contribute)
    } else if opcode == opcodes::WITHDRAW {
        let amount = btoi(arg(args, 1)?)?;
        Ok(PoolAction::Withdraw { amount })
    } else {
        Err(PoolError::UnknownOpcode)
    }
}

fn arg(args: &[Vec<u8>], index: usize) -> PoolResult<&[u8]> {
    args.get(index)
        .map(Vec::as_slice)
        .ok_or(PoolError::MissingArgument { index })
}

fn check_arg_limits(args: &[Vec<u8>]) -> PoolResult<()> {
    if args.len() > MAX_APP_ARGS {
        return Err(PoolError::InvalidInput {
            param: "args",
            reason: "too many application arguments",
        });
    }

    let total: usize = args.iter().map(Vec::len).sum();
    if total > MAX_APP_ARGS_LEN {
        return Err(PoolError::InvalidInput {
            param: "args",
            reason: "application arguments too large",
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipin_common::math::itob;

    const APP_ID: u64 = 42;
    const ALICE: [u8; 32] = [2u8; 32];

    fn noop(args: Vec<Vec<u8>>) -> ApplicationCall {
        let mut call = ApplicationCall::pay(ALICE, APP_ID);
        call.args = args;
        call
    }

    #[test]
    fn test_decode_create() {
        let call = ApplicationCall::create(ALICE, b"Groceries", 1_000_000);
        assert_eq!(
            decode_call(&call),
            Ok(PoolAction::Create {
                pool_name: b"Groceries".to_vec(),
                contribution_amount: 1_000_000,
            })
        );
    }

    #[test]
    fn test_decode_create_missing_amount() {
        let mut call = ApplicationCall::create(ALICE, b"Groceries", 1);
        call.args.truncate(1);
        assert_eq!(decode_call(&call), Err(PoolError::MissingArgument { index: 1 }));
    }

    #[test]
    fn test_decode_create_short_integer() {
        // Integers shorter than 8 bytes are zero-extended
        let mut call = ApplicationCall::create(ALICE, b"Tiny", 0);
        call.args[1] = vec![0x01, 0x00];
        assert_eq!(
            decode_call(&call),
            Ok(PoolAction::Create { pool_name: b"Tiny".to_vec(), contribution_amount: 256 })
        );
    }

    #[test]
    fn test_decode_create_any_on_completion() {
        for on_completion in [
            OnCompletion::OptIn,
            OnCompletion::CloseOut,
            OnCompletion::UpdateApplication,
            OnCompletion::DeleteApplication,
        ] {
            let mut call = ApplicationCall::create(ALICE, b"Groceries", 1_000_000);
            call.on_completion = on_completion;
            assert_eq!(
                decode_call(&call),
                Ok(PoolAction::Create {
                    pool_name: b"Groceries".to_vec(),
                    contribution_amount: 1_000_000,
                })
            );
        }
    }

    #[test]
    fn test_decode_on_completion() {
        assert_eq!(decode_call(&ApplicationCall::opt_in(ALICE, APP_ID)), Ok(PoolAction::Enroll));
        assert_eq!(decode_call(&ApplicationCall::close_out(ALICE, APP_ID)), Ok(PoolAction::Exit));
        assert_eq!(
            decode_call(&ApplicationCall::clear_state(ALICE, APP_ID)),
            Ok(PoolAction::ClearState)
        );
        assert_eq!(decode_call(&ApplicationCall::update(ALICE, APP_ID)), Ok(PoolAction::Update));
        assert_eq!(decode_call(&ApplicationCall::delete(ALICE, APP_ID)), Ok(PoolAction::Delete));
    }

    #[test]
    fn test_decode_noop_opcodes() {
        assert_eq!(decode_call(&ApplicationCall::pay(ALICE, APP_ID)), Ok(PoolAction::Contribute));
        assert_eq!(
            decode_call(&ApplicationCall::withdraw(ALICE, APP_ID, 1_000_000)),
            Ok(PoolAction::Withdraw { amount: 1_000_000 })
        );
    }

    #[test]
    fn test_decode_unknown_opcode() {
        assert_eq!(decode_call(&noop(vec![b"refund".to_vec()])), Err(PoolError::UnknownOpcode));
        // Opcodes are case sensitive
        assert_eq!(decode_call(&noop(vec![b"PAY".to_vec()])), Err(PoolError::UnknownOpcode));
        assert_eq!(decode_call(&noop(Vec::new())), Err(PoolError::MissingArgument { index: 0 }));
    }

    #[test]
    fn test_decode_withdraw_bad_amount() {
        assert_eq!(
            decode_call(&noop(vec![b"withdraw".to_vec()])),
            Err(PoolError::MissingArgument { index: 1 })
        );
        assert_eq!(
            decode_call(&noop(vec![b"withdraw".to_vec(), vec![0u8; 9]])),
            Err(PoolError::InvalidInteger { len: 9 })
        );
    }

    #[test]
    fn test_argument_limits() {
        let too_many = noop(vec![b"pay".to_vec(); MAX_APP_ARGS + 1]);
        assert!(matches!(decode_call(&too_many), Err(PoolError::InvalidInput { .. })));

        let too_large = noop(vec![b"withdraw".to_vec(), itob(1).to_vec(), vec![0u8; MAX_APP_ARGS_LEN]]);
        assert!(matches!(decode_call(&too_large), Err(PoolError::InvalidInput { .. })));
    }
}
