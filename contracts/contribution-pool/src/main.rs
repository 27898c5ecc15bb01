//! Contribution Pool - Charms App Entry Point
//!
//! Validates contribution pool calls on Bitcoin using client-side
//! validation. Each call spends the pool state charm and recreates it:
//!
//! ```text
//! INS:  [Pool state charm]
//! OUTS: [Pool state charm (after the call)]
//! ```
//!
//! - **Create**: no input charm, output holds the fresh pool
//! - **pay**: enrolled participant's payment, grouped with a transfer to
//!   the holding account
//! - **withdraw**: creator only, paid out from the holding account

use charms_sdk::data::{App, Data, Transaction};

/// Main validation function for contribution pool operations.
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn app_contract(app: &App, tx: &Transaction, x: &Data, w: &Data) -> bool {
    chipin_pool::charms::validate_pool_operation(app, tx, x, w)
}

// Use the Charms SDK main macro to generate the entry point
charms_sdk::main!(app_contract);
