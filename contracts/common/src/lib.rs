//! Chipin Common Library
//!
//! Shared types, constants, and utilities for the Chipin contribution pool.
//!
//! ## Execution model
//!
//! The pool contract runs on an account-based ledger with application calls:
//! - **Atomic groups**: an application call may be bundled with payments,
//!   and either every transaction in the group applies or none does
//! - **Global state**: pool metadata, owned by the application
//! - **Local state**: one record per opted-in account
//! - **Inner payments**: outbound transfers issued by the contract itself
//!
//! This crate holds everything the pool contract and its hosts agree on:
//! the typed call surface, the error taxonomy, emitted events, the
//! key-value storage schema, and the read-only ledger view a handler sees.
//!
//! This crate is `no_std` compatible when built without the default
//! `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, vec::Vec};

pub mod address;
pub mod constants;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod math;
pub mod storage;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use address::*;
pub use errors::*;
pub use events::*;
pub use ledger::*;
pub use types::*;
