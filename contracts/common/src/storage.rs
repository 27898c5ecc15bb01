//! Application Key-Value Storage
//!
//! The ledger persists application state as flat key-value maps whose
//! values are either byte slices or uint64s, sized by a schema fixed at
//! creation. This module maps the typed pool state onto those maps.
//!
//! ```text
//! Global:  Creator (bytes)  PoolName (bytes)  ContributionAmount (uint)  TotalFunds (uint)
//! Local:   HasPaid (uint)   AmountPaid (uint)
//! ```

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{keys, schema};
use crate::errors::{PoolError, PoolResult};
use crate::types::{Address, ParticipantRecord, PoolConfig};
use crate::{BTreeMap, Vec};

/// Value stored under a state key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StateValue {
    Bytes(Vec<u8>),
    Uint(u64),
}

/// One key-value state partition
pub type KeyValueStore = BTreeMap<Vec<u8>, StateValue>;

/// Number of values of each kind a partition may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StateSchema {
    pub num_uints: u8,
    pub num_byte_slices: u8,
}

impl StateSchema {
    pub const GLOBAL: StateSchema = StateSchema {
        num_uints: schema::GLOBAL_NUM_UINTS,
        num_byte_slices: schema::GLOBAL_NUM_BYTE_SLICES,
    };

    pub const LOCAL: StateSchema = StateSchema {
        num_uints: schema::LOCAL_NUM_UINTS,
        num_byte_slices: schema::LOCAL_NUM_BYTE_SLICES,
    };

    /// Check a store fits this schema and the ledger's size limits
    pub fn validate(&self, store: &KeyValueStore) -> PoolResult<()> {
        let mut uints = 0usize;
        let mut byte_slices = 0usize;

        for (key, value) in store {
            if key.len() > schema::MAX_KEY_LEN {
                return Err(PoolError::StorageSchema {
                    key: "<key>",
                    reason: "key too long",
                });
            }
            match value {
                StateValue::Uint(_) => uints += 1,
                StateValue::Bytes(bytes) => {
                    byte_slices += 1;
                    if key.len() + bytes.len() > schema::MAX_KEY_VALUE_LEN {
                        return Err(PoolError::StorageSchema {
                            key: key_name(key),
                            reason: "value too long",
                        });
                    }
                }
            }
        }

        if uints > self.num_uints as usize {
            return Err(PoolError::StorageSchema {
                key: "<uints>",
                reason: "too many uint values",
            });
        }
        if byte_slices > self.num_byte_slices as usize {
            return Err(PoolError::StorageSchema {
                key: "<byte slices>",
                reason: "too many byte-slice values",
            });
        }

        Ok(())
    }
}

// ============ Global State ============

/// Encode pool metadata as global state
pub fn encode_global(config: &PoolConfig) -> KeyValueStore {
    let mut store = KeyValueStore::new();
    store.insert(keys::CREATOR.to_vec(), StateValue::Bytes(config.creator.to_vec()));
    store.insert(keys::POOL_NAME.to_vec(), StateValue::Bytes(config.pool_name.clone()));
    store.insert(
        keys::CONTRIBUTION_AMOUNT.to_vec(),
        StateValue::Uint(config.contribution_amount),
    );
    store.insert(keys::TOTAL_FUNDS.to_vec(), StateValue::Uint(config.total_funds));
    store
}

/// Decode global state back into pool metadata
pub fn decode_global(store: &KeyValueStore) -> PoolResult<PoolConfig> {
    StateSchema::GLOBAL.validate(store)?;

    let creator_bytes = get_bytes(store, keys::CREATOR)?;
    let creator: Address = creator_bytes
        .as_slice()
        .try_into()
        .map_err(|_| PoolError::StorageSchema {
            key: "Creator",
            reason: "address must be 32 bytes",
        })?;

    Ok(PoolConfig {
        creator,
        pool_name: get_bytes(store, keys::POOL_NAME)?.clone(),
        contribution_amount: get_uint(store, keys::CONTRIBUTION_AMOUNT)?,
        total_funds: get_uint(store, keys::TOTAL_FUNDS)?,
    })
}

// ============ Local State ============

/// Encode a participant record as local state
pub fn encode_local(record: &ParticipantRecord) -> KeyValueStore {
    let mut store = KeyValueStore::new();
    store.insert(keys::HAS_PAID.to_vec(), StateValue::Uint(record.has_paid as u64));
    store.insert(keys::AMOUNT_PAID.to_vec(), StateValue::Uint(record.amount_paid));
    store
}

/// Decode local state back into a participant record
pub fn decode_local(store: &KeyValueStore) -> PoolResult<ParticipantRecord> {
    StateSchema::LOCAL.validate(store)?;

    Ok(ParticipantRecord {
        has_paid: get_uint(store, keys::HAS_PAID)? != 0,
        amount_paid: get_uint(store, keys::AMOUNT_PAID)?,
    })
}

// ============ Helper Functions ============

fn get_bytes<'a>(store: &'a KeyValueStore, key: &'static [u8]) -> PoolResult<&'a Vec<u8>> {
    match store.get(key) {
        Some(StateValue::Bytes(bytes)) => Ok(bytes),
        Some(StateValue::Uint(_)) => Err(PoolError::StorageSchema {
            key: key_name(key),
            reason: "expected bytes",
        }),
        None => Err(PoolError::StorageSchema {
            key: key_name(key),
            reason: "missing",
        }),
    }
}

fn get_uint(store: &KeyValueStore, key: &'static [u8]) -> PoolResult<u64> {
    match store.get(key) {
        Some(StateValue::Uint(value)) => Ok(*value),
        Some(StateValue::Bytes(_)) => Err(PoolError::StorageSchema {
            key: key_name(key),
            reason: "expected uint",
        }),
        None => Err(PoolError::StorageSchema {
            key: key_name(key),
            reason: "missing",
        }),
    }
}

fn key_name(key: &[u8]) -> &'static str {
    match key {
        k if k == keys::CREATOR => "Creator",
        k if k == keys::POOL_NAME => "PoolName",
        k if k == keys::CONTRIBUTION_AMOUNT => "ContributionAmount",
        k if k == keys::TOTAL_FUNDS => "TotalFunds",
        k if k == keys::HAS_PAID => "HasPaid",
        k if k == keys::AMOUNT_PAID => "AmountPaid",
        _ => "<unknown>",
    }
}
