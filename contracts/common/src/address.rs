//! Address Derivation
//!
//! An application holds funds in an account whose address is derived from
//! its id, so nobody holds a private key for it and only the application's
//! inner transactions can move its balance.

use sha2::{Digest, Sha512_256};

use crate::constants::network::APP_ADDRESS_PREFIX;
use crate::types::{Address, AppId};

/// Holding address of an application: `SHA-512/256("appID" || be64(app_id))`
pub fn application_address(app_id: AppId) -> Address {
    let mut hasher = Sha512_256::new();
    hasher.update(APP_ADDRESS_PREFIX);
    hasher.update(app_id.to_be_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}
