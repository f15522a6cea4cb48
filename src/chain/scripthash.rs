use sha2::{Digest, Sha256};

use crate::error::Result;

use super::{decode_address, pay_to_address_script, ChainParams};

/// Electrum lookup key for `address`: sha256 of the locking script, byte
/// reversed, hex encoded.
pub fn derive_script_hash(address: &str, params: &ChainParams) -> Result<String> {
    let payload = decode_address(address, params)?;
    let script = pay_to_address_script(&payload)?;
    Ok(script_hash(&script))
}

pub fn script_hash(script: &[u8]) -> String {
    let mut digest: [u8; 32] = Sha256::digest(script).into();
    digest.reverse();
    hex::encode(digest)
}
