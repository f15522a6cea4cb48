use bech32::{FromBase32, Variant};

use crate::error::{Error, Result};

use super::ChainParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    PubKeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessProgram { version: u8, program: Vec<u8> },
}

pub fn decode_address(address: &str, params: &ChainParams) -> Result<Payload> {
    let lower = address.to_lowercase();
    let segwit_prefix = format!("{}1", params.bech32_hrp);
    if lower.starts_with(&segwit_prefix) {
        decode_segwit(address, params)
    } else {
        decode_base58(address, params)
    }
}

/// The spelling a node uses for `address` in `scriptPubKey`. Bech32 is case
/// insensitive and always rendered lowercase; base58 is kept as given.
pub fn canonical_address(address: &str, params: &ChainParams) -> Result<String> {
    let canonical = match decode_address(address, params)? {
        Payload::WitnessProgram { .. } => address.to_lowercase(),
        Payload::PubKeyHash(_) | Payload::ScriptHash(_) => address.to_owned(),
    };
    Ok(canonical)
}

fn decode_base58(address: &str, params: &ChainParams) -> Result<Payload> {
    let data = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| Error::address_decode(address, e))?;
    if data.len() != 21 {
        return Err(Error::address_decode(
            address,
            format!("unexpected payload length {}", data.len().saturating_sub(1)),
        ));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&data[1..]);
    let version = data[0];
    if version == params.pubkey_hash_addr_id {
        Ok(Payload::PubKeyHash(hash))
    } else if version == params.script_hash_addr_id {
        Ok(Payload::ScriptHash(hash))
    } else {
        Err(Error::address_decode(
            address,
            format!("version byte {:#04x} does not belong to {}", version, params.name),
        ))
    }
}

fn decode_segwit(address: &str, params: &ChainParams) -> Result<Payload> {
    let (hrp, data, variant) =
        bech32::decode(address).map_err(|e| Error::address_decode(address, e))?;
    if hrp != params.bech32_hrp {
        return Err(Error::address_decode(
            address,
            format!("prefix `{}` does not belong to {}", hrp, params.name),
        ));
    }
    let (version, program) = match data.split_first() {
        Some((version, program)) => (version.to_u8(), program),
        None => return Err(Error::address_decode(address, "empty witness data")),
    };
    let program =
        Vec::<u8>::from_base32(program).map_err(|e| Error::address_decode(address, e))?;

    if version > 16 {
        return Err(Error::address_decode(
            address,
            format!("invalid witness version {version}"),
        ));
    }
    if program.len() < 2 || program.len() > 40 {
        return Err(Error::address_decode(
            address,
            format!("invalid witness program length {}", program.len()),
        ));
    }
    if version == 0 && program.len() != 20 && program.len() != 32 {
        return Err(Error::address_decode(
            address,
            format!("invalid v0 witness program length {}", program.len()),
        ));
    }
    // BIP-350: v0 uses bech32, every later version bech32m
    let expected = if version == 0 {
        Variant::Bech32
    } else {
        Variant::Bech32m
    };
    if variant != expected {
        return Err(Error::address_decode(
            address,
            "checksum variant does not match witness version",
        ));
    }
    Ok(Payload::WitnessProgram { version, program })
}
