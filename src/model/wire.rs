//! Verbose block/transaction shapes as reported by the node (`getblock` with
//! verbosity 2) and by Electrum (`blockchain.transaction.get` verbose, which is
//! the node's own `getrawtransaction` output passed through).

use serde::Deserialize;

use crate::error::{Error, Result};

use super::{Amount, Block, Input, OutPoint, Output, Transaction, COIN, MAX_MONEY};

#[derive(Deserialize)]
pub struct RawBlock {
    pub hash: String,
    pub height: u32,
    #[serde(default)]
    pub version: i64,
    pub time: u64,
    #[serde(rename = "mediantime")]
    pub median_time: Option<u64>,
    #[serde(default)]
    pub bits: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(rename = "merkleroot", default)]
    pub merkle_root: String,
    #[serde(rename = "previousblockhash")]
    pub previous_hash: Option<String>,
    #[serde(rename = "nextblockhash")]
    pub next_hash: Option<String>,
    #[serde(default)]
    pub confirmations: i64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub weight: u64,
    pub tx: Vec<RawTransaction>,
}

#[derive(Deserialize)]
pub struct RawScriptPubKey {
    #[serde(default)]
    pub hex: String,
    #[serde(rename = "type", default)]
    pub r#type: String,
    pub address: Option<String>,
    pub addresses: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct RawIn {
    pub coinbase: Option<String>,
    pub txid: Option<String>,
    pub vout: Option<u32>,
    #[serde(default)]
    pub sequence: u64,
}

#[derive(Deserialize)]
pub struct RawOut {
    pub value: f64,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pubkey: RawScriptPubKey,
}

#[derive(Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub vsize: u64,
    #[serde(default)]
    pub weight: u64,
    pub vin: Vec<RawIn>,
    pub vout: Vec<RawOut>,
    #[serde(rename = "blockhash")]
    pub block_hash: Option<String>,
    pub confirmations: Option<u64>,
    pub time: Option<u64>,
}

/// Converts a coin denominated float into satoshis.
pub fn coins_to_amount(value: f64) -> Result<Amount> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Protocol(format!("invalid amount {value}")));
    }
    let amount = (value * COIN as f64).round();
    if amount > MAX_MONEY as f64 {
        return Err(Error::Protocol(format!("amount {value} exceeds the coin supply")));
    }
    Ok(amount as Amount)
}

impl RawScriptPubKey {
    fn get_address(&self) -> Option<String> {
        if let Some(addr) = &self.address {
            return Some(addr.clone());
        }
        if let Some(addrs) = &self.addresses {
            if let Some(addr) = addrs.first() {
                return Some(addr.clone());
            }
        }
        None
    }
}

impl TryFrom<RawIn> for Input {
    type Error = Error;

    fn try_from(raw: RawIn) -> Result<Self> {
        let previous = match (raw.txid, raw.vout) {
            (Some(txid), _) if txid.is_empty() => None,
            (Some(txid), Some(vout)) => Some(OutPoint { txid, vout }),
            (None, None) => None,
            (txid, vout) => {
                return Err(Error::Protocol(format!(
                    "input has incomplete outpoint (txid {:?}, vout {:?})",
                    txid, vout
                )))
            }
        };
        Ok(Input {
            previous,
            coinbase: raw.coinbase,
            sequence: raw.sequence,
        })
    }
}

impl TryFrom<RawOut> for Output {
    type Error = Error;

    fn try_from(raw: RawOut) -> Result<Self> {
        Ok(Output {
            value: coins_to_amount(raw.value)?,
            n: raw.n,
            address: raw.script_pubkey.get_address(),
            script_hex: raw.script_pubkey.hex,
            script_type: raw.script_pubkey.r#type,
        })
    }
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = Error;

    fn try_from(raw: RawTransaction) -> Result<Self> {
        let inputs = raw
            .vin
            .into_iter()
            .map(Input::try_from)
            .collect::<Result<Vec<_>>>()?;
        let outputs = raw
            .vout
            .into_iter()
            .map(Output::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Transaction {
            hash: raw.hash.unwrap_or_else(|| raw.txid.clone()),
            txid: raw.txid,
            size: raw.size,
            vsize: raw.vsize,
            weight: raw.weight,
            inputs,
            outputs,
            block_hash: raw.block_hash,
            confirmations: raw.confirmations,
            time: raw.time,
        })
    }
}

impl TryFrom<RawBlock> for Block {
    type Error = Error;

    fn try_from(raw: RawBlock) -> Result<Self> {
        let transactions = raw
            .tx
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Block {
            hash: raw.hash,
            height: raw.height,
            version: raw.version,
            time: raw.time,
            median_time: raw.median_time,
            bits: raw.bits,
            nonce: raw.nonce,
            difficulty: raw.difficulty,
            merkle_root: raw.merkle_root,
            previous_hash: raw.previous_hash,
            next_hash: raw.next_hash,
            confirmations: raw.confirmations,
            size: raw.size,
            weight: raw.weight,
            transactions,
        })
    }
}
