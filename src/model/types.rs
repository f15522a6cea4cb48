use serde::Serialize;

use crate::error::{Error, Result};

/// Integral satoshis. Signed so that balance deltas fit the same type.
pub type Amount = i64;
pub type Height = u32;
pub type TxID = String;
pub type Address = String;

pub const COIN: Amount = 100_000_000;
/// No single amount reported by a node can exceed the coin supply.
pub const MAX_MONEY: Amount = 21_000_000 * COIN;

/// Adds up amounts, failing instead of wrapping on overflow.
pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Result<Amount> {
    amounts.into_iter().try_fold(0 as Amount, |total, amount| {
        total
            .checked_add(amount)
            .ok_or_else(|| Error::Protocol(format!("amount overflow adding {amount} to {total}")))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutPoint {
    pub txid: TxID,
    pub vout: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Input {
    /// `None` for the coinbase sentinel
    pub previous: Option<OutPoint>,
    pub coinbase: Option<String>,
    pub sequence: u64,
}

#[cfg(test)]
impl Input {
    pub fn spend(txid: &str, vout: u32) -> Input {
        Input {
            previous: Some(OutPoint {
                txid: txid.to_owned(),
                vout,
            }),
            coinbase: None,
            sequence: u32::MAX as u64,
        }
    }

    pub fn coinbase(data: &str) -> Input {
        Input {
            previous: None,
            coinbase: Some(data.to_owned()),
            sequence: u32::MAX as u64,
        }
    }
}

impl Input {
    pub fn is_coinbase(&self) -> bool {
        self.previous.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub value: Amount,
    pub n: u32,
    /// Empty for scripts without a standard address
    pub address: Option<Address>,
    pub script_hex: String,
    pub script_type: String,
}

impl Output {
    pub fn is_owned_by(&self, address: &str) -> bool {
        self.address.as_deref() == Some(address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub txid: TxID,
    pub hash: String,
    pub size: u64,
    pub vsize: u64,
    pub weight: u64,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub block_hash: Option<String>,
    pub confirmations: Option<u64>,
    pub time: Option<u64>,
}

impl Transaction {
    /// A reward transaction has exactly one input and that input spends nothing.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    pub fn output_value(&self) -> Result<Amount> {
        checked_sum(self.outputs.iter().map(|o| o.value))
    }

    pub fn output(&self, vout: u32) -> Option<&Output> {
        self.outputs.get(vout as usize)
    }
}

/// Header fields are passed through as the node reports them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub hash: String,
    pub height: Height,
    pub version: i64,
    pub time: u64,
    pub median_time: Option<u64>,
    pub bits: String,
    pub nonce: u64,
    pub difficulty: f64,
    pub merkle_root: String,
    pub previous_hash: Option<String>,
    pub next_hash: Option<String>,
    pub confirmations: i64,
    pub size: u64,
    pub weight: u64,
    pub transactions: Vec<Transaction>,
}

/// Block-wide sums, recomputed on every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockEconomics {
    pub reward: Amount,
    pub fees: Amount,
    pub value: Amount,
}

/// The output an input spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPrevout {
    pub value: Amount,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub confirmed: Amount,
    pub unconfirmed: Amount,
}

/// One entry of `blockchain.scripthash.get_history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub tx_hash: TxID,
    /// 0 or -1 while the transaction sits in the mempool
    pub height: i64,
}

impl HistoryItem {
    pub fn confirmed_height(&self) -> Option<Height> {
        if self.height > 0 {
            Height::try_from(self.height).ok()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressHistoryEntry {
    pub transaction: Transaction,
    /// Aligned with `transaction.inputs`, `None` for the coinbase sentinel
    pub prevouts: Vec<Option<ResolvedPrevout>>,
    pub height: Option<Height>,
    pub confirmations: u32,
    pub balance_change: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceHistoryPoint {
    pub height: Height,
    pub balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressHistory {
    pub address: Address,
    pub script_hash: String,
    pub current_height: Height,
    /// Confirmed entries, newest first
    pub entries: Vec<AddressHistoryEntry>,
    pub unconfirmed: Vec<AddressHistoryEntry>,
    /// Oldest first
    pub balance_history: Vec<BalanceHistoryPoint>,
    pub balance: Balance,
}
