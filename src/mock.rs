//! In-memory node and Electrum server for exercising the resolvers.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ElectrumApi, NodeApi};
use crate::error::{Error, Result};
use crate::model::{Amount, Balance, Block, Height, HistoryItem, Input, Output, Transaction};

pub fn out(value: Amount, address: Option<&str>) -> Output {
    Output {
        value,
        n: 0,
        address: address.map(|a| a.to_owned()),
        script_hex: "".to_owned(),
        script_type: "pubkeyhash".to_owned(),
    }
}

pub fn tx(txid: &str, inputs: Vec<Input>, outputs: Vec<Output>) -> Transaction {
    let outputs = outputs
        .into_iter()
        .enumerate()
        .map(|(n, mut o)| {
            o.n = n as u32;
            o
        })
        .collect();
    Transaction {
        txid: txid.to_owned(),
        hash: txid.to_owned(),
        size: 200,
        vsize: 200,
        weight: 800,
        inputs,
        outputs,
        block_hash: None,
        confirmations: None,
        time: None,
    }
}

pub fn coinbase(txid: &str, outputs: Vec<Output>) -> Transaction {
    tx(txid, vec![Input::coinbase("03a08601")], outputs)
}

pub fn block(hash: &str, height: Height, transactions: Vec<Transaction>) -> Block {
    Block {
        hash: hash.to_owned(),
        height,
        version: 0x20000000,
        time: 1_700_000_000 + height as u64 * 600,
        median_time: None,
        bits: "207fffff".to_owned(),
        nonce: 0,
        difficulty: 1.0,
        merkle_root: "00".to_owned(),
        previous_hash: None,
        next_hash: None,
        confirmations: 1,
        size: 300,
        weight: 1200,
        transactions,
    }
}

#[derive(Default)]
pub struct MockElectrum {
    transactions: HashMap<String, Transaction>,
    histories: HashMap<String, Vec<HistoryItem>>,
    balances: HashMap<String, Balance>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl MockElectrum {
    pub fn new() -> MockElectrum {
        MockElectrum::default()
    }

    pub fn with_tx(mut self, tx: Transaction) -> MockElectrum {
        self.transactions.insert(tx.txid.clone(), tx);
        self
    }

    pub fn with_history(mut self, script_hash: &str, items: &[(&str, i64)]) -> MockElectrum {
        let items = items
            .iter()
            .map(|(tx_hash, height)| HistoryItem {
                tx_hash: tx_hash.to_string(),
                height: *height,
            })
            .collect();
        self.histories.insert(script_hash.to_owned(), items);
        self
    }

    pub fn with_balance(
        mut self,
        script_hash: &str,
        confirmed: Amount,
        unconfirmed: Amount,
    ) -> MockElectrum {
        self.balances.insert(
            script_hash.to_owned(),
            Balance {
                confirmed,
                unconfirmed,
            },
        );
        self
    }

    /// Lookups of `txid` fail with a network error.
    pub fn failing(mut self, txid: &str) -> MockElectrum {
        self.failing.insert(txid.to_owned());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> MockElectrum {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ElectrumApi for MockElectrum {
    async fn get_transaction(&self, txid: &str) -> Result<Transaction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(txid) {
            return Err(Error::Network(format!("connection reset while fetching {txid}")));
        }
        self.transactions.get(txid).cloned().ok_or_else(|| Error::Electrum {
            code: 2,
            message: format!("no such transaction {txid}"),
        })
    }

    async fn get_history(&self, script_hash: &str) -> Result<Vec<HistoryItem>> {
        Ok(self.histories.get(script_hash).cloned().unwrap_or_default())
    }

    async fn get_balance(&self, script_hash: &str) -> Result<Balance> {
        Ok(self.balances.get(script_hash).copied().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockNode {
    height: Height,
    blocks: HashMap<String, Block>,
    hashes: HashMap<Height, String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockNode {
    pub fn new(height: Height) -> MockNode {
        MockNode {
            height,
            ..Default::default()
        }
    }

    pub fn with_block(mut self, block: Block) -> MockNode {
        self.hashes.insert(block.height, block.hash.clone());
        self.blocks.insert(block.hash.clone(), block);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> MockNode {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn get_block_count(&self) -> Result<Height> {
        Ok(self.height)
    }

    async fn get_block_hash(&self, height: Height) -> Result<String> {
        self.hashes.get(&height).cloned().ok_or_else(|| Error::Rpc {
            code: -8,
            message: "Block height out of range".to_owned(),
        })
    }

    async fn get_block(&self, hash: &str) -> Result<Block> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.blocks.get(hash).cloned().ok_or_else(|| Error::Rpc {
            code: -5,
            message: "Block not found".to_owned(),
        })
    }
}
