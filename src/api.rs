use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Balance, Block, Height, HistoryItem, Transaction};

/// Full node queries the resolvers depend on.
#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn get_block_count(&self) -> Result<Height>;
    async fn get_block_hash(&self, height: Height) -> Result<String>;
    /// `getblock` with verbosity 2, transactions already normalized
    async fn get_block(&self, hash: &str) -> Result<Block>;
}

/// Electrum server queries the resolvers depend on.
#[async_trait]
pub trait ElectrumApi: Send + Sync {
    async fn get_transaction(&self, txid: &str) -> Result<Transaction>;
    async fn get_history(&self, script_hash: &str) -> Result<Vec<HistoryItem>>;
    async fn get_balance(&self, script_hash: &str) -> Result<Balance>;
}
