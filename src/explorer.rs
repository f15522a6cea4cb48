use futures::future::try_join_all;
use log::info;
use serde::Serialize;

use crate::api::{ElectrumApi, NodeApi};
use crate::chain::ChainParams;
use crate::error::Result;
use crate::model::{
    checked_sum, AddressHistory, Amount, Block, BlockEconomics, Height, ResolvedPrevout,
    Transaction,
};
use crate::resolver::{resolve_address_history, resolve_block_economics, PrevoutLookup};

#[derive(Debug, Clone, Serialize)]
pub struct BlockDetail {
    pub block: Block,
    pub economics: BlockEconomics,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub hash: String,
    pub height: Height,
    pub time: u64,
    pub size: u64,
    pub tx_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub prevouts: Vec<Option<ResolvedPrevout>>,
    pub input_value: Amount,
    pub output_value: Amount,
    pub fee: Amount,
}

/// Everything a request needs: both upstream clients, the network's address
/// rules and the cap on concurrent Electrum lookups.
pub struct Explorer<N, E> {
    node: N,
    electrum: E,
    params: ChainParams,
    max_in_flight: usize,
}

impl<N: NodeApi, E: ElectrumApi> Explorer<N, E> {
    pub fn new(node: N, electrum: E, params: ChainParams, max_in_flight: usize) -> Self {
        Explorer {
            node,
            electrum,
            params,
            max_in_flight,
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub async fn chain_height(&self) -> Result<Height> {
        self.node.get_block_count().await
    }

    pub async fn block_by_hash(&self, hash: &str) -> Result<BlockDetail> {
        let block = self.node.get_block(hash).await?;
        let economics =
            resolve_block_economics(&self.electrum, &block.transactions, self.max_in_flight)
                .await?;
        info!(
            "block {} at height {}: {} tx(s), reward {}, fees {}",
            block.hash,
            block.height,
            block.transactions.len(),
            economics.reward,
            economics.fees
        );
        Ok(BlockDetail { block, economics })
    }

    pub async fn block_by_height(&self, height: Height) -> Result<BlockDetail> {
        let hash = self.node.get_block_hash(height).await?;
        self.block_by_hash(&hash).await
    }

    /// Header summaries of the `count` newest blocks, tip first.
    pub async fn latest_blocks(&self, count: u32) -> Result<Vec<BlockSummary>> {
        let tip = self.node.get_block_count().await?;
        let summaries: Vec<_> = (0..count)
            .map_while(|i| tip.checked_sub(i))
            .map(|height| self.block_summary(height))
            .collect();
        try_join_all(summaries).await
    }

    async fn block_summary(&self, height: Height) -> Result<BlockSummary> {
        let hash = self.node.get_block_hash(height).await?;
        let block = self.node.get_block(&hash).await?;
        Ok(BlockSummary {
            hash: block.hash,
            height: block.height,
            time: block.time,
            size: block.size,
            tx_count: block.transactions.len(),
        })
    }

    pub async fn transaction(&self, txid: &str) -> Result<TransactionDetail> {
        let lookup = PrevoutLookup::new(&self.electrum, self.max_in_flight);
        let transaction = lookup.fetch_transaction(txid).await?;
        let prevouts = lookup.resolve_inputs(&transaction).await?;
        let output_value = transaction.output_value()?;
        let input_value = checked_sum(prevouts.iter().flatten().map(|p| p.value))?;
        let fee = if transaction.is_coinbase() {
            0
        } else {
            input_value - output_value
        };
        Ok(TransactionDetail {
            transaction,
            prevouts,
            input_value,
            output_value,
            fee,
        })
    }

    pub async fn address(&self, address: &str) -> Result<AddressHistory> {
        let history = resolve_address_history(
            &self.node,
            &self.electrum,
            &self.params,
            address,
            self.max_in_flight,
        )
        .await?;
        info!(
            "address {}: {} confirmed and {} unconfirmed tx(s)",
            address,
            history.entries.len(),
            history.unconfirmed.len()
        );
        Ok(history)
    }
}
