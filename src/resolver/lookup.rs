use futures::future::try_join_all;
use tokio::sync::Semaphore;

use crate::api::ElectrumApi;
use crate::error::{Error, Result};
use crate::model::{Input, OutPoint, ResolvedPrevout, Transaction};

/// Transaction lookups against Electrum shared by all workers of one
/// resolver call. At most `max_in_flight` calls run at the same time.
pub struct PrevoutLookup<'a, E: ElectrumApi + ?Sized> {
    electrum: &'a E,
    permits: Semaphore,
}

impl<'a, E: ElectrumApi + ?Sized> PrevoutLookup<'a, E> {
    pub fn new(electrum: &'a E, max_in_flight: usize) -> Self {
        PrevoutLookup {
            electrum,
            permits: Semaphore::new(max_in_flight.max(1)),
        }
    }

    pub async fn fetch_transaction(&self, txid: &str) -> Result<Transaction> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Network(format!("lookup pool is closed: {e}")))?;
        self.electrum.get_transaction(txid).await
    }

    pub async fn resolve(&self, outpoint: &OutPoint) -> Result<ResolvedPrevout> {
        let prev = self
            .fetch_transaction(&outpoint.txid)
            .await
            .map_err(|e| match e {
                e if e.is_missing_transaction() => Error::LookupNotFound(format!(
                    "transaction {} spent by an input, reason: {}",
                    outpoint.txid, e
                )),
                e => e,
            })?;
        let output = prev.output(outpoint.vout).ok_or_else(|| {
            Error::LookupNotFound(format!(
                "output {}:{} (transaction has {} outputs)",
                outpoint.txid,
                outpoint.vout,
                prev.outputs.len()
            ))
        })?;
        Ok(ResolvedPrevout {
            value: output.value,
            address: output.address.clone(),
        })
    }

    /// Resolves every input of `tx` concurrently, `None` standing for the
    /// coinbase sentinel. The first failure fails the whole transaction.
    ///
    /// Only a coinbase may carry the sentinel; anywhere else it would read as
    /// a zero valued input.
    pub async fn resolve_inputs(&self, tx: &Transaction) -> Result<Vec<Option<ResolvedPrevout>>> {
        if !tx.is_coinbase() {
            if tx.inputs.is_empty() {
                return Err(Error::Protocol(format!("transaction {} has no inputs", tx.txid)));
            }
            if tx.inputs.iter().any(Input::is_coinbase) {
                return Err(Error::Protocol(format!(
                    "transaction {} mixes a coinbase input with spends",
                    tx.txid
                )));
            }
        }
        let lookups: Vec<_> = tx
            .inputs
            .iter()
            .map(|input| self.resolve_input(input))
            .collect();
        try_join_all(lookups).await
    }

    async fn resolve_input(&self, input: &Input) -> Result<Option<ResolvedPrevout>> {
        match &input.previous {
            Some(outpoint) => self.resolve(outpoint).await.map(Some),
            None => Ok(None),
        }
    }
}
