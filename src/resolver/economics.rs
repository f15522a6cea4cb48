use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

use crate::api::ElectrumApi;
use crate::error::{Error, Result};
use crate::model::{checked_sum, Amount, BlockEconomics, Transaction};

use super::PrevoutLookup;

/// Computes reward, fees and value moved for the transactions of one block.
///
/// One worker per transaction resolves the inputs it spends; the partial sums
/// are drained here as they complete. Any failed lookup fails the whole call
/// and no partial sums escape.
pub async fn resolve_block_economics<E: ElectrumApi + ?Sized>(
    electrum: &E,
    transactions: &[Transaction],
    max_in_flight: usize,
) -> Result<BlockEconomics> {
    let coinbase_count = transactions.iter().filter(|tx| tx.is_coinbase()).count();
    if coinbase_count != 1 {
        return Err(Error::Protocol(format!(
            "block carries {coinbase_count} coinbase transactions, expected exactly one"
        )));
    }

    let lookup = PrevoutLookup::new(electrum, max_in_flight);
    let mut workers: FuturesUnordered<_> = transactions
        .iter()
        .map(|tx| transaction_economics(&lookup, tx))
        .collect();

    let mut economics = BlockEconomics::default();
    while let Some(partial) = workers.next().await {
        let partial = partial?;
        economics = BlockEconomics {
            reward: checked_sum([economics.reward, partial.reward])?,
            fees: checked_sum([economics.fees, partial.fees])?,
            value: checked_sum([economics.value, partial.value])?,
        };
    }
    debug!(
        "resolved economics of {} transactions: {:?}",
        transactions.len(),
        economics
    );
    Ok(economics)
}

async fn transaction_economics<E: ElectrumApi + ?Sized>(
    lookup: &PrevoutLookup<'_, E>,
    tx: &Transaction,
) -> Result<BlockEconomics> {
    let output_value = tx.output_value()?;
    if tx.is_coinbase() {
        return Ok(BlockEconomics {
            reward: output_value,
            fees: 0,
            value: output_value,
        });
    }
    let prevouts = lookup.resolve_inputs(tx).await?;
    let input_value: Amount = checked_sum(prevouts.iter().flatten().map(|p| p.value))?;
    Ok(BlockEconomics {
        reward: 0,
        fees: input_value - output_value,
        value: input_value,
    })
}
