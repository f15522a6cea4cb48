use futures::future::try_join_all;
use log::{debug, warn};

use crate::api::{ElectrumApi, NodeApi};
use crate::chain::{canonical_address, derive_script_hash, ChainParams};
use crate::error::{Error, Result};
use crate::model::{
    checked_sum, AddressHistory, AddressHistoryEntry, Amount, BalanceHistoryPoint, Height,
    HistoryItem, ResolvedPrevout, Transaction,
};

use super::PrevoutLookup;

/// Rebuilds the transaction history and balance series of `address`.
///
/// Confirmed entries come back newest first while `balance_history` runs
/// oldest first. Mempool transactions are resolved into `unconfirmed` and
/// never enter the balance series.
pub async fn resolve_address_history<N, E>(
    node: &N,
    electrum: &E,
    params: &ChainParams,
    address: &str,
    max_in_flight: usize,
) -> Result<AddressHistory>
where
    N: NodeApi + ?Sized,
    E: ElectrumApi + ?Sized,
{
    let script_hash = derive_script_hash(address, params)?;
    // outputs report the address as the node spells it
    let address = canonical_address(address, params)?;
    let address = address.as_str();
    let (history, balance, current_height) = futures::try_join!(
        electrum.get_history(&script_hash),
        electrum.get_balance(&script_hash),
        node.get_block_count(),
    )?;
    debug!(
        "address {} ({}) has {} history item(s)",
        address,
        script_hash,
        history.len()
    );

    let lookup = PrevoutLookup::new(electrum, max_in_flight);
    let workers: Vec<_> = history
        .iter()
        .map(|item| resolve_entry(&lookup, item, address, current_height))
        .collect();
    let resolved = try_join_all(workers).await?;

    let (mut entries, unconfirmed): (Vec<_>, Vec<_>) =
        resolved.into_iter().partition(|entry| entry.height.is_some());
    // stable, so equal heights keep the order Electrum reported
    entries.sort_by_key(|entry| entry.height);

    let balance_history = build_balance_history(&entries, current_height)?;
    if let Some(last) = balance_history.last() {
        if last.balance != balance.confirmed {
            warn!(
                "reconstructed balance {} of {} differs from electrum confirmed balance {}",
                last.balance, address, balance.confirmed
            );
        }
    }
    entries.reverse();

    Ok(AddressHistory {
        address: address.to_owned(),
        script_hash,
        current_height,
        entries,
        unconfirmed,
        balance_history,
        balance,
    })
}

async fn resolve_entry<E: ElectrumApi + ?Sized>(
    lookup: &PrevoutLookup<'_, E>,
    item: &HistoryItem,
    address: &str,
    current_height: Height,
) -> Result<AddressHistoryEntry> {
    let transaction = lookup.fetch_transaction(&item.tx_hash).await?;
    let prevouts = lookup.resolve_inputs(&transaction).await?;
    let height = item.confirmed_height();
    let confirmations = height
        .map(|h| current_height.saturating_sub(h))
        .unwrap_or(0);
    let balance_change = balance_change(&transaction, &prevouts, address)?;
    Ok(AddressHistoryEntry {
        transaction,
        prevouts,
        height,
        confirmations,
        balance_change,
    })
}

/// Received by `address` minus spent by `address` within one transaction.
pub fn balance_change(
    tx: &Transaction,
    prevouts: &[Option<ResolvedPrevout>],
    address: &str,
) -> Result<Amount> {
    let received = checked_sum(
        tx.outputs
            .iter()
            .filter(|o| o.is_owned_by(address))
            .map(|o| o.value),
    )?;
    let spent = checked_sum(
        prevouts
            .iter()
            .flatten()
            .filter(|p| p.address.as_deref() == Some(address))
            .map(|p| p.value),
    )?;
    received
        .checked_sub(spent)
        .ok_or_else(|| Error::Protocol(format!("balance change overflow for {address}")))
}

/// Walks entries sorted oldest first. The series opens with a zero anchor one
/// block before the first entry and, unless the last entry is at the tip,
/// closes with an anchor at `current_height`. Entries sharing a height
/// collapse into one point.
pub fn build_balance_history(
    entries: &[AddressHistoryEntry],
    current_height: Height,
) -> Result<Vec<BalanceHistoryPoint>> {
    let mut points = Vec::new();
    let first_height = match entries.iter().find_map(|entry| entry.height) {
        Some(height) => height,
        None => return Ok(points),
    };
    points.push(BalanceHistoryPoint {
        height: first_height.saturating_sub(1),
        balance: 0,
    });

    let mut balance: Amount = 0;
    for entry in entries {
        let height = match entry.height {
            Some(height) => height,
            None => continue,
        };
        balance = checked_sum([balance, entry.balance_change])?;
        let same_block = points.len() > 1 && points.last().map(|p| p.height) == Some(height);
        if same_block {
            if let Some(last) = points.last_mut() {
                last.balance = balance;
            }
        } else {
            points.push(BalanceHistoryPoint { height, balance });
        }
    }

    if let Some(last) = points.last() {
        if last.height < current_height {
            points.push(BalanceHistoryPoint {
                height: current_height,
                balance,
            });
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::{u5, ToBase32, Variant};

    use crate::chain::NMC_REGTEST;
    use crate::mock::{coinbase, out, tx, MockElectrum, MockNode};
    use crate::model::Input;

    fn address(seed: u8) -> String {
        let mut data = vec![NMC_REGTEST.pubkey_hash_addr_id];
        data.extend_from_slice(&[seed; 20]);
        bs58::encode(&data).with_check().into_string()
    }

    fn segwit_address(seed: u8) -> String {
        let mut data = vec![u5::try_from_u8(0).unwrap()];
        data.extend([seed; 20].to_base32());
        bech32::encode(NMC_REGTEST.bech32_hrp, data, Variant::Bech32).unwrap()
    }

    fn entry(height: Option<Height>, balance_change: Amount) -> AddressHistoryEntry {
        AddressHistoryEntry {
            transaction: tx("t", vec![], vec![]),
            prevouts: vec![],
            height,
            confirmations: 0,
            balance_change,
        }
    }

    #[test]
    fn test_balance_change() {
        let spend = tx(
            "t",
            vec![Input::spend("a", 0), Input::spend("b", 0)],
            vec![out(30, Some("me")), out(60, Some("you"))],
        );
        let prevouts = vec![
            Some(ResolvedPrevout {
                value: 50,
                address: Some("me".to_owned()),
            }),
            Some(ResolvedPrevout {
                value: 45,
                address: Some("other".to_owned()),
            }),
        ];
        assert_eq!(balance_change(&spend, &prevouts, "me").unwrap(), -20);
        assert_eq!(balance_change(&spend, &prevouts, "you").unwrap(), 60);
        assert_eq!(balance_change(&spend, &prevouts, "nobody").unwrap(), 0);
    }

    #[test]
    fn test_balance_change_overflow() {
        let rich = tx(
            "t",
            vec![Input::spend("a", 0)],
            vec![out(i64::MAX, Some("me")), out(1, Some("me"))],
        );
        let e = balance_change(&rich, &[None], "me").unwrap_err();
        assert_eq!(e.kind(), "protocol");

        let entries = vec![entry(Some(1), i64::MAX), entry(Some(2), 1)];
        let e = build_balance_history(&entries, 2).unwrap_err();
        assert_eq!(e.kind(), "protocol");
    }

    #[test]
    fn test_balance_history_anchors() {
        let entries = vec![entry(Some(10), 100), entry(Some(15), -40), entry(Some(20), 5)];
        let points = build_balance_history(&entries, 30).unwrap();
        let pairs: Vec<_> = points.iter().map(|p| (p.height, p.balance)).collect();
        assert_eq!(pairs, vec![(9, 0), (10, 100), (15, 60), (20, 65), (30, 65)]);
    }

    #[test]
    fn test_balance_history_at_tip_has_no_trailing_anchor() {
        let entries = vec![entry(Some(10), 100), entry(Some(30), -100)];
        let points = build_balance_history(&entries, 30).unwrap();
        let pairs: Vec<_> = points.iter().map(|p| (p.height, p.balance)).collect();
        assert_eq!(pairs, vec![(9, 0), (10, 100), (30, 0)]);
    }

    #[test]
    fn test_balance_history_same_block_collapses() {
        let entries = vec![entry(Some(10), 100), entry(Some(10), -30), entry(Some(12), 1)];
        let points = build_balance_history(&entries, 12).unwrap();
        let pairs: Vec<_> = points.iter().map(|p| (p.height, p.balance)).collect();
        assert_eq!(pairs, vec![(9, 0), (10, 70), (12, 71)]);
    }

    #[test]
    fn test_balance_history_empty() {
        assert!(build_balance_history(&[], 100).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_address_history() {
        let me = address(1);
        let other = address(2);
        let script_hash = derive_script_hash(&me, &NMC_REGTEST).unwrap();

        // mined to me at 101, I pay 30 to other at 105, receive 5 more at 105
        let cb = coinbase("cb", vec![out(50, Some(&me))]);
        let pay = tx(
            "pay",
            vec![Input::spend("cb", 0)],
            vec![out(30, Some(&other)), out(19, Some(&me))],
        );
        let gift = tx("gift", vec![Input::spend("o", 0)], vec![out(5, Some(&me))]);
        let funding = tx("o", vec![], vec![out(6, Some(&other))]);
        let pending = tx("pending", vec![Input::spend("pay", 1)], vec![out(18, Some(&other))]);

        let electrum = MockElectrum::new()
            .with_tx(cb)
            .with_tx(pay)
            .with_tx(gift)
            .with_tx(funding)
            .with_tx(pending)
            .with_history(
                &script_hash,
                &[("cb", 101), ("pay", 105), ("gift", 105), ("pending", 0)],
            )
            .with_balance(&script_hash, 24, -19);
        let node = MockNode::new(110);

        let history = resolve_address_history(&node, &electrum, &NMC_REGTEST, &me, 4)
            .await
            .unwrap();

        assert_eq!(history.script_hash, script_hash);
        let txids: Vec<_> = history
            .entries
            .iter()
            .map(|e| e.transaction.txid.as_str())
            .collect();
        assert_eq!(txids, vec!["gift", "pay", "cb"]);
        let changes: Vec<_> = history.entries.iter().map(|e| e.balance_change).collect();
        assert_eq!(changes, vec![5, -31, 50]);
        assert_eq!(history.entries[2].confirmations, 9);

        let pairs: Vec<_> = history
            .balance_history
            .iter()
            .map(|p| (p.height, p.balance))
            .collect();
        assert_eq!(pairs, vec![(100, 0), (101, 50), (105, 24), (110, 24)]);
        assert_eq!(
            history.balance_history.last().unwrap().balance,
            history.balance.confirmed
        );

        assert_eq!(history.unconfirmed.len(), 1);
        assert_eq!(history.unconfirmed[0].balance_change, -19);
        assert_eq!(history.unconfirmed[0].confirmations, 0);
    }

    #[tokio::test]
    async fn test_entries_reverse_round_trip() {
        let me = address(3);
        let script_hash = derive_script_hash(&me, &NMC_REGTEST).unwrap();
        let electrum = MockElectrum::new()
            .with_tx(coinbase("a", vec![out(1, Some(&me))]))
            .with_tx(coinbase("b", vec![out(2, Some(&me))]))
            .with_history(&script_hash, &[("b", 7), ("a", 3)]);
        let node = MockNode::new(7);
        let history = resolve_address_history(&node, &electrum, &NMC_REGTEST, &me, 4)
            .await
            .unwrap();
        let mut entries = history.entries.clone();
        entries.reverse();
        let heights: Vec<_> = entries.iter().map(|e| e.height).collect();
        assert_eq!(heights, vec![Some(3), Some(7)]);
        entries.reverse();
        assert_eq!(entries, history.entries);
    }

    #[tokio::test]
    async fn test_uppercase_segwit_address() {
        let me = segwit_address(6);
        let upper = me.to_uppercase();
        let script_hash = derive_script_hash(&me, &NMC_REGTEST).unwrap();
        assert_eq!(derive_script_hash(&upper, &NMC_REGTEST).unwrap(), script_hash);

        let electrum = MockElectrum::new()
            .with_tx(coinbase("cb", vec![out(50, Some(&me))]))
            .with_history(&script_hash, &[("cb", 10)])
            .with_balance(&script_hash, 50, 0);
        let node = MockNode::new(10);
        let history = resolve_address_history(&node, &electrum, &NMC_REGTEST, &upper, 4)
            .await
            .unwrap();

        assert_eq!(history.address, me);
        assert_eq!(history.entries[0].balance_change, 50);
        let last = history.balance_history.last().unwrap();
        assert_eq!(last.balance, history.balance.confirmed);
    }

    #[tokio::test]
    async fn test_address_without_history() {
        let me = address(4);
        let electrum = MockElectrum::new();
        let node = MockNode::new(10);
        let history = resolve_address_history(&node, &electrum, &NMC_REGTEST, &me, 4)
            .await
            .unwrap();
        assert!(history.entries.is_empty());
        assert!(history.unconfirmed.is_empty());
        assert!(history.balance_history.is_empty());
        assert_eq!(history.balance.confirmed, 0);
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let electrum = MockElectrum::new();
        let node = MockNode::new(10);
        let e = resolve_address_history(&node, &electrum, &NMC_REGTEST, "not-an-address", 4)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), "address_decode");
    }

    #[tokio::test]
    async fn test_failed_input_lookup_fails_address() {
        let me = address(5);
        let script_hash = derive_script_hash(&me, &NMC_REGTEST).unwrap();
        let electrum = MockElectrum::new()
            .with_tx(tx("t", vec![Input::spend("gone", 0)], vec![out(1, Some(&me))]))
            .with_history(&script_hash, &[("t", 5)])
            .failing("gone");
        let node = MockNode::new(10);
        let e = resolve_address_history(&node, &electrum, &NMC_REGTEST, &me, 4)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), "network");
    }
}
