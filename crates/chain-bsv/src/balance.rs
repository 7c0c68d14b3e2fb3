use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utxo::{Utxo, UtxoKind};

/// Confirmed/unconfirmed split for one asset.
///
/// `total()` is derived, so `total == confirmed + unconfirmed` always holds.
/// Values are signed: indexers report unconfirmed spends as negative deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub confirmed: i64,
    pub unconfirmed: i64,
    /// Number of outputs contributing to this aggregate.
    pub count: usize,
}

impl Aggregate {
    pub fn total(&self) -> i64 {
        self.confirmed + self.unconfirmed
    }
}

/// Balance view of an address derived from its outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub native: Aggregate,
    /// Per-token aggregates keyed by token id.
    pub tokens: BTreeMap<String, Aggregate>,
}

impl BalanceSnapshot {
    /// Build a snapshot from the indexer's native balance and the discovered
    /// outputs. Token outputs count as confirmed once they reach
    /// `min_confirmations`.
    pub fn from_outputs(
        confirmed: i64,
        unconfirmed: i64,
        outputs: &[Utxo],
        min_confirmations: u32,
    ) -> Self {
        let mut tokens: BTreeMap<String, Aggregate> = BTreeMap::new();
        let mut native_count = 0;

        for utxo in outputs {
            match &utxo.kind {
                UtxoKind::Native => native_count += 1,
                UtxoKind::Token { token_id, amount } => {
                    let entry = tokens.entry(token_id.clone()).or_default();
                    entry.count += 1;
                    let amount = i64::try_from(*amount).unwrap_or(i64::MAX);
                    if utxo.confirmations >= min_confirmations {
                        entry.confirmed = entry.confirmed.saturating_add(amount);
                    } else {
                        entry.unconfirmed = entry.unconfirmed.saturating_add(amount);
                    }
                }
            }
        }

        Self {
            native: Aggregate {
                confirmed,
                unconfirmed,
                count: native_count,
            },
            tokens,
        }
    }

    /// Total native balance (confirmed + unconfirmed).
    pub fn total(&self) -> i64 {
        self.native.total()
    }

    /// Number of non-native outputs across all tokens.
    pub fn token_output_count(&self) -> usize {
        self.tokens.values().map(|t| t.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utxo(kind: UtxoKind, confirmations: u32) -> Utxo {
        Utxo {
            txid: "ab".repeat(32),
            vout: 0,
            amount_sat: 1,
            address: String::new(),
            script_pubkey: Vec::new(),
            confirmations,
            height: 0,
            kind,
        }
    }

    fn token(id: &str, amount: u64, confirmations: u32) -> Utxo {
        utxo(
            UtxoKind::Token {
                token_id: id.into(),
                amount,
            },
            confirmations,
        )
    }

    #[test]
    fn native_aggregate_uses_indexer_balance() {
        let outputs = vec![utxo(UtxoKind::Native, 3), utxo(UtxoKind::Native, 1)];
        let snapshot = BalanceSnapshot::from_outputs(80_000, -2_000, &outputs, 1);
        assert_eq!(snapshot.native.count, 2);
        assert_eq!(snapshot.total(), 78_000);
        assert!(snapshot.tokens.is_empty());
    }

    #[test]
    fn tokens_split_by_confirmations() {
        let outputs = vec![
            token("gold", 10, 6),
            token("gold", 4, 0),
            token("silver", 7, 2),
            utxo(UtxoKind::Native, 6),
        ];
        let snapshot = BalanceSnapshot::from_outputs(0, 0, &outputs, 2);

        let gold = snapshot.tokens["gold"];
        assert_eq!(gold.confirmed, 10);
        assert_eq!(gold.unconfirmed, 4);
        assert_eq!(gold.count, 2);

        let silver = snapshot.tokens["silver"];
        assert_eq!(silver.confirmed, 7);
        assert_eq!(snapshot.token_output_count(), 3);
        assert_eq!(snapshot.native.count, 1);
    }

    #[test]
    fn total_is_confirmed_plus_unconfirmed_everywhere() {
        let outputs = vec![token("a", 5, 0), token("a", 9, 9), token("b", 1, 1)];
        let snapshot = BalanceSnapshot::from_outputs(123, 45, &outputs, 1);
        let native = &snapshot.native;
        assert_eq!(native.total(), native.confirmed + native.unconfirmed);
        for aggregate in snapshot.tokens.values() {
            assert_eq!(aggregate.total(), aggregate.confirmed + aggregate.unconfirmed);
        }
    }
}
