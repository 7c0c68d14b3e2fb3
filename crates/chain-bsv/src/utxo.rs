use serde::{Deserialize, Serialize};

use crate::error::BsvError;
use crate::transaction::{estimate_fee, SELECTION_OUTPUTS};

/// What an output carries besides its satoshi value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UtxoKind {
    /// Plain BSV.
    Native,
    /// An output annotated as holding `amount` units of `token_id`.
    Token { token_id: String, amount: u64 },
}

/// A single unspent transaction output (UTXO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub amount_sat: u64,
    /// Address owning the output.
    pub address: String,
    /// The locking script (scriptPubKey) serialized bytes.
    pub script_pubkey: Vec<u8>,
    pub confirmations: u32,
    pub height: u64,
    pub kind: UtxoKind,
}

impl Utxo {
    pub fn is_native(&self) -> bool {
        matches!(self.kind, UtxoKind::Native)
    }

    pub fn token_id(&self) -> Option<&str> {
        match &self.kind {
            UtxoKind::Native => None,
            UtxoKind::Token { token_id, .. } => Some(token_id),
        }
    }

    /// Token units carried by this output (zero for native outputs).
    pub fn token_amount(&self) -> u64 {
        match &self.kind {
            UtxoKind::Native => 0,
            UtxoKind::Token { amount, .. } => *amount,
        }
    }

    /// Identity of the output: `txid:vout`.
    pub fn outpoint_key(&self) -> String {
        format!("{}:{}", self.txid, self.vout)
    }
}

/// Which output kinds a native spend may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionPolicy {
    pub native: bool,
    pub non_native: bool,
}

impl InclusionPolicy {
    pub const NATIVE_ONLY: Self = Self {
        native: true,
        non_native: false,
    };

    pub fn admits(&self, utxo: &Utxo) -> bool {
        if utxo.is_native() {
            self.native
        } else {
            self.non_native
        }
    }
}

impl Default for InclusionPolicy {
    fn default() -> Self {
        Self::NATIVE_ONLY
    }
}

/// Fee-rate bounds in sat/byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    pub default_rate: u64,
    pub min_rate: u64,
    pub max_rate: u64,
}

impl FeePolicy {
    /// Rates above `max_rate` are rejected; rates below `min_rate` fall back
    /// to `default_rate`.
    pub fn normalize(&self, fee_rate: u64) -> Result<u64, BsvError> {
        if fee_rate > self.max_rate {
            return Err(BsvError::FeeRateOutOfRange {
                rate: fee_rate,
                max: self.max_rate,
            });
        }
        if fee_rate < self.min_rate {
            return Ok(self.default_rate);
        }
        Ok(fee_rate)
    }
}

/// Result of UTXO selection: the chosen UTXOs, their aggregate value and the
/// fee the selection was sized for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoSelection {
    /// The selected UTXOs.
    pub selected: Vec<Utxo>,
    /// Total value of the selected UTXOs in satoshis.
    pub total_sat: u64,
    /// Estimated fee in satoshis.
    pub fee_sat: u64,
    /// Fee rate actually applied after normalization.
    pub fee_rate: u64,
}

/// Select UTXOs to cover `target_sat` plus estimated fees.
///
/// Largest-first: candidates admitted by `inclusion` are stably sorted by
/// value descending and accumulated until the running total covers the
/// target plus the fee for the current input count (and two outputs:
/// recipient + change). The first such prefix is returned.
pub fn select_utxos(
    utxos: &[Utxo],
    target_sat: u64,
    fee_rate: u64,
    fees: &FeePolicy,
    inclusion: InclusionPolicy,
) -> Result<UtxoSelection, BsvError> {
    let fee_rate = fees.normalize(fee_rate)?;

    let mut sorted: Vec<&Utxo> = utxos.iter().filter(|u| inclusion.admits(u)).collect();
    sorted.sort_by(|a, b| b.amount_sat.cmp(&a.amount_sat));

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total_sat: u64 = 0;

    for utxo in &sorted {
        selected.push((*utxo).clone());
        total_sat += utxo.amount_sat;

        let fee_sat = estimate_fee(selected.len(), SELECTION_OUTPUTS, fee_rate);
        if total_sat >= target_sat.saturating_add(fee_sat) {
            return Ok(UtxoSelection {
                selected,
                total_sat,
                fee_sat,
                fee_rate,
            });
        }
    }

    // The shortfall is reported against every candidate, not a partial prefix.
    let fee_sat = estimate_fee(sorted.len(), SELECTION_OUTPUTS, fee_rate);
    Err(BsvError::InsufficientFunds {
        needed: target_sat.saturating_add(fee_sat),
        available: total_sat,
    })
}

/// Select UTXOs for a token transfer of `amount` units of `token_id`.
///
/// Token outputs are chosen largest-token-amount first until the amount is
/// covered; native outputs are then chosen largest-value first until they pay
/// the fee for a transaction sized by the token inputs. The returned list is
/// the token outputs followed by the native fee outputs.
pub fn select_utxos_for_token(
    utxos: &[Utxo],
    token_id: &str,
    amount: u64,
    fee_rate: u64,
    fees: &FeePolicy,
) -> Result<UtxoSelection, BsvError> {
    let fee_rate = fees.normalize(fee_rate)?;

    let (mut natives, mut tokens): (Vec<&Utxo>, Vec<&Utxo>) = utxos
        .iter()
        .filter(|u| u.is_native() || u.token_id() == Some(token_id))
        .partition(|u| u.is_native());

    let token_total: u64 = tokens.iter().map(|u| u.token_amount()).sum();
    if token_total < amount {
        return Err(BsvError::InsufficientTokenBalance {
            token_id: token_id.to_string(),
            needed: amount,
            available: token_total,
        });
    }

    tokens.sort_by(|a, b| b.token_amount().cmp(&a.token_amount()));
    let mut selected: Vec<Utxo> = Vec::new();
    let mut covered: u64 = 0;
    for utxo in tokens {
        if covered >= amount {
            break;
        }
        covered += utxo.token_amount();
        selected.push(utxo.clone());
    }

    let fee_sat = estimate_fee(selected.len(), SELECTION_OUTPUTS, fee_rate);

    natives.sort_by(|a, b| b.amount_sat.cmp(&a.amount_sat));
    let native_total: u64 = natives.iter().map(|u| u.amount_sat).sum();
    let mut fee_paid: u64 = 0;
    for utxo in natives {
        if fee_paid >= fee_sat {
            break;
        }
        fee_paid += utxo.amount_sat;
        selected.push(utxo.clone());
    }

    if fee_paid < fee_sat {
        return Err(BsvError::InsufficientFeeFunds {
            needed: fee_sat,
            available: native_total,
        });
    }

    let total_sat = selected.iter().map(|u| u.amount_sat).sum();
    Ok(UtxoSelection {
        selected,
        total_sat,
        fee_sat,
        fee_rate,
    })
}
