use chain_bsv::utxo::{InclusionPolicy, Utxo};
use serde::{Deserialize, Serialize};

pub use chain_bsv::transaction::{DataOutput, TokenTransfer};

use crate::credential::Credential;

/// What a caller wants to spend.
#[derive(Debug, Clone)]
pub struct TransactionParams {
    /// Sender address; must be the address the credential resolves to.
    pub from: String,
    pub to: String,
    pub amount_sat: u64,
    /// sat/byte; `None` uses the configured default.
    pub fee_rate: Option<u64>,
    pub credential: Credential,
    /// Overrides the configured input-inclusion flags.
    pub inclusion: Option<InclusionPolicy>,
    pub token_transfers: Vec<TokenTransfer>,
    pub data_outputs: Vec<DataOutput>,
}

impl TransactionParams {
    /// Plain payment of `amount_sat` at the default fee rate.
    pub fn payment(
        from: impl Into<String>,
        to: impl Into<String>,
        amount_sat: u64,
        credential: Credential,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount_sat,
            fee_rate: None,
            credential,
            inclusion: None,
            token_transfers: Vec::new(),
            data_outputs: Vec::new(),
        }
    }

    pub fn with_fee_rate(mut self, fee_rate: u64) -> Self {
        self.fee_rate = Some(fee_rate);
        self
    }

    pub fn with_inclusion(mut self, inclusion: InclusionPolicy) -> Self {
        self.inclusion = Some(inclusion);
        self
    }

    pub fn with_token_transfer(mut self, transfer: TokenTransfer) -> Self {
        self.token_transfers.push(transfer);
        self
    }

    pub fn with_data_output(mut self, data: DataOutput) -> Self {
        self.data_outputs.push(data);
        self
    }

    /// Token id and summed amount when this is a token spend.
    pub fn token_demand(&self) -> Option<(&str, u64)> {
        let first = self.token_transfers.first()?;
        let amount = self
            .token_transfers
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.amount));
        Some((first.token_id.as_str(), amount))
    }
}

/// One output of a built transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSummary {
    pub index: u32,
    pub amount_sat: u64,
    /// Destination, absent for data outputs.
    pub address: Option<String>,
    pub is_data: bool,
    /// Hex of the `OP_RETURN` payload, for data outputs.
    pub data: Option<String>,
}

/// Outcome of a broadcast spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub txid: String,
    pub raw_tx_hex: String,
    pub fee_sat: u64,
    pub change_sat: u64,
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<OutputSummary>,
    pub token_transfers: Vec<TokenTransfer>,
    pub data_outputs: Vec<DataOutput>,
    pub explorer_url: String,
}

/// Address derived from a mnemonic, with the path it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub address: String,
    pub derivation_path: String,
}
