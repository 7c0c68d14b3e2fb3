//! Transaction assembly: validation, credential resolution, coin selection,
//! skeleton construction and signing.

use chain_bsv::address::validate_address;
use chain_bsv::transaction::{
    build_transaction, sign_transaction, OutputPlan, SignedBsvTx, UnsignedBsvTx,
};
use chain_bsv::utxo::{select_utxos, select_utxos_for_token, UtxoSelection};
use tracing::debug;

use crate::config::Config;
use crate::credential::SenderKey;
use crate::discovery::OutputDiscovery;
use crate::error::WalletError;
use crate::types::TransactionParams;

/// A signed transaction together with what it was built from.
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    pub sender: String,
    pub selection: UtxoSelection,
    pub unsigned: UnsignedBsvTx,
    pub signed: SignedBsvTx,
}

pub struct TransactionBuilder<'a> {
    discovery: &'a OutputDiscovery,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(discovery: &'a OutputDiscovery) -> Self {
        Self { discovery }
    }

    /// Check `params` against the snapshot. Performs no I/O.
    pub fn validate(params: &TransactionParams, config: &Config) -> Result<(), WalletError> {
        if params.from.trim().is_empty() {
            return Err(WalletError::InvalidParams("sender address is required".into()));
        }
        if params.to.trim().is_empty() {
            return Err(WalletError::InvalidParams("recipient address is required".into()));
        }
        if params.amount_sat == 0 {
            return Err(WalletError::InvalidParams("amount must be positive".into()));
        }
        if let Some(rate) = params.fee_rate {
            config.transaction.check_fee_rate(rate)?;
        }

        let network = config.network.network;
        if !validate_address(&params.to, network)? {
            return Err(WalletError::InvalidAddress(format!(
                "{} is not a {network} address",
                params.to
            )));
        }

        let mut token_id: Option<&str> = None;
        for transfer in &params.token_transfers {
            if transfer.token_id.is_empty() {
                return Err(WalletError::InvalidParams("token id is required".into()));
            }
            if transfer.to.is_empty() {
                return Err(WalletError::InvalidParams("token recipient is required".into()));
            }
            if transfer.amount == 0 {
                return Err(WalletError::InvalidParams(
                    "token amount must be positive".into(),
                ));
            }
            match token_id {
                Some(id) if id != transfer.token_id => {
                    return Err(WalletError::InvalidParams(
                        "all token transfers must use the same token".into(),
                    ));
                }
                _ => token_id = Some(transfer.token_id.as_str()),
            }
        }

        Ok(())
    }

    /// Resolve the credential and require it to control `params.from`.
    pub fn resolve_sender(
        params: &TransactionParams,
        config: &Config,
    ) -> Result<SenderKey, WalletError> {
        let sender = params.credential.resolve(config.network.network)?;
        if sender.address != params.from {
            return Err(WalletError::SenderMismatch {
                declared: params.from.clone(),
                derived: sender.address.clone(),
            });
        }
        Ok(sender)
    }

    /// Choose inputs for `params` from the sender's (possibly cached) outputs.
    pub async fn select(
        &self,
        params: &TransactionParams,
        config: &Config,
    ) -> Result<UtxoSelection, WalletError> {
        let entry = self.discovery.snapshot(&params.from, config).await?;
        let settings = &config.transaction;
        let fee_rate = params.fee_rate.unwrap_or(settings.default_fee_rate);
        let fees = settings.fee_policy();

        let selection = match params.token_demand() {
            Some((token_id, amount)) => {
                select_utxos_for_token(&entry.outputs, token_id, amount, fee_rate, &fees)?
            }
            None => {
                let inclusion = params.inclusion.unwrap_or_else(|| settings.inclusion());
                select_utxos(&entry.outputs, params.amount_sat, fee_rate, &fees, inclusion)?
            }
        };

        debug!(
            address = %params.from,
            inputs = selection.selected.len(),
            total_sat = selection.total_sat,
            fee_sat = selection.fee_sat,
            fee_rate = selection.fee_rate,
            "selected inputs"
        );
        Ok(selection)
    }

    /// Validate, resolve and select, then assemble the unsigned skeleton.
    pub async fn build_unsigned(
        &self,
        params: &TransactionParams,
        config: &Config,
    ) -> Result<(SenderKey, UtxoSelection, UnsignedBsvTx), WalletError> {
        Self::validate(params, config)?;
        let sender = Self::resolve_sender(params, config)?;
        let selection = self.select(params, config).await?;

        let plan = OutputPlan {
            recipient: &params.to,
            amount_sat: params.amount_sat,
            change_address: &sender.address,
            token_transfers: &params.token_transfers,
            data_outputs: &params.data_outputs,
        };
        let unsigned = build_transaction(
            &selection,
            &plan,
            &config.transaction.tx_options(),
            config.network.network,
        )?;

        Ok((sender, selection, unsigned))
    }

    /// Build and sign, without broadcasting.
    pub async fn build(
        &self,
        params: &TransactionParams,
        config: &Config,
    ) -> Result<BuiltTransaction, WalletError> {
        let (sender, selection, unsigned) = self.build_unsigned(params, config).await?;
        let signed = sign_transaction(&unsigned, sender.secret(), config.network.network)?;

        let max = config.transaction.max_transaction_size;
        if signed.raw.len() > max {
            return Err(WalletError::TransactionTooLarge {
                size: signed.raw.len(),
                max,
            });
        }

        debug!(
            txid = %signed.txid,
            size = signed.raw.len(),
            fee_sat = unsigned.fee_sat,
            change_sat = unsigned.change_sat,
            "signed transaction"
        );

        Ok(BuiltTransaction {
            sender: sender.address.clone(),
            selection,
            unsigned,
            signed,
        })
    }
}
