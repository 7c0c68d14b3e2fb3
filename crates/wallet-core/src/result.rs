use bitcoin::script::{Instruction, Script};
use bitcoin::Address;
use chain_bsv::network::BsvNetwork;
use tracing::warn;

use crate::builder::{BuiltTransaction, TransactionBuilder};
use crate::config::Config;
use crate::types::{OutputSummary, TransactionParams, TransactionResult};

/// Payload pushed after `OP_RETURN`, if `script` is a data output.
fn op_return_payload(script: &Script) -> Option<Vec<u8>> {
    if !script.is_op_return() {
        return None;
    }
    let mut payload = Vec::new();
    for instruction in script.instructions().skip(1) {
        if let Ok(Instruction::PushBytes(bytes)) = instruction {
            payload.extend_from_slice(bytes.as_bytes());
        }
    }
    Some(payload)
}

fn summarize_outputs(built: &BuiltTransaction, network: BsvNetwork) -> Vec<OutputSummary> {
    built
        .unsigned
        .tx
        .output
        .iter()
        .enumerate()
        .map(|(index, output)| {
            let payload = op_return_payload(&output.script_pubkey);
            let address = match payload {
                Some(_) => None,
                None => Address::from_script(&output.script_pubkey, network.to_bitcoin_network())
                    .ok()
                    .map(|a| a.to_string()),
            };
            OutputSummary {
                index: index as u32,
                amount_sat: output.value.to_sat(),
                address,
                is_data: payload.is_some(),
                data: payload.map(hex::encode),
            }
        })
        .collect()
}

/// Describe a broadcast transaction.
///
/// Inputs are reported by re-running selection with the same parameters
/// (served from the cache when it is still fresh); if that fails, the
/// selection the transaction was built from is reported instead.
pub async fn synthesize(
    builder: &TransactionBuilder<'_>,
    params: &TransactionParams,
    config: &Config,
    built: &BuiltTransaction,
) -> TransactionResult {
    let inputs = match builder.select(params, config).await {
        Ok(selection) => selection.selected,
        Err(e) => {
            warn!(
                txid = %built.signed.txid,
                error = %e,
                "re-selection failed, reporting build-time inputs"
            );
            built.selection.selected.clone()
        }
    };

    let change_sat = built.unsigned.change_sat;
    let fee_sat = built
        .unsigned
        .total_input_sat()
        .saturating_sub(params.amount_sat)
        .saturating_sub(change_sat);

    TransactionResult {
        txid: built.signed.txid.clone(),
        raw_tx_hex: hex::encode(&built.signed.raw),
        fee_sat,
        change_sat,
        inputs,
        outputs: summarize_outputs(built, config.network.network),
        token_transfers: params.token_transfers.clone(),
        data_outputs: params.data_outputs.clone(),
        explorer_url: config.network.explorer_tx_url(&built.signed.txid),
    }
}
