use bitcoin::absolute::LockTime;
use bitcoin::consensus::serialize;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::script::{Builder, PushBytesBuf, Script, ScriptBuf};
use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, PublicKey, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use serde::{Deserialize, Serialize};

use crate::address::p2pkh_script_for_address;
use crate::error::BsvError;
use crate::network::BsvNetwork;
use crate::utxo::{Utxo, UtxoSelection};

/// Estimated serialized size of a signed P2PKH input (in bytes).
/// Breakdown: 36 outpoint + 1 script length + ~107 scriptSig + 4 sequence.
pub const P2PKH_INPUT_BYTES: u64 = 148;

/// Estimated serialized size of a P2PKH output (in bytes).
pub const OUTPUT_BYTES: u64 = 34;

/// Fixed transaction overhead (in bytes): version + locktime + counts.
pub const TX_OVERHEAD_BYTES: u64 = 10;

/// Outputs assumed by coin selection: recipient + change.
pub const SELECTION_OUTPUTS: usize = 2;

/// `SIGHASH_ALL | SIGHASH_FORKID`, the only sighash type this wallet signs with.
pub const SIGHASH_ALL_FORKID: u32 = 0x41;

/// Prefix of the `OP_RETURN` payload annotating a token transfer.
pub const TOKEN_MARKER_PREFIX: &str = "TOKEN_TRANSFER";

/// A token transfer recorded as an advisory `OP_RETURN` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub token_id: String,
    pub to: String,
    pub amount: u64,
}

impl TokenTransfer {
    /// Marker payload: `TOKEN_TRANSFER:<token_id>:<to>:<amount>`.
    pub fn marker_payload(&self) -> Vec<u8> {
        format!(
            "{TOKEN_MARKER_PREFIX}:{}:{}:{}",
            self.token_id, self.to, self.amount
        )
        .into_bytes()
    }
}

/// An opaque payload carried by an unspendable `OP_RETURN` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataOutput {
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl DataOutput {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn from_hex(data: &str) -> Result<Self, BsvError> {
        let data = hex::decode(data)
            .map_err(|e| BsvError::TransactionBuildError(format!("invalid data output hex: {e}")))?;
        Ok(Self { data })
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Everything the outputs of a transaction are built from.
#[derive(Debug, Clone, Copy)]
pub struct OutputPlan<'a> {
    pub recipient: &'a str,
    pub amount_sat: u64,
    pub change_address: &'a str,
    pub token_transfers: &'a [TokenTransfer],
    pub data_outputs: &'a [DataOutput],
}

/// Policy knobs for assembling a transaction.
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    /// Change at or below this value is absorbed into the fee.
    pub dust_limit: u64,
    /// Signal replace-by-fee on every input.
    pub enable_rbf: bool,
}

/// An unsigned BSV transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedBsvTx {
    /// The transaction with empty `scriptSig`s.
    pub tx: Transaction,
    /// The UTXOs being spent, in the same order as the transaction inputs.
    pub inputs: Vec<Utxo>,
    /// Fee actually paid, including any absorbed dust.
    pub fee_sat: u64,
    /// Value of the change output, zero when none was created.
    pub change_sat: u64,
    /// Position of the change output, if any.
    pub change_index: Option<usize>,
}

impl UnsignedBsvTx {
    /// Canonical serialization of the unsigned skeleton.
    pub fn to_bytes(&self) -> Vec<u8> {
        bitcoin::consensus::serialize(&self.tx)
    }

    pub fn total_input_sat(&self) -> u64 {
        self.inputs.iter().map(|u| u.amount_sat).sum()
    }
}

/// A signed transaction and its canonical encodings.
#[derive(Debug, Clone)]
pub struct SignedBsvTx {
    pub tx: Transaction,
    pub raw: Vec<u8>,
    pub txid: String,
}

/// Estimate the fee for a P2PKH transaction.
///
/// Computes `estimated_size * fee_rate` where the size is derived from the
/// number of inputs and outputs using P2PKH size estimates.
pub fn estimate_fee(num_inputs: usize, num_outputs: usize, fee_rate: u64) -> u64 {
    let size = TX_OVERHEAD_BYTES
        + (num_inputs as u64 * P2PKH_INPUT_BYTES)
        + (num_outputs as u64 * OUTPUT_BYTES);
    size * fee_rate
}

/// Change left after paying `amount_sat` and `fee_sat`.
///
/// Returns `None` when the leftover does not exceed `dust_limit` (it is
/// absorbed into the fee) and fails when the inputs do not cover the spend.
pub fn compute_change(
    total_input_sat: u64,
    amount_sat: u64,
    fee_sat: u64,
    dust_limit: u64,
) -> Result<Option<u64>, BsvError> {
    let needed = amount_sat.saturating_add(fee_sat);
    let change = total_input_sat
        .checked_sub(needed)
        .ok_or(BsvError::InsufficientFunds {
            needed,
            available: total_input_sat,
        })?;

    Ok((change > dust_limit).then_some(change))
}

/// Unspendable output carrying `data`.
pub fn data_script(data: &[u8]) -> Result<ScriptBuf, BsvError> {
    let push = PushBytesBuf::try_from(data.to_vec())
        .map_err(|e| BsvError::TransactionBuildError(format!("data output too large: {e}")))?;
    Ok(ScriptBuf::new_op_return(push))
}

/// Unspendable output describing a token transfer.
pub fn token_marker_script(transfer: &TokenTransfer) -> Result<ScriptBuf, BsvError> {
    data_script(&transfer.marker_payload())
}

/// Build an unsigned BSV transaction from a coin selection.
///
/// Output order: payment, one marker per token transfer, one `OP_RETURN` per
/// data payload, then change back to `change_address` when it exceeds the
/// dust limit.
pub fn build_transaction(
    selection: &UtxoSelection,
    plan: &OutputPlan<'_>,
    options: &TxOptions,
    network: BsvNetwork,
) -> Result<UnsignedBsvTx, BsvError> {
    let recipient_script = p2pkh_script_for_address(plan.recipient, network)?;
    let change_script = p2pkh_script_for_address(plan.change_address, network)?;

    let sequence = if options.enable_rbf {
        Sequence::ENABLE_RBF_NO_LOCKTIME
    } else {
        Sequence::MAX
    };

    let mut inputs = Vec::with_capacity(selection.selected.len());
    for utxo in &selection.selected {
        let txid: Txid = utxo.txid.parse().map_err(|e| {
            BsvError::TransactionBuildError(format!("invalid txid {}: {e}", utxo.txid))
        })?;

        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.vout),
            script_sig: ScriptBuf::new(),
            sequence,
            witness: Witness::default(),
        });
    }

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(plan.amount_sat),
        script_pubkey: recipient_script,
    }];

    for transfer in plan.token_transfers {
        outputs.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: token_marker_script(transfer)?,
        });
    }

    for data_output in plan.data_outputs {
        outputs.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: data_script(&data_output.data)?,
        });
    }

    let change = compute_change(
        selection.total_sat,
        plan.amount_sat,
        selection.fee_sat,
        options.dust_limit,
    )?;

    let change_index = change.map(|change_sat| {
        outputs.push(TxOut {
            value: Amount::from_sat(change_sat),
            script_pubkey: change_script,
        });
        outputs.len() - 1
    });
    let change_sat = change.unwrap_or(0);

    let tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    Ok(UnsignedBsvTx {
        tx,
        inputs: selection.selected.clone(),
        fee_sat: selection.total_sat - plan.amount_sat - change_sat,
        change_sat,
        change_index,
    })
}

/// Locking script of a spent output, rebuilt from its owning address. Falls
/// back to the recorded script when the indexer did not report an address.
fn locking_script(utxo: &Utxo, network: BsvNetwork) -> Result<ScriptBuf, BsvError> {
    if !utxo.address.is_empty() {
        return p2pkh_script_for_address(&utxo.address, network);
    }
    let recorded = ScriptBuf::from(utxo.script_pubkey.clone());
    if recorded.is_p2pkh() {
        Ok(recorded)
    } else {
        Err(BsvError::SigningError(format!(
            "output {} has no address and a non-P2PKH script",
            utxo.outpoint_key()
        )))
    }
}

/// Signature hash of input `input_index` under `SIGHASH_ALL | FORKID`.
///
/// Uses the BIP-143 preimage layout, so the digest commits to the value of
/// the output being spent:
/// `version | hashPrevouts | hashSequence | outpoint | scriptCode | value |
/// nSequence | hashOutputs | locktime | sighash type`.
pub fn forkid_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    value: Amount,
) -> Result<sha256d::Hash, BsvError> {
    let input = tx.input.get(input_index).ok_or_else(|| {
        BsvError::SigningError(format!(
            "input {input_index} out of range for {} inputs",
            tx.input.len()
        ))
    })?;

    let mut prevouts = Vec::with_capacity(tx.input.len() * 36);
    let mut sequences = Vec::with_capacity(tx.input.len() * 4);
    for txin in &tx.input {
        prevouts.extend(serialize(&txin.previous_output));
        sequences.extend(serialize(&txin.sequence));
    }
    let mut outputs = Vec::new();
    for txout in &tx.output {
        outputs.extend(serialize(txout));
    }

    let mut preimage = Vec::with_capacity(160 + script_code.len());
    preimage.extend(serialize(&tx.version));
    preimage.extend(sha256d::Hash::hash(&prevouts).to_byte_array());
    preimage.extend(sha256d::Hash::hash(&sequences).to_byte_array());
    preimage.extend(serialize(&input.previous_output));
    preimage.extend(serialize(&script_code.to_owned()));
    preimage.extend(value.to_sat().to_le_bytes());
    preimage.extend(serialize(&input.sequence));
    preimage.extend(sha256d::Hash::hash(&outputs).to_byte_array());
    preimage.extend(serialize(&tx.lock_time));
    preimage.extend(SIGHASH_ALL_FORKID.to_le_bytes());

    Ok(sha256d::Hash::hash(&preimage))
}

/// Sign an unsigned transaction with the given private key.
///
/// All inputs are assumed to be controlled by the same key. Each input gets a
/// `SIGHASH_ALL | FORKID` signature and a `<sig> <compressed pubkey>`
/// unlocking script. Signing is deterministic (RFC 6979).
pub fn sign_transaction(
    unsigned_tx: &UnsignedBsvTx,
    private_key: &[u8; 32],
    network: BsvNetwork,
) -> Result<SignedBsvTx, BsvError> {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(private_key)
        .map_err(|e| BsvError::InvalidPrivateKey(format!("invalid secret key: {e}")))?;
    let public_key = PublicKey::new(bitcoin::secp256k1::PublicKey::from_secret_key(
        &secp,
        &secret_key,
    ));

    if unsigned_tx.inputs.len() != unsigned_tx.tx.input.len() {
        return Err(BsvError::SigningError(format!(
            "{} spent outputs for {} inputs",
            unsigned_tx.inputs.len(),
            unsigned_tx.tx.input.len()
        )));
    }

    let mut signed_tx = unsigned_tx.tx.clone();

    for (input_index, utxo) in unsigned_tx.inputs.iter().enumerate() {
        let script_code = locking_script(utxo, network)?;
        let sighash = forkid_signature_hash(
            &unsigned_tx.tx,
            input_index,
            &script_code,
            Amount::from_sat(utxo.amount_sat),
        )?;

        let msg = Message::from_digest(sighash.to_byte_array());
        let mut sig_bytes = secp.sign_ecdsa(&msg, &secret_key).serialize_der().to_vec();
        sig_bytes.push(SIGHASH_ALL_FORKID as u8);

        let sig_push = PushBytesBuf::try_from(sig_bytes)
            .map_err(|e| BsvError::SigningError(format!("signature push failed: {e}")))?;

        signed_tx.input[input_index].script_sig = Builder::new()
            .push_slice(sig_push)
            .push_key(&public_key)
            .into_script();
    }

    let raw = serialize(&signed_tx);
    let txid = signed_tx.compute_txid().to_string();

    Ok(SignedBsvTx {
        tx: signed_tx,
        raw,
        txid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::pubkey_to_p2pkh_address;
    use crate::utxo::UtxoKind;
    use bitcoin::script::Instruction;

    const RECIPIENT: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const KEY: [u8; 32] = [0x42; 32];

    fn owner_address() -> String {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&KEY).unwrap();
        let pk = bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &sk);
        pubkey_to_p2pkh_address(&pk.serialize(), BsvNetwork::Mainnet).unwrap()
    }

    fn make_utxo(fill: char, amount_sat: u64) -> Utxo {
        Utxo {
            txid: fill.to_string().repeat(64),
            vout: 0,
            amount_sat,
            address: owner_address(),
            script_pubkey: Vec::new(),
            confirmations: 3,
            height: 1,
            kind: UtxoKind::Native,
        }
    }

    fn selection(utxos: Vec<Utxo>, fee_sat: u64) -> UtxoSelection {
        UtxoSelection {
            total_sat: utxos.iter().map(|u| u.amount_sat).sum(),
            selected: utxos,
            fee_sat,
            fee_rate: 1,
        }
    }

    const OPTIONS: TxOptions = TxOptions {
        dust_limit: 546,
        enable_rbf: false,
    };

    fn plan<'a>(
        amount_sat: u64,
        change: &'a str,
        tokens: &'a [TokenTransfer],
        data: &'a [DataOutput],
    ) -> OutputPlan<'a> {
        OutputPlan {
            recipient: RECIPIENT,
            amount_sat,
            change_address: change,
            token_transfers: tokens,
            data_outputs: data,
        }
    }

    #[test]
    fn estimate_fee_basic() {
        // 1 input, 2 outputs: 10 + 148 + 68 = 226 bytes at 1 sat/byte
        assert_eq!(estimate_fee(1, 2, 1), 226);
    }

    #[test]
    fn estimate_fee_scales_with_inputs() {
        let fee_1 = estimate_fee(1, 2, 10);
        let fee_2 = estimate_fee(2, 2, 10);
        assert_eq!(fee_2 - fee_1, P2PKH_INPUT_BYTES * 10);
    }

    #[test]
    fn estimate_fee_zero_rate() {
        assert_eq!(estimate_fee(5, 5, 0), 0);
    }

    #[test]
    fn change_above_dust_is_kept() {
        assert_eq!(compute_change(100_000, 50_000, 226, 546).unwrap(), Some(49_774));
    }

    #[test]
    fn change_at_or_below_dust_is_absorbed() {
        assert_eq!(compute_change(10_000, 9_000, 454, 546).unwrap(), None);
        assert_eq!(compute_change(10_000, 9_000, 500, 546).unwrap(), None);
    }

    #[test]
    fn change_underflow_is_insufficient_funds() {
        let err = compute_change(1_000, 1_000, 226, 546).unwrap_err();
        assert_eq!(
            err,
            BsvError::InsufficientFunds {
                needed: 1_226,
                available: 1_000,
            }
        );
    }

    #[test]
    fn build_with_change_output() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 100_000)], 1_130);
        let p = plan(50_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();

        assert_eq!(unsigned.tx.input.len(), 1);
        assert_eq!(unsigned.tx.output.len(), 2);
        assert_eq!(unsigned.tx.output[0].value.to_sat(), 50_000);
        assert_eq!(unsigned.tx.output[1].value.to_sat(), 48_870);
        assert_eq!(unsigned.change_index, Some(1));
        assert_eq!(unsigned.fee_sat, 1_130);
        assert_eq!(unsigned.tx.input[0].sequence, Sequence::MAX);
        assert_eq!(unsigned.tx.version, Version::ONE);
    }

    #[test]
    fn build_dust_change_omitted() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('b', 100_000)], 226);
        let p = plan(99_500, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();

        assert_eq!(unsigned.tx.output.len(), 1);
        assert_eq!(unsigned.change_index, None);
        assert_eq!(unsigned.change_sat, 0);
        // Leftover 274 sat is part of the fee.
        assert_eq!(unsigned.fee_sat, 500);
    }

    #[test]
    fn build_orders_marker_and_data_outputs_before_change() {
        let owner = owner_address();
        let tokens = [TokenTransfer {
            token_id: "gold".into(),
            to: RECIPIENT.into(),
            amount: 7,
        }];
        let data = [DataOutput::new(b"hello".to_vec())];
        let sel = selection(vec![make_utxo('c', 100_000)], 1_000);
        let p = plan(10_000, &owner, &tokens, &data);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();

        let outs = &unsigned.tx.output;
        assert_eq!(outs.len(), 4);
        assert!(outs[1].script_pubkey.is_op_return());
        assert_eq!(outs[1].value, Amount::ZERO);
        assert!(outs[2].script_pubkey.is_op_return());
        assert_eq!(unsigned.change_index, Some(3));

        let marker = outs[1].script_pubkey.as_bytes();
        let expected = format!("TOKEN_TRANSFER:gold:{RECIPIENT}:7");
        assert!(marker.ends_with(expected.as_bytes()));
        assert!(outs[2].script_pubkey.as_bytes().ends_with(b"hello"));
    }

    #[test]
    fn build_is_deterministic() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('d', 70_000), make_utxo('e', 20_000)], 1_870);
        let p = plan(60_000, &owner, &[], &[]);
        let first = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        let second = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        assert_eq!(first.to_bytes(), second.to_bytes());
    }

    #[test]
    fn build_rbf_sequence() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('f', 100_000)], 226);
        let options = TxOptions {
            enable_rbf: true,
            ..OPTIONS
        };
        let p = plan(1_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &options, BsvNetwork::Mainnet).unwrap();
        assert_eq!(unsigned.tx.input[0].sequence, Sequence::ENABLE_RBF_NO_LOCKTIME);
    }

    #[test]
    fn build_insufficient_funds() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 1_000)], 226);
        let p = plan(500_000, &owner, &[], &[]);
        let result = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet);
        assert!(matches!(result, Err(BsvError::InsufficientFunds { .. })));
    }

    #[test]
    fn build_invalid_recipient() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 100_000)], 226);
        let mut p = plan(1_000, &owner, &[], &[]);
        p.recipient = "not_a_valid_address";
        let result = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet);
        assert!(matches!(result, Err(BsvError::InvalidAddress(_))));
    }

    #[test]
    fn build_rejects_witness_recipient() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 100_000)], 226);
        let mut p = plan(1_000, &owner, &[], &[]);
        p.recipient = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
        let result = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet);
        assert!(matches!(result, Err(BsvError::InvalidAddress(_))));
    }

    #[test]
    fn build_wrong_network() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 100_000)], 226);
        let p = plan(1_000, &owner, &[], &[]);
        let result = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Testnet);
        assert!(result.is_err());
    }

    #[test]
    fn data_output_from_hex() {
        assert_eq!(DataOutput::from_hex("cafe").unwrap().data, vec![0xca, 0xfe]);
        assert!(DataOutput::from_hex("zz").is_err());
    }

    #[test]
    fn sign_produces_verifiable_script_sigs() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 60_000), make_utxo('b', 40_000)], 1_870);
        let p = plan(90_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();

        let signed = sign_transaction(&unsigned, &KEY, BsvNetwork::Mainnet).unwrap();
        assert_eq!(signed.txid, signed.tx.compute_txid().to_string());
        assert!(signed.raw.len() > unsigned.to_bytes().len());

        let secp = Secp256k1::new();
        let script_code = p2pkh_script_for_address(&owner, BsvNetwork::Mainnet).unwrap();

        for (index, input) in signed.tx.input.iter().enumerate() {
            let pushes: Vec<Vec<u8>> = input
                .script_sig
                .instructions()
                .map(|ins| match ins.unwrap() {
                    Instruction::PushBytes(bytes) => bytes.as_bytes().to_vec(),
                    Instruction::Op(op) => panic!("unexpected opcode {op}"),
                })
                .collect();
            assert_eq!(pushes.len(), 2);

            let (sighash_byte, der) = pushes[0].split_last().unwrap();
            assert_eq!(*sighash_byte, 0x41);
            let sig = bitcoin::secp256k1::ecdsa::Signature::from_der(der).unwrap();
            let pk = PublicKey::from_slice(&pushes[1]).unwrap();
            assert!(pk.compressed);

            let value = Amount::from_sat(unsigned.inputs[index].amount_sat);
            let sighash = forkid_signature_hash(&unsigned.tx, index, &script_code, value).unwrap();
            let msg = Message::from_digest(sighash.to_byte_array());
            secp.verify_ecdsa(&msg, &sig, &pk.inner).unwrap();
        }
    }

    #[test]
    fn forkid_sighash_commits_to_spent_value_and_input() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 60_000), make_utxo('b', 40_000)], 1_870);
        let p = plan(90_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        let script_code = p2pkh_script_for_address(&owner, BsvNetwork::Mainnet).unwrap();

        let base = forkid_signature_hash(&unsigned.tx, 0, &script_code, Amount::from_sat(60_000))
            .unwrap();
        let other_value =
            forkid_signature_hash(&unsigned.tx, 0, &script_code, Amount::from_sat(60_001))
                .unwrap();
        let other_input =
            forkid_signature_hash(&unsigned.tx, 1, &script_code, Amount::from_sat(60_000))
                .unwrap();

        assert_ne!(base, other_value);
        assert_ne!(base, other_input);
        assert!(matches!(
            forkid_signature_hash(&unsigned.tx, 2, &script_code, Amount::ZERO),
            Err(BsvError::SigningError(_))
        ));
    }

    #[test]
    fn forkid_sighash_differs_from_legacy() {
        use bitcoin::sighash::{EcdsaSighashType, SighashCache};

        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 60_000)], 226);
        let p = plan(10_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        let script_code = p2pkh_script_for_address(&owner, BsvNetwork::Mainnet).unwrap();

        let legacy = SighashCache::new(&unsigned.tx)
            .legacy_signature_hash(0, &script_code, EcdsaSighashType::All.to_u32())
            .unwrap();
        let forkid =
            forkid_signature_hash(&unsigned.tx, 0, &script_code, Amount::from_sat(60_000))
                .unwrap();
        assert_ne!(legacy.to_byte_array(), forkid.to_byte_array());
    }

    #[test]
    fn signing_is_deterministic() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 60_000)], 226);
        let p = plan(10_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        let a = sign_transaction(&unsigned, &KEY, BsvNetwork::Mainnet).unwrap();
        let b = sign_transaction(&unsigned, &KEY, BsvNetwork::Mainnet).unwrap();
        assert_eq!(a.raw, b.raw);
    }

    #[test]
    fn sign_transaction_invalid_key() {
        let owner = owner_address();
        let sel = selection(vec![make_utxo('a', 60_000)], 226);
        let p = plan(10_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        // All-zero is not a valid secp256k1 private key.
        let result = sign_transaction(&unsigned, &[0u8; 32], BsvNetwork::Mainnet);
        assert!(matches!(result, Err(BsvError::InvalidPrivateKey(_))));
    }

    #[test]
    fn sign_falls_back_to_recorded_p2pkh_script() {
        let owner = owner_address();
        let script = p2pkh_script_for_address(&owner, BsvNetwork::Mainnet).unwrap();
        let mut utxo = make_utxo('a', 60_000);
        utxo.address = String::new();
        utxo.script_pubkey = script.to_bytes();

        let sel = selection(vec![utxo.clone()], 226);
        let p = plan(10_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        assert!(sign_transaction(&unsigned, &KEY, BsvNetwork::Mainnet).is_ok());

        utxo.script_pubkey = vec![0x6a];
        let sel = selection(vec![utxo], 226);
        let p = plan(10_000, &owner, &[], &[]);
        let unsigned = build_transaction(&sel, &p, &OPTIONS, BsvNetwork::Mainnet).unwrap();
        assert!(matches!(
            sign_transaction(&unsigned, &KEY, BsvNetwork::Mainnet),
            Err(BsvError::SigningError(_))
        ));
    }
}
