use bitcoin::address::{Address, AddressType, NetworkUnchecked};
use bitcoin::{CompressedPublicKey, ScriptBuf};

use crate::error::BsvError;
use crate::network::BsvNetwork;

/// Derive a legacy P2PKH address from a compressed public key.
///
/// Takes a 33-byte compressed secp256k1 public key and returns a base58check
/// address string: `1...` for mainnet, `m...`/`n...` for testnet.
pub fn pubkey_to_p2pkh_address(
    pubkey_bytes: &[u8; 33],
    network: BsvNetwork,
) -> Result<String, BsvError> {
    let compressed_pk = CompressedPublicKey::from_slice(pubkey_bytes).map_err(|e| {
        BsvError::InvalidPublicKey(format!("failed to parse compressed public key: {e}"))
    })?;

    let address = Address::p2pkh(compressed_pk.pubkey_hash(), network.network_kind());

    Ok(address.to_string())
}

/// Parse an address string without committing to a network.
///
/// Only base58 P2PKH addresses exist on BSV. Bech32 and taproot strings
/// parse fine with `bitcoin` but would produce witness outputs, so they are
/// rejected here.
fn parse_p2pkh(address: &str) -> Result<Address<NetworkUnchecked>, BsvError> {
    let parsed = address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BsvError::InvalidAddress(format!("failed to parse address: {e}")))?;

    if parsed.clone().assume_checked().address_type() != Some(AddressType::P2pkh) {
        return Err(BsvError::InvalidAddress(format!(
            "{address} is not a P2PKH address"
        )));
    }
    Ok(parsed)
}

/// Validate an address string for the given network.
///
/// Returns `true` if the address is valid for the specified network,
/// `false` if it parses but belongs to a different network.
pub fn validate_address(address: &str, network: BsvNetwork) -> Result<bool, BsvError> {
    Ok(parse_p2pkh(address)?.is_valid_for_network(network.to_bitcoin_network()))
}

/// Parse a P2PKH address and require it to belong to `network`.
pub fn parse_address(address: &str, network: BsvNetwork) -> Result<Address, BsvError> {
    parse_p2pkh(address)?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BsvError::InvalidAddress(format!("address {address} wrong network: {e}")))
}

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG` for `address`.
pub fn p2pkh_script_for_address(
    address: &str,
    network: BsvNetwork,
) -> Result<ScriptBuf, BsvError> {
    Ok(parse_address(address, network)?.script_pubkey())
}
