use bip32::{DerivationPath, XPrv};
use chain_bsv::network::BsvNetwork;
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::WalletError;

/// Account, change and index of a BIP-44 path. The purpose (44') and coin
/// type come from the network: m/44'/236'/account'/change/index on mainnet,
/// m/44'/1'/account'/change/index on testnet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bip44Path {
    pub account: u32,
    pub change: u32,
    pub index: u32,
}

impl Bip44Path {
    pub fn new(account: u32, change: u32, index: u32) -> Self {
        Self {
            account,
            change,
            index,
        }
    }

    pub fn to_path_string(&self, network: BsvNetwork) -> String {
        format!(
            "m/44'/{}'/{}'/{}/{}",
            network.coin_type(),
            self.account,
            self.change,
            self.index
        )
    }
}

/// Derive a secp256k1 private key from seed using BIP-32
pub fn derive_secp256k1_key(
    seed: &[u8],
    network: BsvNetwork,
    path: Bip44Path,
) -> Result<DerivedKey, WalletError> {
    let path_str = path.to_path_string(network);

    let derivation_path: DerivationPath = path_str
        .parse()
        .map_err(|e: bip32::Error| WalletError::DerivationFailed(e.to_string()))?;

    let xprv = XPrv::derive_from_path(seed, &derivation_path)
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;

    let private_key_bytes: [u8; 32] = xprv.to_bytes().into();
    let signing_key = SigningKey::from_bytes(&private_key_bytes.into())
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;

    let public_key_compressed: [u8; 33] = signing_key
        .verifying_key()
        .to_sec1_bytes()
        .as_ref()
        .try_into()
        .map_err(|_| WalletError::DerivationFailed("Invalid public key length".into()))?;

    Ok(DerivedKey {
        private_key: private_key_bytes,
        public_key_compressed,
        derivation_path: path_str,
    })
}

/// Derived secp256k1 key
pub struct DerivedKey {
    pub private_key: [u8; 32],
    pub public_key_compressed: [u8; 33],
    pub derivation_path: String,
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}
