//! Spending credentials and their resolution to a signing key.

use std::fmt;

use bitcoin::secp256k1::Secp256k1;
use bitcoin::PrivateKey;
use chain_bsv::address::pubkey_to_p2pkh_address;
use chain_bsv::network::BsvNetwork;
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;
use crate::hd_derivation::{derive_secp256k1_key, Bip44Path};
use crate::mnemonic::{looks_like_mnemonic, mnemonic_to_seed, validate_mnemonic};

/// Secret material authorizing a spend.
#[derive(Clone)]
pub enum Credential {
    /// BIP-39 phrase and the BIP-44 path of the spending key.
    Mnemonic {
        phrase: Zeroizing<String>,
        path: Bip44Path,
    },
    /// WIF-encoded private key.
    EncodedKey(Zeroizing<String>),
}

impl Credential {
    /// Mnemonic credential for the first receiving key of account 0.
    pub fn mnemonic(phrase: impl Into<String>) -> Self {
        Self::mnemonic_with_path(phrase, Bip44Path::default())
    }

    pub fn mnemonic_with_path(phrase: impl Into<String>, path: Bip44Path) -> Self {
        Credential::Mnemonic {
            phrase: Zeroizing::new(phrase.into()),
            path,
        }
    }

    pub fn encoded_key(wif: impl Into<String>) -> Self {
        Credential::EncodedKey(Zeroizing::new(wif.into()))
    }

    /// Classify a raw secret: twelve or more words is a mnemonic (default
    /// path), anything else an encoded key.
    pub fn parse(secret: &str) -> Self {
        let secret = secret.trim();
        if looks_like_mnemonic(secret) {
            Self::mnemonic(secret)
        } else {
            Self::encoded_key(secret)
        }
    }

    /// Resolve to the signing key and its P2PKH address on `network`.
    pub fn resolve(&self, network: BsvNetwork) -> Result<SenderKey, WalletError> {
        match self {
            Credential::Mnemonic { phrase, path } => {
                if !validate_mnemonic(phrase) {
                    return Err(WalletError::InvalidMnemonic("Invalid mnemonic phrase".into()));
                }
                let seed = mnemonic_to_seed(phrase, "")?;
                let key = derive_secp256k1_key(&seed[..], network, *path)?;
                let address = pubkey_to_p2pkh_address(&key.public_key_compressed, network)?;
                Ok(SenderKey {
                    address,
                    public_key: key.public_key_compressed,
                    secret: key.private_key,
                })
            }
            Credential::EncodedKey(wif) => {
                let key = PrivateKey::from_wif(wif.trim())
                    .map_err(|e| WalletError::InvalidPrivateKey(format!("invalid WIF: {e}")))?;
                if key.network != network.network_kind() {
                    return Err(WalletError::InvalidPrivateKey(format!(
                        "key does not belong to {network}"
                    )));
                }
                if !key.compressed {
                    return Err(WalletError::InvalidPrivateKey(
                        "uncompressed keys are not supported".into(),
                    ));
                }

                let secp = Secp256k1::new();
                let public_key = key.public_key(&secp).inner.serialize();
                let address = pubkey_to_p2pkh_address(&public_key, network)?;
                Ok(SenderKey {
                    address,
                    public_key,
                    secret: key.inner.secret_bytes(),
                })
            }
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Mnemonic { path, .. } => f
                .debug_struct("Mnemonic")
                .field("phrase", &"<redacted>")
                .field("path", path)
                .finish(),
            Credential::EncodedKey(_) => f.debug_tuple("EncodedKey").field(&"<redacted>").finish(),
        }
    }
}

/// A resolved spending key. The secret is wiped on drop.
pub struct SenderKey {
    pub address: String,
    pub public_key: [u8; 33],
    secret: [u8; 32],
}

impl SenderKey {
    pub fn secret(&self) -> &[u8; 32] {
        &self.secret
    }
}

impl fmt::Debug for SenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Drop for SenderKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}
