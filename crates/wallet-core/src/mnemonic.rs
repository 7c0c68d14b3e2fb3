use bip39::{Language, Mnemonic};
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Validate a mnemonic phrase
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, phrase).is_ok()
}

/// Derive the 64-byte seed from mnemonic + optional passphrase.
/// The seed is wiped when the returned buffer is dropped.
pub fn mnemonic_to_seed(
    phrase: &str,
    passphrase: &str,
) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// Whether `secret` has the shape of a mnemonic (twelve or more words)
/// rather than an encoded key.
pub fn looks_like_mnemonic(secret: &str) -> bool {
    secret.split_whitespace().count() >= 12
}
