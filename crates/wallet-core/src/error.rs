use chain_bsv::error::BsvError;
use thiserror::Error;

use crate::indexer::IndexerError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Fee rate {rate} outside allowed range [{min}, {max}]")]
    FeeRateOutOfRange { rate: u64, min: u64, max: u64 },

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Sender {declared} does not match credential address {derived}")]
    SenderMismatch { declared: String, derived: String },

    #[error("Insufficient funds: need {needed} sat, have {available} sat")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("Insufficient {token_id} balance: need {needed}, have {available}")]
    InsufficientTokenBalance {
        token_id: String,
        needed: u64,
        available: u64,
    },

    #[error("Insufficient native balance for fees: need {needed} sat, have {available} sat")]
    InsufficientFeeFunds { needed: u64, available: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Broadcast rejected with status {status}: {body}")]
    BroadcastRejected { status: u16, body: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Transaction build failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction size {size} bytes exceeds maximum {max}")]
    TransactionTooLarge { size: usize, max: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalletError {
    /// Whether the error reports a shortfall of spendable value.
    pub fn is_insufficient(&self) -> bool {
        matches!(
            self,
            WalletError::InsufficientFunds { .. }
                | WalletError::InsufficientTokenBalance { .. }
                | WalletError::InsufficientFeeFunds { .. }
        )
    }
}

impl From<BsvError> for WalletError {
    fn from(e: BsvError) -> Self {
        match e {
            BsvError::InvalidPrivateKey(msg) => WalletError::InvalidPrivateKey(msg),
            BsvError::InvalidPublicKey(msg) => WalletError::DerivationFailed(msg),
            BsvError::InvalidAddress(msg) => WalletError::InvalidAddress(msg),
            BsvError::TransactionBuildError(msg) => WalletError::TransactionFailed(msg),
            BsvError::SigningError(msg) => WalletError::SigningFailed(msg),
            // Callers check the configured bounds first; the selector only
            // knows the ceiling.
            e @ BsvError::FeeRateOutOfRange { .. } => WalletError::InvalidParams(e.to_string()),
            BsvError::InsufficientFunds { needed, available } => {
                WalletError::InsufficientFunds { needed, available }
            }
            BsvError::InsufficientTokenBalance {
                token_id,
                needed,
                available,
            } => WalletError::InsufficientTokenBalance {
                token_id,
                needed,
                available,
            },
            BsvError::InsufficientFeeFunds { needed, available } => {
                WalletError::InsufficientFeeFunds { needed, available }
            }
        }
    }
}

impl From<IndexerError> for WalletError {
    fn from(e: IndexerError) -> Self {
        WalletError::Network(e.to_string())
    }
}
