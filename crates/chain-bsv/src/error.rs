use thiserror::Error;

/// BSV chain operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BsvError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("fee rate {rate} exceeds maximum allowed {max}")]
    FeeRateOutOfRange { rate: u64, max: u64 },

    #[error("insufficient funds: need {needed} sat, have {available} sat")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("insufficient token balance for {token_id}: need {needed}, have {available}")]
    InsufficientTokenBalance {
        token_id: String,
        needed: u64,
        available: u64,
    },

    #[error("insufficient native balance for fees: need {needed} sat, have {available} sat")]
    InsufficientFeeFunds { needed: u64, available: u64 },
}
