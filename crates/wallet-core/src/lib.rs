pub mod broadcast;
pub mod builder;
pub mod cache;
pub mod config;
pub mod credential;
pub mod discovery;
pub mod error;
pub mod hd_derivation;
pub mod indexer;
pub mod mnemonic;
pub mod result;
pub mod retry;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use chain_bsv::balance::{Aggregate, BalanceSnapshot};
use chain_bsv::network::BsvNetwork;
use chain_bsv::utxo::{select_utxos, select_utxos_for_token, Utxo, UtxoSelection};

use broadcast::Broadcaster;
use builder::{BuiltTransaction, TransactionBuilder};
use config::{Config, ConfigManager};
use discovery::OutputDiscovery;
use error::WalletError;
use hd_derivation::{derive_secp256k1_key, Bip44Path};
use indexer::{HttpIndexer, Indexer};
use types::{DerivedAddress, TransactionParams, TransactionResult};

pub use chain_bsv;

// ─── Service ─────────────────────────────────────────────────────────

/// UTXO wallet service for one indexer.
///
/// Shareable across tasks. Every operation reads a single configuration
/// snapshot when it starts.
pub struct WalletService {
    config: ConfigManager,
    discovery: OutputDiscovery,
    broadcaster: Broadcaster,
}

impl WalletService {
    /// Service backed by the HTTP indexer at `config.network.api_url`.
    pub fn new(config: Config) -> Result<Self, WalletError> {
        let indexer = HttpIndexer::new()?;
        Self::with_indexer(config, Arc::new(indexer))
    }

    pub fn with_indexer(config: Config, indexer: Arc<dyn Indexer>) -> Result<Self, WalletError> {
        Ok(Self {
            config: ConfigManager::new(config)?,
            discovery: OutputDiscovery::new(indexer.clone()),
            broadcaster: Broadcaster::new(indexer),
        })
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    fn check_address(address: &str, config: &Config) -> Result<(), WalletError> {
        chain_bsv::address::parse_address(address, config.network.network)?;
        Ok(())
    }

    // ─── Discovery ───────────────────────────────────────────────────

    /// Spendable outputs of `address`, served from the cache when fresh.
    pub async fn outputs(&self, address: &str) -> Result<Vec<Utxo>, WalletError> {
        let config = self.config.snapshot();
        self.outputs_in(address, &config).await
    }

    async fn outputs_in(&self, address: &str, config: &Config) -> Result<Vec<Utxo>, WalletError> {
        Self::check_address(address, config)?;
        Ok(self.discovery.snapshot(address, config).await?.outputs)
    }

    pub async fn balance(&self, address: &str) -> Result<BalanceSnapshot, WalletError> {
        let config = self.config.snapshot();
        Self::check_address(address, &config)?;
        Ok(self.discovery.snapshot(address, &config).await?.balance)
    }

    pub async fn native_balance(&self, address: &str) -> Result<Aggregate, WalletError> {
        Ok(self.balance(address).await?.native)
    }

    pub async fn token_balances(
        &self,
        address: &str,
    ) -> Result<BTreeMap<String, Aggregate>, WalletError> {
        Ok(self.balance(address).await?.tokens)
    }

    /// Confirmed native balance in satoshis.
    pub async fn confirmed_balance(&self, address: &str) -> Result<i64, WalletError> {
        Ok(self.balance(address).await?.native.confirmed)
    }

    // ─── Selection ───────────────────────────────────────────────────

    /// Native inputs covering `amount_sat` plus fee, using the configured
    /// inclusion flags.
    pub async fn select_outputs(
        &self,
        address: &str,
        amount_sat: u64,
        fee_rate: Option<u64>,
    ) -> Result<UtxoSelection, WalletError> {
        let config = self.config.snapshot();
        self.select_outputs_in(address, amount_sat, fee_rate, &config)
            .await
    }

    async fn select_outputs_in(
        &self,
        address: &str,
        amount_sat: u64,
        fee_rate: Option<u64>,
        config: &Config,
    ) -> Result<UtxoSelection, WalletError> {
        let settings = &config.transaction;
        let fee_rate = Self::selection_fee_rate(fee_rate, config)?;
        let outputs = self.outputs_in(address, config).await?;
        Ok(select_utxos(
            &outputs,
            amount_sat,
            fee_rate,
            &settings.fee_policy(),
            settings.inclusion(),
        )?)
    }

    /// Token inputs covering `amount` units of `token_id`, plus native
    /// inputs paying the fee.
    pub async fn select_outputs_for_token(
        &self,
        address: &str,
        token_id: &str,
        amount: u64,
        fee_rate: Option<u64>,
    ) -> Result<UtxoSelection, WalletError> {
        let config = self.config.snapshot();
        let fee_rate = Self::selection_fee_rate(fee_rate, &config)?;
        let outputs = self.outputs_in(address, &config).await?;
        Ok(select_utxos_for_token(
            &outputs,
            token_id,
            amount,
            fee_rate,
            &config.transaction.fee_policy(),
        )?)
    }

    /// Rates above the ceiling are rejected; low rates are left to the
    /// selector, which raises them to the default.
    fn selection_fee_rate(fee_rate: Option<u64>, config: &Config) -> Result<u64, WalletError> {
        let settings = &config.transaction;
        let rate = fee_rate.unwrap_or(settings.default_fee_rate);
        if rate > settings.max_fee_rate {
            return Err(WalletError::FeeRateOutOfRange {
                rate,
                min: settings.min_fee_rate,
                max: settings.max_fee_rate,
            });
        }
        Ok(rate)
    }

    // ─── Transactions ────────────────────────────────────────────────

    /// Build and sign a transaction without broadcasting it.
    pub async fn build_transaction(
        &self,
        params: &TransactionParams,
    ) -> Result<BuiltTransaction, WalletError> {
        let config = self.config.snapshot();
        TransactionBuilder::new(&self.discovery)
            .build(params, &config)
            .await
    }

    /// Build, sign and broadcast a transaction.
    ///
    /// A rejected broadcast is reported as `BroadcastRejected` and never
    /// resubmitted. On success the sender's cache entry is dropped so the
    /// spent outputs are not offered again.
    pub async fn sign_and_send(
        &self,
        params: &TransactionParams,
    ) -> Result<TransactionResult, WalletError> {
        let config = self.config.snapshot();
        let builder = TransactionBuilder::new(&self.discovery);

        let built = builder.build(params, &config).await?;
        self.broadcaster.submit(&config.network, &built.signed).await?;

        let result = result::synthesize(&builder, params, &config, &built).await;
        self.discovery.cache().invalidate(&built.sender);
        Ok(result)
    }

    // ─── Cache ───────────────────────────────────────────────────────

    pub fn clear_cache(&self) {
        self.discovery.cache().invalidate_all();
    }

    pub fn clear_cache_for(&self, address: &str) {
        self.discovery.cache().invalidate(address);
    }
}

// ─── Keys and addresses ──────────────────────────────────────────────

/// Derive the P2PKH address at `path` from a mnemonic.
pub fn derive_address(
    mnemonic_phrase: &str,
    network: BsvNetwork,
    path: Bip44Path,
) -> Result<DerivedAddress, WalletError> {
    let seed = mnemonic::mnemonic_to_seed(mnemonic_phrase, "")?;
    let key = derive_secp256k1_key(&seed[..], network, path)?;
    let address =
        chain_bsv::address::pubkey_to_p2pkh_address(&key.public_key_compressed, network)?;
    Ok(DerivedAddress {
        address,
        derivation_path: key.derivation_path.clone(),
    })
}

/// Validate an address for a given network
pub fn validate_address(address: &str, network: BsvNetwork) -> Result<bool, WalletError> {
    Ok(chain_bsv::address::validate_address(address, network)?)
}
