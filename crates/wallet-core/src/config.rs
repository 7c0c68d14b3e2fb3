//! Wallet configuration: TOML-loadable sections with defaults, and a
//! [`ConfigManager`] publishing immutable snapshots.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chain_bsv::network::BsvNetwork;
use chain_bsv::transaction::TxOptions;
use chain_bsv::utxo::{FeePolicy, InclusionPolicy};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::retry::RetryPolicy;

/// Indexer endpoint and explorer for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub api_url: String,
    pub explorer_url: String,
    pub network: BsvNetwork,

    /// Absolute timeout of every indexer request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per indexer read, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff; attempt `n` waits `n × retry_delay_ms` before retrying.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

impl NetworkConfig {
    pub fn mainnet() -> Self {
        Self::preset("BSV Mainnet", BsvNetwork::Mainnet)
    }

    pub fn testnet() -> Self {
        Self::preset("BSV Testnet", BsvNetwork::Testnet)
    }

    pub fn for_network(network: BsvNetwork) -> Self {
        match network {
            BsvNetwork::Mainnet => Self::mainnet(),
            BsvNetwork::Testnet => Self::testnet(),
        }
    }

    fn preset(name: &str, network: BsvNetwork) -> Self {
        Self {
            name: name.to_string(),
            api_url: network.default_api_url().to_string(),
            explorer_url: network.default_explorer_url().to_string(),
            network,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    /// `{api_url}/{path}` without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn explorer_tx_url(&self, txid: &str) -> String {
        format!("{}/tx/{txid}", self.explorer_url.trim_end_matches('/'))
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.name.is_empty() {
            return Err(WalletError::Config("network name is required".into()));
        }
        if self.api_url.is_empty() {
            return Err(WalletError::Config("API URL is required".into()));
        }
        if self.explorer_url.is_empty() {
            return Err(WalletError::Config("explorer URL is required".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(WalletError::Config("request timeout must be positive".into()));
        }
        if self.max_retries == 0 {
            return Err(WalletError::Config("max retries must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

/// Output discovery and caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtxoSettings {
    /// Whether listings include plain BSV outputs.
    pub include_native: bool,
    /// Whether listings include token outputs.
    pub include_non_native: bool,
    pub min_confirmations: u32,
    pub max_utxos_per_query: usize,
    pub enable_caching: bool,
    /// Cache entry lifetime in seconds.
    pub cache_expiry_secs: u64,
}

impl Default for UtxoSettings {
    fn default() -> Self {
        Self {
            include_native: true,
            include_non_native: true,
            min_confirmations: 1,
            max_utxos_per_query: 100,
            enable_caching: true,
            cache_expiry_secs: 300,
        }
    }
}

impl UtxoSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }

    /// Listing filter built from the include flags.
    pub fn listing_policy(&self) -> InclusionPolicy {
        InclusionPolicy {
            native: self.include_native,
            non_native: self.include_non_native,
        }
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.max_utxos_per_query == 0 {
            return Err(WalletError::Config(
                "maximum UTXOs per query must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Fee, dust and input-inclusion policy for spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionSettings {
    /// Fee rates are in sat/byte.
    pub default_fee_rate: u64,
    pub min_fee_rate: u64,
    pub max_fee_rate: u64,
    pub dust_limit: u64,
    pub max_transaction_size: usize,
    pub enable_rbf: bool,
    pub include_native_utxos: bool,
    pub include_non_native_utxos: bool,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            default_fee_rate: 5,
            min_fee_rate: 1,
            max_fee_rate: 1_000,
            dust_limit: 546,
            max_transaction_size: 100_000,
            enable_rbf: false,
            include_native_utxos: true,
            include_non_native_utxos: false,
        }
    }
}

impl TransactionSettings {
    pub fn fee_policy(&self) -> FeePolicy {
        FeePolicy {
            default_rate: self.default_fee_rate,
            min_rate: self.min_fee_rate,
            max_rate: self.max_fee_rate,
        }
    }

    pub fn inclusion(&self) -> InclusionPolicy {
        InclusionPolicy {
            native: self.include_native_utxos,
            non_native: self.include_non_native_utxos,
        }
    }

    pub fn tx_options(&self) -> TxOptions {
        TxOptions {
            dust_limit: self.dust_limit,
            enable_rbf: self.enable_rbf,
        }
    }

    /// Reject a caller-supplied rate outside `[min_fee_rate, max_fee_rate]`.
    pub fn check_fee_rate(&self, rate: u64) -> Result<(), WalletError> {
        if rate < self.min_fee_rate || rate > self.max_fee_rate {
            return Err(WalletError::FeeRateOutOfRange {
                rate,
                min: self.min_fee_rate,
                max: self.max_fee_rate,
            });
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.default_fee_rate == 0 {
            return Err(WalletError::Config("default fee rate must be positive".into()));
        }
        if self.min_fee_rate == 0 {
            return Err(WalletError::Config("minimum fee rate must be positive".into()));
        }
        if self.max_fee_rate == 0 {
            return Err(WalletError::Config("maximum fee rate must be positive".into()));
        }
        if self.min_fee_rate > self.max_fee_rate {
            return Err(WalletError::Config(
                "minimum fee rate cannot be greater than maximum fee rate".into(),
            ));
        }
        if self.max_transaction_size == 0 {
            return Err(WalletError::Config(
                "maximum transaction size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Complete wallet configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub utxo: UtxoSettings,
    #[serde(default)]
    pub transaction: TransactionSettings,
}

impl Config {
    /// Default settings on `network`.
    pub fn for_network(network: BsvNetwork) -> Self {
        Self {
            network: NetworkConfig::for_network(network),
            ..Self::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, WalletError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| WalletError::Config(format!("failed to parse TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        self.network.validate()?;
        self.utxo.validate()?;
        self.transaction.validate()
    }
}

/// Holds the live configuration.
///
/// Readers take a [`snapshot`](Self::snapshot) at the start of an operation
/// and keep it for the whole operation, so updates are never retroactive.
/// Every update is validated before it is published.
pub struct ConfigManager {
    current: ArcSwap<Config>,
    write_lock: Mutex<()>,
}

impl ConfigManager {
    pub fn new(config: Config) -> Result<Self, WalletError> {
        config.validate()?;
        Ok(Self {
            current: ArcSwap::from_pointee(config),
            write_lock: Mutex::new(()),
        })
    }

    pub fn snapshot(&self) -> Arc<Config> {
        self.current.load_full()
    }

    pub fn update(&self, config: Config) -> Result<(), WalletError> {
        let _guard = self.write_lock.lock();
        config.validate()?;
        self.current.store(Arc::new(config));
        Ok(())
    }

    pub fn update_network(&self, network: NetworkConfig) -> Result<(), WalletError> {
        self.modify(|config| config.network = network)
    }

    pub fn update_utxo(&self, utxo: UtxoSettings) -> Result<(), WalletError> {
        self.modify(|config| config.utxo = utxo)
    }

    pub fn update_transaction(&self, transaction: TransactionSettings) -> Result<(), WalletError> {
        self.modify(|config| config.transaction = transaction)
    }

    /// Switch to the preset endpoints of `network`.
    pub fn set_network(&self, network: BsvNetwork) -> Result<(), WalletError> {
        self.update_network(NetworkConfig::for_network(network))
    }

    fn modify(&self, apply: impl FnOnce(&mut Config)) -> Result<(), WalletError> {
        let _guard = self.write_lock.lock();
        let mut next = Config::clone(&self.current.load());
        apply(&mut next);
        next.validate()?;
        self.current.store(Arc::new(next));
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(Config::default()),
            write_lock: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_testnet_preset() {
        let config = Config::default();
        assert_eq!(config.network.network, BsvNetwork::Testnet);
        assert_eq!(config.network.explorer_url, "https://test.whatsonchain.com");
        assert_eq!(config.transaction.default_fee_rate, 5);
        assert_eq!(config.transaction.dust_limit, 546);
        assert!(!config.transaction.include_non_native_utxos);
        assert_eq!(config.utxo.cache_ttl(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_with_partial_sections() {
        let toml = r#"
            [network]
            name = "local"
            api_url = "http://127.0.0.1:3000"
            explorer_url = "http://127.0.0.1:3001"
            network = "mainnet"
            max_retries = 5

            [transaction]
            default_fee_rate = 2
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.network.network, BsvNetwork::Mainnet);
        assert_eq!(config.network.max_retries, 5);
        assert_eq!(config.network.request_timeout_secs, 30);
        assert_eq!(config.transaction.default_fee_rate, 2);
        assert_eq!(config.transaction.max_fee_rate, 1_000);
        assert_eq!(config.utxo.max_utxos_per_query, 100);
    }

    #[test]
    fn toml_rejects_invalid_fee_bounds() {
        let toml = r#"
            [transaction]
            min_fee_rate = 10
            max_fee_rate = 5
        "#;
        assert!(matches!(
            Config::from_toml_str(toml),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn toml_rejects_garbage() {
        assert!(matches!(
            Config::from_toml_str("network = ["),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn endpoint_joins_cleanly() {
        let mut network = NetworkConfig::mainnet();
        network.api_url = "http://host/v1/".into();
        assert_eq!(network.endpoint("/tx/raw"), "http://host/v1/tx/raw");
        assert_eq!(
            network.explorer_tx_url("abcd"),
            "https://whatsonchain.com/tx/abcd"
        );
    }

    #[test]
    fn check_fee_rate_bounds() {
        let tx = TransactionSettings::default();
        assert!(tx.check_fee_rate(1).is_ok());
        assert!(tx.check_fee_rate(1_000).is_ok());
        assert!(matches!(
            tx.check_fee_rate(0),
            Err(WalletError::FeeRateOutOfRange { rate: 0, min: 1, max: 1_000 })
        ));
        assert!(tx.check_fee_rate(1_001).is_err());
    }

    #[test]
    fn snapshot_is_not_affected_by_later_updates() {
        let manager = ConfigManager::default();
        let before = manager.snapshot();

        manager.set_network(BsvNetwork::Mainnet).unwrap();

        assert_eq!(before.network.network, BsvNetwork::Testnet);
        assert_eq!(manager.snapshot().network.network, BsvNetwork::Mainnet);
    }

    #[test]
    fn invalid_update_is_not_published() {
        let manager = ConfigManager::default();
        let bad = TransactionSettings {
            max_transaction_size: 0,
            ..TransactionSettings::default()
        };
        assert!(manager.update_transaction(bad).is_err());
        assert_eq!(manager.snapshot().transaction.max_transaction_size, 100_000);
    }

    #[test]
    fn section_updates_keep_other_sections() {
        let manager = ConfigManager::default();
        let utxo = UtxoSettings {
            enable_caching: false,
            ..UtxoSettings::default()
        };
        manager.update_utxo(utxo).unwrap();

        let snapshot = manager.snapshot();
        assert!(!snapshot.utxo.enable_caching);
        assert_eq!(snapshot.transaction, TransactionSettings::default());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = Config::default();
        config.network.api_url.clear();
        assert!(ConfigManager::new(config).is_err());
    }
}
