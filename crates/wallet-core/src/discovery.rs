use std::sync::Arc;

use chain_bsv::balance::BalanceSnapshot;
use chain_bsv::utxo::Utxo;
use tracing::debug;

use crate::cache::{CacheEntry, OutputCache};
use crate::config::{Config, NetworkConfig};
use crate::error::WalletError;
use crate::indexer::{BalanceRecord, Indexer, IndexerError};

/// Fetches outputs and balances from the indexer, through the cache.
pub struct OutputDiscovery {
    indexer: Arc<dyn Indexer>,
    cache: OutputCache,
}

impl OutputDiscovery {
    pub fn new(indexer: Arc<dyn Indexer>) -> Self {
        Self {
            indexer,
            cache: OutputCache::new(),
        }
    }

    pub fn cache(&self) -> &OutputCache {
        &self.cache
    }

    pub fn indexer(&self) -> &Arc<dyn Indexer> {
        &self.indexer
    }

    /// Spendable outputs of `address`, straight from the indexer.
    ///
    /// Outputs below `min_confirmations` or excluded by the listing flags are
    /// dropped, and at most `max_utxos_per_query` are kept in response order.
    pub async fn fetch_outputs(
        &self,
        address: &str,
        config: &Config,
    ) -> Result<Vec<Utxo>, WalletError> {
        let network = &config.network;
        let outputs = network
            .retry_policy()
            .run("fetch_outputs", || async {
                let records = self.indexer.unspent(network, address).await?;
                records
                    .into_iter()
                    .map(|record| record.into_utxo())
                    .collect::<Result<Vec<_>, IndexerError>>()
            })
            .await?;

        let settings = &config.utxo;
        let listing = settings.listing_policy();
        let fetched = outputs.len();
        let outputs: Vec<Utxo> = outputs
            .into_iter()
            .filter(|u| u.confirmations >= settings.min_confirmations && listing.admits(u))
            .take(settings.max_utxos_per_query)
            .collect();

        debug!(address, fetched, kept = outputs.len(), "fetched outputs");
        Ok(outputs)
    }

    /// Native confirmed/unconfirmed balance as reported by the indexer.
    pub async fn fetch_balance(
        &self,
        address: &str,
        network: &NetworkConfig,
    ) -> Result<BalanceRecord, WalletError> {
        let record = network
            .retry_policy()
            .run("fetch_balance", || self.indexer.balance(network, address))
            .await?;
        Ok(record)
    }

    /// Cache-aware read of outputs and balance. A miss fetches both and
    /// publishes them as one entry.
    pub async fn snapshot(
        &self,
        address: &str,
        config: &Config,
    ) -> Result<CacheEntry, WalletError> {
        if let Some(entry) = self.cache.get(address, &config.utxo) {
            return Ok(entry);
        }

        let (outputs, record) = tokio::try_join!(
            self.fetch_outputs(address, config),
            self.fetch_balance(address, &config.network),
        )?;

        let balance = BalanceSnapshot::from_outputs(
            record.confirmed,
            record.unconfirmed,
            &outputs,
            config.utxo.min_confirmations,
        );
        let entry = CacheEntry::new(outputs, balance);
        self.cache.put(address, entry.clone(), &config.utxo);
        Ok(entry)
    }
}
