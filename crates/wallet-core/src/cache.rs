use std::collections::HashMap;
use std::time::Duration;

use chain_bsv::balance::BalanceSnapshot;
use chain_bsv::utxo::Utxo;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::UtxoSettings;

/// Outputs and balance of one address, captured together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub outputs: Vec<Utxo>,
    pub balance: BalanceSnapshot,
    pub captured_at: Instant,
}

impl CacheEntry {
    pub fn new(outputs: Vec<Utxo>, balance: BalanceSnapshot) -> Self {
        Self {
            outputs,
            balance,
            captured_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.captured_at.elapsed() < ttl
    }
}

/// Address-indexed cache of discovery results.
///
/// Entries are replaced whole under the lock and expire lazily on read.
#[derive(Debug, Default)]
pub struct OutputCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl OutputCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh entry for `address`, if any. Always `None` with caching disabled.
    pub fn get(&self, address: &str, settings: &UtxoSettings) -> Option<CacheEntry> {
        if !settings.enable_caching {
            return None;
        }

        let mut entries = self.entries.lock();
        match entries.get(address) {
            Some(entry) if entry.is_fresh(settings.cache_ttl()) => {
                debug!(address, "output cache hit");
                Some(entry.clone())
            }
            Some(_) => {
                debug!(address, "output cache entry expired");
                entries.remove(address);
                None
            }
            None => {
                debug!(address, "output cache miss");
                None
            }
        }
    }

    pub fn put(&self, address: &str, entry: CacheEntry, settings: &UtxoSettings) {
        if !settings.enable_caching {
            return;
        }
        self.entries.lock().insert(address.to_string(), entry);
    }

    pub fn invalidate(&self, address: &str) {
        self.entries.lock().remove(address);
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
