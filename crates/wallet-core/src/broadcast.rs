use std::sync::Arc;

use chain_bsv::transaction::SignedBsvTx;
use tracing::{info, warn};

use crate::config::NetworkConfig;
use crate::error::WalletError;
use crate::indexer::{Indexer, IndexerError};

/// Submits signed transactions. A submission is attempted exactly once.
pub struct Broadcaster {
    indexer: Arc<dyn Indexer>,
}

impl Broadcaster {
    pub fn new(indexer: Arc<dyn Indexer>) -> Self {
        Self { indexer }
    }

    pub async fn submit(
        &self,
        network: &NetworkConfig,
        tx: &SignedBsvTx,
    ) -> Result<(), WalletError> {
        match self.indexer.submit_raw(network, &tx.raw).await {
            Ok(()) => {
                info!(
                    txid = %tx.txid,
                    bytes = tx.raw.len(),
                    network = %network.network,
                    "transaction broadcast"
                );
                Ok(())
            }
            Err(IndexerError::Status { status, body }) => {
                warn!(txid = %tx.txid, status, body = %body, "broadcast rejected");
                Err(WalletError::BroadcastRejected { status, body })
            }
            Err(e) => {
                warn!(txid = %tx.txid, error = %e, "broadcast failed");
                Err(e.into())
            }
        }
    }
}
