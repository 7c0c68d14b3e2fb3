//! Ledger indexer access: the [`Indexer`] seam and its HTTP implementation.

use async_trait::async_trait;
use chain_bsv::utxo::{Utxo, UtxoKind};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NetworkConfig;

const USER_AGENT: &str = concat!("bsv-wallet-core/", env!("CARGO_PKG_VERSION"));

/// Failure of a single indexer request.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IndexerError::Timeout
        } else if e.is_decode() {
            IndexerError::Decode(e.to_string())
        } else {
            IndexerError::Transport(e.to_string())
        }
    }
}

/// One element of `GET /address/{address}/unspent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentRecord {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(default)]
    pub height: u64,
}

impl UnspentRecord {
    /// Convert to a [`Utxo`]. The indexer reports plain outputs only, so
    /// every record is tagged native.
    pub fn into_utxo(self) -> Result<Utxo, IndexerError> {
        let script_pubkey = hex::decode(&self.script_pub_key).map_err(|e| {
            IndexerError::Decode(format!(
                "invalid scriptPubKey for {}:{}: {e}",
                self.txid, self.vout
            ))
        })?;

        Ok(Utxo {
            txid: self.txid,
            vout: self.vout,
            amount_sat: self.value,
            address: self.address,
            script_pubkey,
            confirmations: self.confirmations,
            height: self.height,
            kind: UtxoKind::Native,
        })
    }
}

/// Body of `GET /address/{address}/balance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub confirmed: i64,
    pub unconfirmed: i64,
}

/// Remote ledger indexer. Each method performs exactly one request; retry
/// policy belongs to the caller.
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn unspent(
        &self,
        network: &NetworkConfig,
        address: &str,
    ) -> Result<Vec<UnspentRecord>, IndexerError>;

    async fn balance(
        &self,
        network: &NetworkConfig,
        address: &str,
    ) -> Result<BalanceRecord, IndexerError>;

    async fn submit_raw(&self, network: &NetworkConfig, raw: &[u8]) -> Result<(), IndexerError>;
}

/// WhatsOnChain-style REST indexer.
#[derive(Debug, Clone)]
pub struct HttpIndexer {
    client: Client,
}

impl HttpIndexer {
    pub fn new() -> Result<Self, IndexerError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        network: &NetworkConfig,
        path: &str,
    ) -> Result<T, IndexerError> {
        let response = self
            .client
            .get(network.endpoint(path))
            .timeout(network.request_timeout())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| IndexerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Indexer for HttpIndexer {
    async fn unspent(
        &self,
        network: &NetworkConfig,
        address: &str,
    ) -> Result<Vec<UnspentRecord>, IndexerError> {
        self.get_json(network, &format!("address/{address}/unspent"))
            .await
    }

    async fn balance(
        &self,
        network: &NetworkConfig,
        address: &str,
    ) -> Result<BalanceRecord, IndexerError> {
        self.get_json(network, &format!("address/{address}/balance"))
            .await
    }

    async fn submit_raw(&self, network: &NetworkConfig, raw: &[u8]) -> Result<(), IndexerError> {
        let response = self
            .client
            .post(network.endpoint("tx/raw"))
            .timeout(network.request_timeout())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(raw.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
