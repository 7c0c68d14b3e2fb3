use bitcoin::{Network, NetworkKind};
use serde::{Deserialize, Serialize};

/// Default indexer endpoint for BSV mainnet.
pub const MAINNET_API: &str = "https://api.whatsonchain.com/v1/bsv/main";

/// Default indexer endpoint for BSV testnet.
pub const TESTNET_API: &str = "https://api.whatsonchain.com/v1/bsv/test";

/// Default block explorer for BSV mainnet.
pub const MAINNET_EXPLORER: &str = "https://whatsonchain.com";

/// Default block explorer for BSV testnet.
pub const TESTNET_EXPLORER: &str = "https://test.whatsonchain.com";

/// Supported BSV networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BsvNetwork {
    Mainnet,
    Testnet,
}

impl BsvNetwork {
    /// Convert to the `bitcoin` crate's `Network` type.
    ///
    /// BSV keeps Bitcoin's legacy address version bytes and WIF prefixes, so
    /// the Bitcoin parameters encode and decode BSV addresses unchanged.
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BsvNetwork::Mainnet => Network::Bitcoin,
            BsvNetwork::Testnet => Network::Testnet,
        }
    }

    pub fn network_kind(self) -> NetworkKind {
        NetworkKind::from(self.to_bitcoin_network())
    }

    /// BIP-44 coin type (236 on mainnet, the shared testnet type 1 otherwise).
    pub fn coin_type(self) -> u32 {
        match self {
            BsvNetwork::Mainnet => 236,
            BsvNetwork::Testnet => 1,
        }
    }

    pub fn is_testnet(self) -> bool {
        matches!(self, BsvNetwork::Testnet)
    }

    /// Return the default indexer endpoint for this network.
    pub fn default_api_url(self) -> &'static str {
        match self {
            BsvNetwork::Mainnet => MAINNET_API,
            BsvNetwork::Testnet => TESTNET_API,
        }
    }

    /// Return the default explorer base URL for this network.
    pub fn default_explorer_url(self) -> &'static str {
        match self {
            BsvNetwork::Mainnet => MAINNET_EXPLORER,
            BsvNetwork::Testnet => TESTNET_EXPLORER,
        }
    }
}

impl std::fmt::Display for BsvNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BsvNetwork::Mainnet => write!(f, "mainnet"),
            BsvNetwork::Testnet => write!(f, "testnet"),
        }
    }
}
