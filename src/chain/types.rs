//! Wire types for chain address services.

use serde::{Deserialize, Serialize};

/// Aptos networks with a hosted keyless pepper service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AptosNetwork {
    Devnet,
    Testnet,
    Mainnet,
}

impl AptosNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            AptosNetwork::Devnet => "devnet",
            AptosNetwork::Testnet => "testnet",
            AptosNetwork::Mainnet => "mainnet",
        }
    }

    /// Base URL of the hosted API for this network.
    pub fn api_base_url(&self) -> String {
        format!("https://api.{}.aptoslabs.com", self.as_str())
    }
}

impl std::fmt::Display for AptosNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AptosNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "devnet" => Ok(AptosNetwork::Devnet),
            "testnet" => Ok(AptosNetwork::Testnet),
            "mainnet" => Ok(AptosNetwork::Mainnet),
            other => Err(format!("Unknown Aptos network: {}", other)),
        }
    }
}

/// Successful pepper fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct PepperResponse {
    pub pepper: String,
    pub address: String,
}

/// Error body returned by the pepper service.
#[derive(Debug, Clone, Deserialize)]
pub struct PepperErrorResponse {
    pub message: String,
}
