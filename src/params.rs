//! Network consensus parameters and fork activation
//!
//! Fork heights are an explicit table keyed by network. A network that
//! shares a height with another still gets its own row, so overriding one
//! network never silently changes another.

use crate::error::{ConsensusError, Result};
use serde::{Deserialize, Serialize};

/// Network the node runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Test,
    Regtest,
}

/// Forks done on the network, queried by validation code without caring
/// about the concrete heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fork {
    /// Fork done after the token sale. Removes the requirement that the
    /// main (non-fake-header) nonce must be zero.
    PostIco,
}

/// (fork, network, activation height)
const FORK_HEIGHTS: &[(Fork, Network, u32)] = &[
    (Fork::PostIco, Network::Main, 1_000_000),
    (Fork::PostIco, Network::Test, 1_000_000),
    (Fork::PostIco, Network::Regtest, 500),
];

/// ForkInEffect: Fork × Network × ℕ → {true, false}
pub fn fork_in_effect(fork: Fork, network: Network, height: u32) -> bool {
    FORK_HEIGHTS
        .iter()
        .find(|(f, n, _)| *f == fork && *n == network)
        .map_or(false, |(_, _, activation)| height >= *activation)
}

/// Largest chain id that still fits into the version bits
pub const MAX_AUXPOW_CHAIN_ID: i32 = 0x7fff;

/// Parameters consumed by the merge-mining rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub network: Network,
    /// Registered auxpow chain id of this network
    pub auxpow_chain_id: i32,
    /// Reject headers with a foreign chain id and parents sharing ours
    #[serde(default = "default_strict_chain_id")]
    pub strict_chain_id: bool,
}

fn default_strict_chain_id() -> bool {
    true
}

impl ConsensusParams {
    pub fn mainnet() -> Self {
        ConsensusParams {
            network: Network::Main,
            auxpow_chain_id: 1829,
            strict_chain_id: true,
        }
    }

    pub fn testnet() -> Self {
        ConsensusParams {
            network: Network::Test,
            ..Self::mainnet()
        }
    }

    pub fn regtest() -> Self {
        ConsensusParams {
            network: Network::Regtest,
            ..Self::testnet()
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::mainnet(),
            Network::Test => Self::testnet(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// Load parameters from JSON, e.g.
    /// `{"network": "regtest", "auxpow_chain_id": 1829}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: ConsensusParams =
            serde_json::from_str(json).map_err(|e| ConsensusError::Config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_AUXPOW_CHAIN_ID).contains(&self.auxpow_chain_id) {
            return Err(ConsensusError::Config(format!(
                "auxpow chain id {} out of range 0..={}",
                self.auxpow_chain_id, MAX_AUXPOW_CHAIN_ID
            )));
        }
        Ok(())
    }

    pub fn fork_in_effect(&self, fork: Fork, height: u32) -> bool {
        fork_in_effect(fork, self.network, height)
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
