//! # AuxPow-Consensus
//!
//! Merge-mining (AuxPoW) verification for an auxiliary blockchain.
//!
//! A parent chain's proof of work secures this chain when a parent coinbase
//! commits to our block hash through two chained merkle proofs: the coinbase
//! is proven against the parent block's merkle root, and the coinbase script
//! carries the root of a chain merkle tree in which our block hash sits at a
//! deterministic slot.
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: validation and construction are deterministic and side-effect-free
//! 2. **Linkage, not work**: the parent block's proof of work is left to the caller
//! 3. **Exact Version Pinning**: consensus-critical hashing dependencies are pinned
//! 4. **Bounded Work**: merkle depth is capped before any hashing happens
//!
//! ## Usage
//!
//! ```rust
//! use auxpow_consensus::AuxPowConsensus;
//! use auxpow_consensus::types::*;
//! use auxpow_consensus::params::ConsensusParams;
//!
//! let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
//! let header = BlockHeader {
//!     version: 0x0100 | (1829 << 16) | 4,
//!     prev_block_hash: [0; 32],
//!     merkle_root: [0; 32],
//!     time: 1_600_000_000,
//!     bits: 0x207fffff,
//!     nonce: 0,
//! };
//! let auxpow = consensus.create_auxpow(&header).unwrap();
//! consensus.check_auxpow(&auxpow, &header.hash()).unwrap();
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod hash;
pub mod serialize;
pub mod transaction;
pub mod block;
pub mod merkle;
pub mod merkle_tx;
pub mod auxpow;
pub mod mining;
pub mod params;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{AuxPowError, ConsensusError, EncodeError, Result};
pub use params::{ConsensusParams, Fork, Network};

/// Merge-mining rules bound to one network's parameters
///
/// # Examples
///
/// ```
/// use auxpow_consensus::AuxPowConsensus;
/// use auxpow_consensus::params::{ConsensusParams, Fork};
///
/// let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
/// assert!(consensus.fork_in_effect(Fork::PostIco, 500));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuxPowConsensus {
    params: ConsensusParams,
}

impl AuxPowConsensus {
    pub fn new(params: ConsensusParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Check an auxpow for a block of this network's chain
    pub fn check_auxpow(&self, auxpow: &AuxPow, aux_block_hash: &Hash) -> std::result::Result<(), AuxPowError> {
        auxpow.check(aux_block_hash, self.params.auxpow_chain_id, &self.params)
    }

    /// Validate the merge-mining part of a header; returns the hash whose
    /// proof of work the caller must still check
    pub fn check_header(&self, header: &AuxBlockHeader) -> std::result::Result<Hash, AuxPowError> {
        header.check_auxpow(&self.params)
    }

    /// Decode an auxpow-carrying header from consensus bytes and validate it
    ///
    /// ```
    /// use auxpow_consensus::AuxPowConsensus;
    /// use auxpow_consensus::params::ConsensusParams;
    ///
    /// let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    /// assert!(consensus.check_header_bytes(&[0u8; 10]).is_err());
    /// ```
    pub fn check_header_bytes(&self, bytes: &[u8]) -> Result<(AuxBlockHeader, Hash)> {
        let header: AuxBlockHeader = serialize::deserialize(bytes)?;
        let pow_hash = self.check_header(&header)?;
        Ok((header, pow_hash))
    }

    /// Build a minimal auxpow committing to `header`
    pub fn create_auxpow(&self, header: &BlockHeader) -> std::result::Result<AuxPow, AuxPowError> {
        mining::create_auxpow(header)
    }

    pub fn fork_in_effect(&self, fork: Fork, height: u32) -> bool {
        self.params.fork_in_effect(fork, height)
    }
}
