//! Double-SHA-256 hashing used by all merge-mining commitments

use crate::types::Hash;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};
use sha2::{Digest, Sha256};

/// SHA256(SHA256(data))
pub fn sha256d(data: &[u8]) -> Hash {
    let hash1 = Sha256::digest(data);
    let hash2 = Sha256::digest(hash1);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hash2);
    hash
}

/// SHA256(SHA256(left || right)), streamed without building the concatenation
pub fn sha256d_pair(left: &Hash, right: &Hash) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(left);
    engine.input(right);
    sha256d::Hash::from_engine(engine).into_inner()
}

/// Hash function seam for the validator.
///
/// Consensus code always uses [`Sha256dHasher`]; other implementations exist
/// to observe how much hashing a validation performs.
pub trait MerkleHasher {
    /// Hash of a serialized object (transaction, header)
    fn hash(&self, data: &[u8]) -> Hash;

    /// Parent node of two merkle children
    fn combine(&self, left: &Hash, right: &Hash) -> Hash;
}

/// The consensus hasher: double SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256dHasher;

impl MerkleHasher for Sha256dHasher {
    fn hash(&self, data: &[u8]) -> Hash {
        sha256d(data)
    }

    fn combine(&self, left: &Hash, right: &Hash) -> Hash {
        sha256d_pair(left, right)
    }
}

/// Hex string of a hash in display (reversed) byte order
pub fn to_display_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}
