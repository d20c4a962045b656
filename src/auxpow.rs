//! AuxPow validation from the merge-mining rules
//!
//! An auxpow proves that a parent block commits to an auxiliary block hash:
//! the parent coinbase is proven against the parent merkle root, and the
//! coinbase input script carries the root of a chain merkle tree in which
//! the auxiliary hash sits at a slot fixed by [`expected_index`].
//!
//! Nothing here checks the parent block's proof of work. Callers verify
//! [`AuxPow::parent_block_hash`] against the auxiliary header's target.

use crate::block::calculate_block_hash_with;
use crate::constants::*;
use crate::error::AuxPowError;
use crate::hash::{to_display_hex, MerkleHasher, Sha256dHasher};
use crate::merkle::check_merkle_branch_with;
use crate::params::ConsensusParams;
use crate::transaction::coinbase_script;
use crate::types::*;
use tracing::{debug, trace};

/// GetExpectedIndex: ℕ × ℤ × ℕ → ℕ
///
/// Slot of a chain in a merkle tree of height `h`, derived from the nonce
/// committed in the coinbase and the chain id:
/// 1. r = nonce · 1103515245 + 12345
/// 2. r = r + chain_id
/// 3. r = r · 1103515245 + 12345
/// 4. return r mod 2^h
///
/// All arithmetic wraps at 32 bits. Consensus critical: must match
/// bit-for-bit across implementations.
pub fn expected_index(nonce: u32, chain_id: i32, h: u32) -> u32 {
    let mut rand = nonce;
    rand = rand
        .wrapping_mul(EXPECTED_INDEX_MULTIPLIER)
        .wrapping_add(EXPECTED_INDEX_INCREMENT);
    rand = rand.wrapping_add(chain_id as u32);
    rand = rand
        .wrapping_mul(EXPECTED_INDEX_MULTIPLIER)
        .wrapping_add(EXPECTED_INDEX_INCREMENT);

    // h never exceeds MAX_CHAIN_MERKLE_DEPTH once validated
    let mask = 1u32.checked_shl(h).map_or(u32::MAX, |size| size - 1);
    rand & mask
}

/// Bytes the coinbase script must contain for a chain merkle tree:
/// marker, root in display byte order, tree size and nonce (both LE u32).
pub fn commitment_payload(chain_root: &Hash, tree_size: u32, nonce: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(MERGED_MINING_HEADER.len() + 32 + 8);
    payload.extend_from_slice(&MERGED_MINING_HEADER);
    payload.extend_from_slice(&committed_root(chain_root));
    payload.extend_from_slice(&tree_size.to_le_bytes());
    payload.extend_from_slice(&nonce.to_le_bytes());
    payload
}

/// Chain root as it appears in the coinbase script (reversed byte order)
fn committed_root(chain_root: &Hash) -> Hash {
    let mut root = *chain_root;
    root.reverse();
    root
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Locate the chain root commitment in a coinbase script and return the
/// offset just past it.
fn locate_commitment(script: &[u8], root: &Hash) -> Result<usize, AuxPowError> {
    let root_pos = find(script, root, 0).ok_or(AuxPowError::MissingCommitment)?;

    match find(script, &MERGED_MINING_HEADER, 0) {
        Some(header_pos) => {
            // Only one chain merkle root per coinbase
            if find(script, &MERGED_MINING_HEADER, header_pos + 1).is_some() {
                return Err(AuxPowError::MultipleCommitments);
            }
            if header_pos + MERGED_MINING_HEADER.len() != root_pos {
                return Err(AuxPowError::MarkerNotBeforeRoot);
            }
        }
        None => {
            // Marker-less commitments predate the marker; uniqueness comes
            // from requiring the root early in the script instead.
            if root_pos > LEGACY_COMMITMENT_MAX_OFFSET {
                return Err(AuxPowError::PositionTooDeep(root_pos));
            }
        }
    }

    Ok(root_pos + root.len())
}

impl AuxPow {
    /// Hash of the parent block; its proof of work is checked by the caller
    pub fn parent_block_hash(&self) -> Hash {
        self.parent_block.hash()
    }

    /// Height of the chain merkle tree
    pub fn chain_merkle_height(&self) -> usize {
        self.chain_merkle_branch.len()
    }

    /// Check the auxpow against the merge-mined block's hash and our chain id.
    ///
    /// Confirms that all merkle branches link `aux_block_hash` into the
    /// parent block. Does not verify the parent block's proof of work.
    pub fn check(
        &self,
        aux_block_hash: &Hash,
        chain_id: i32,
        params: &ConsensusParams,
    ) -> Result<(), AuxPowError> {
        self.check_with(&Sha256dHasher, aux_block_hash, chain_id, params)
    }

    /// [`AuxPow::check`] with every hash computed through `hasher`
    pub fn check_with<H: MerkleHasher + ?Sized>(
        &self,
        hasher: &H,
        aux_block_hash: &Hash,
        chain_id: i32,
        params: &ConsensusParams,
    ) -> Result<(), AuxPowError> {
        let result = self.check_structure(chain_id, params).and_then(|script| {
            self.check_linkage(hasher, script, aux_block_hash, chain_id)
        });

        match &result {
            Ok(()) => trace!(
                chain_id,
                aux_hash = %to_display_hex(aux_block_hash),
                chain_index = self.chain_index,
                "auxpow: valid"
            ),
            Err(err) => debug!(
                chain_id,
                aux_hash = %to_display_hex(aux_block_hash),
                %err,
                "auxpow: rejected"
            ),
        }
        result
    }

    /// Checks that need no hashing; bounds all later work.
    /// Returns the coinbase input script.
    fn check_structure(&self, chain_id: i32, params: &ConsensusParams) -> Result<&[u8], AuxPowError> {
        if self.chain_merkle_branch.len() > MAX_CHAIN_MERKLE_DEPTH {
            return Err(AuxPowError::ChainMerkleTreeTooLarge(self.chain_merkle_branch.len()));
        }
        if self.coinbase_tx.merkle_branch.len() > MAX_CHAIN_MERKLE_DEPTH {
            return Err(AuxPowError::CoinbaseMerkleTreeTooLarge(
                self.coinbase_tx.merkle_branch.len(),
            ));
        }
        if self.coinbase_tx.index != Some(0) {
            return Err(AuxPowError::NotCoinbase);
        }
        let script = coinbase_script(&self.coinbase_tx.tx).ok_or(AuxPowError::MissingCoinbaseInput)?;

        if params.strict_chain_id && self.parent_block.chain_id() == chain_id {
            return Err(AuxPowError::ParentHasOurChainId(chain_id));
        }
        Ok(script)
    }

    fn check_linkage<H: MerkleHasher + ?Sized>(
        &self,
        hasher: &H,
        script: &[u8],
        aux_block_hash: &Hash,
        chain_id: i32,
    ) -> Result<(), AuxPowError> {
        if self.coinbase_tx.block_hash != calculate_block_hash_with(hasher, &self.parent_block) {
            return Err(AuxPowError::MismatchedParentHash);
        }

        // Check that we are in the parent block merkle tree
        if self.coinbase_tx.merkle_root_with(hasher) != Some(self.parent_block.merkle_root) {
            return Err(AuxPowError::BadCoinbaseMerkleBranch);
        }

        // Check that the chain merkle root is in the coinbase
        let chain_root = check_merkle_branch_with(
            hasher,
            *aux_block_hash,
            &self.chain_merkle_branch,
            self.chain_index,
        );
        let root = committed_root(&chain_root);
        let after_root = locate_commitment(script, &root)?;

        // Tree size and nonce follow the root
        let trailer = script
            .get(after_root..after_root + 8)
            .ok_or(AuxPowError::MissingTreeSizeAndNonce)?;
        let tree_size = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let nonce = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

        let height = self.chain_merkle_branch.len() as u32;
        let expected_size = 1u32 << height;
        if tree_size != expected_size {
            return Err(AuxPowError::MerkleSizeMismatch {
                expected: expected_size,
                found: tree_size,
            });
        }

        // Ensure we are at a deterministic point in the merkle leaves
        let expected = expected_index(nonce, chain_id, height);
        if self.chain_index != expected {
            return Err(AuxPowError::IndexMismatch {
                expected,
                found: self.chain_index,
            });
        }

        Ok(())
    }
}
