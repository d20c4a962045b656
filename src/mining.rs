//! Construction of auxpow data for mining tooling
//!
//! The parent blocks built here are synthetic and never mined: they carry the
//! commitment but do not have to meet any target.

use crate::auxpow::{commitment_payload, expected_index};
use crate::constants::MAX_CHAIN_MERKLE_DEPTH;
use crate::error::AuxPowError;
use crate::hash::{MerkleHasher, Sha256dHasher};
use crate::transaction::{calculate_tx_id, create_coinbase_transaction, push_data};
use crate::types::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Extra-nonce style bytes placed in front of the commitment push
const COINBASE_PADDING: [u8; 4] = [0u8; 4];

/// CreateAuxPow: ℋ → AuxPow
///
/// Build a minimal auxpow for the given header:
/// 1. Coinbase script = padding push, then one push of
///    marker || hash || tree size 1 || nonce 0
/// 2. Coinbase is the only transaction of a synthetic parent block
/// 3. Coinbase branch empty at index 0, chain branch empty at index 0
///
/// The header must already carry the auxpow flag, since the committed hash
/// depends on it. The header is only read; the result is independent of it.
pub fn create_auxpow(header: &BlockHeader) -> Result<AuxPow, AuxPowError> {
    if !header.is_auxpow() {
        return Err(AuxPowError::HeaderNotAuxPow);
    }

    let block_hash = header.hash();
    let mut script = push_data(&COINBASE_PADDING);
    script.extend(push_data(&commitment_payload(&block_hash, 1, 0)));

    let coinbase = create_coinbase_transaction(script, vec![]);
    Ok(assemble_auxpow(coinbase, Vec::new(), 0))
}

/// Wrap a coinbase as the sole transaction of a synthetic parent block and
/// attach the given chain merkle proof.
pub fn assemble_auxpow(coinbase: Transaction, chain_merkle_branch: Vec<Hash>, chain_index: u32) -> AuxPow {
    let parent_block = BlockHeader {
        version: 1,
        prev_block_hash: [0u8; 32],
        // Single-leaf tree: the root is the coinbase txid
        merkle_root: calculate_tx_id(&coinbase),
        time: 0,
        bits: 0,
        nonce: 0,
    };

    let coinbase_tx = MerkleProofTx {
        tx: coinbase,
        block_hash: parent_block.hash(),
        merkle_branch: Vec::new(),
        index: Some(0),
    };

    AuxPow {
        coinbase_tx,
        chain_merkle_branch,
        chain_index,
        parent_block,
    }
}

/// Proof of one chain's slot in a shared chain merkle tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainProof {
    pub chain_id: i32,
    pub aux_block_hash: Hash,
    pub branch: Vec<Hash>,
    pub index: u32,
}

/// Chain merkle tree committing to several auxiliary chains at once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCommitment {
    pub root: Hash,
    /// Bytes to embed in the parent coinbase script
    pub payload: ByteString,
    pub proofs: Vec<ChainProof>,
}

/// BuildCommitment: (ℤ × ℍ)* × ℕ × ℕ → ChainCommitment
///
/// Place each `(chain_id, aux_block_hash)` at its expected slot in a tree of
/// the given height; unused slots hold zero hashes. Fails if two chains
/// land on the same slot, in which case the caller retries with another
/// nonce or a taller tree.
///
/// Only occupied subtrees are materialized. Every empty subtree at a level
/// has the same hash, so the work is proportional to chains × height.
pub fn build_commitment(
    chains: &[(i32, Hash)],
    nonce: u32,
    height: u32,
) -> Result<ChainCommitment, AuxPowError> {
    if height as usize > MAX_CHAIN_MERKLE_DEPTH {
        return Err(AuxPowError::ChainMerkleTreeTooLarge(height as usize));
    }

    let mut owners: BTreeMap<u32, i32> = BTreeMap::new();
    let mut level: BTreeMap<u32, Hash> = BTreeMap::new();
    let mut proofs = Vec::with_capacity(chains.len());
    for (chain_id, aux_block_hash) in chains {
        let slot = expected_index(nonce, *chain_id, height);
        if let Some(owner) = owners.insert(slot, *chain_id) {
            debug!(chain_id, owner, slot, nonce, height, "auxpow: commitment slot collision");
            return Err(AuxPowError::SlotCollision(owner, *chain_id, slot));
        }
        level.insert(slot, *aux_block_hash);
        proofs.push(ChainProof {
            chain_id: *chain_id,
            aux_block_hash: *aux_block_hash,
            branch: Vec::with_capacity(height as usize),
            index: slot,
        });
    }

    let mut empty = [0u8; 32];
    for depth in 0..height {
        for proof in &mut proofs {
            let sibling = (proof.index >> depth) ^ 1;
            proof.branch.push(*level.get(&sibling).unwrap_or(&empty));
        }

        let mut parents = BTreeMap::new();
        for &position in level.keys() {
            let parent = position >> 1;
            parents.entry(parent).or_insert_with(|| {
                let left = level.get(&(parent << 1)).unwrap_or(&empty);
                let right = level.get(&((parent << 1) | 1)).unwrap_or(&empty);
                Sha256dHasher.combine(left, right)
            });
        }
        level = parents;
        empty = Sha256dHasher.combine(&empty, &empty);
    }

    let root = level.get(&0).copied().unwrap_or(empty);
    Ok(ChainCommitment {
        root,
        payload: commitment_payload(&root, 1u32 << height, nonce),
        proofs,
    })
}

/// Build one auxpow per chain, all sharing a single synthetic parent block
/// whose coinbase commits to every chain.
pub fn create_multi_auxpow(
    chains: &[(i32, Hash)],
    nonce: u32,
    height: u32,
) -> Result<Vec<AuxPow>, AuxPowError> {
    let commitment = build_commitment(chains, nonce, height)?;

    let mut script = push_data(&COINBASE_PADDING);
    script.extend(push_data(&commitment.payload));
    let coinbase = create_coinbase_transaction(script, vec![]);

    Ok(commitment
        .proofs
        .into_iter()
        .map(|proof| assemble_auxpow(coinbase.clone(), proof.branch, proof.index))
        .collect())
}
