//! Transactions bundled with their merkle inclusion proof

use crate::hash::MerkleHasher;
use crate::merkle::{check_merkle_branch_with, compute_merkle_branch};
use crate::transaction::{calculate_tx_id, calculate_tx_id_with};
use crate::types::*;

impl MerkleProofTx {
    /// A transaction whose containing block and position are not known yet
    pub fn new(tx: Transaction) -> Self {
        MerkleProofTx {
            tx,
            block_hash: [0u8; 32],
            merkle_branch: Vec::new(),
            index: None,
        }
    }

    /// Prove `transactions[index]` against a block with the given hash.
    /// Returns `None` if the index is out of range.
    pub fn from_block(transactions: &[Transaction], index: usize, block_hash: Hash) -> Option<Self> {
        let tx = transactions.get(index)?.clone();
        let txids: Vec<Hash> = transactions.iter().map(calculate_tx_id).collect();
        let merkle_branch = compute_merkle_branch(&txids, index)?;
        Some(MerkleProofTx {
            tx,
            block_hash,
            merkle_branch,
            index: Some(u32::try_from(index).ok()?),
        })
    }

    /// Txid of the wrapped transaction
    pub fn hash(&self) -> Hash {
        calculate_tx_id(&self.tx)
    }

    pub fn is_block_known(&self) -> bool {
        self.block_hash != [0u8; 32]
    }

    /// Merkle root implied by the proof, or `None` while the position is unknown
    pub fn merkle_root(&self) -> Option<Hash> {
        self.merkle_root_with(&crate::hash::Sha256dHasher)
    }

    pub fn merkle_root_with<H: MerkleHasher + ?Sized>(&self, hasher: &H) -> Option<Hash> {
        let index = self.index?;
        let leaf = calculate_tx_id_with(hasher, &self.tx);
        Some(check_merkle_branch_with(hasher, leaf, &self.merkle_branch, index))
    }
}
