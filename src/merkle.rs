//! Merkle branch verification and construction
//!
//! Trees follow the Bitcoin layout: leaves are paired left to right, parents
//! are `SHA256(SHA256(left || right))`, and an odd node at the end of a level
//! is paired with itself.

use crate::hash::{MerkleHasher, Sha256dHasher};
use crate::types::Hash;

/// CheckMerkleBranch: ℍ × ℍ* × ℕ → ℍ
///
/// Recompute a merkle root from a leaf, its branch (innermost first) and its
/// index. Bit `i` of the index says on which side the running hash sits at
/// level `i`: 1 means the branch hash goes left, 0 means it goes right.
/// Index bits above the branch length are ignored; callers that care must
/// bound the index against the tree height themselves.
pub fn check_merkle_branch(leaf: Hash, branch: &[Hash], index: u32) -> Hash {
    check_merkle_branch_with(&Sha256dHasher, leaf, branch, index)
}

/// [`check_merkle_branch`] over an arbitrary hasher
pub fn check_merkle_branch_with<H: MerkleHasher + ?Sized>(
    hasher: &H,
    leaf: Hash,
    branch: &[Hash],
    mut index: u32,
) -> Hash {
    let mut hash = leaf;
    for node in branch {
        hash = if index & 1 == 1 {
            hasher.combine(node, &hash)
        } else {
            hasher.combine(&hash, node)
        };
        index >>= 1;
    }
    hash
}

/// Merkle root of a list of leaves; `None` for an empty list
pub fn compute_merkle_root(leaves: &[Hash]) -> Option<Hash> {
    let mut level = leaves.to_vec();
    if level.is_empty() {
        return None;
    }
    while level.len() > 1 {
        level = next_level(&level);
    }
    Some(level[0])
}

/// Branch proving the leaf at `index`, innermost first; `None` if out of range
pub fn compute_merkle_branch(leaves: &[Hash], index: usize) -> Option<Vec<Hash>> {
    if index >= leaves.len() {
        return None;
    }

    let mut branch = Vec::new();
    let mut level = leaves.to_vec();
    let mut position = index;
    while level.len() > 1 {
        let sibling = position ^ 1;
        // An unpaired last node is its own sibling
        branch.push(*level.get(sibling).unwrap_or(&level[position]));
        level = next_level(&level);
        position >>= 1;
    }
    Some(branch)
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => Sha256dHasher.combine(left, right),
            [single] => Sha256dHasher.combine(single, single),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256d_pair;

    fn leaves(n: u8) -> Vec<Hash> {
        (0..n).map(|i| [i + 1; 32]).collect()
    }

    #[test]
    fn test_empty_branch_returns_leaf() {
        let leaf = [7u8; 32];
        assert_eq!(check_merkle_branch(leaf, &[], 0), leaf);
    }

    #[test]
    fn test_two_leaf_tree() {
        let l0 = [1u8; 32];
        let l1 = [2u8; 32];
        let root = sha256d_pair(&l0, &l1);

        assert_eq!(check_merkle_branch(l0, &[l1], 0), root);
        assert_eq!(check_merkle_branch(l1, &[l0], 1), root);
        assert_ne!(check_merkle_branch(l0, &[l1], 1), root);
    }

    #[test]
    fn test_high_index_bits_ignored() {
        let l0 = [1u8; 32];
        let l1 = [2u8; 32];
        assert_eq!(
            check_merkle_branch(l0, &[l1], 0b10),
            check_merkle_branch(l0, &[l1], 0)
        );
    }

    #[test]
    fn test_compute_root_empty() {
        assert_eq!(compute_merkle_root(&[]), None);
    }

    #[test]
    fn test_compute_root_single_leaf() {
        let leaf = [9u8; 32];
        assert_eq!(compute_merkle_root(&[leaf]), Some(leaf));
        assert_eq!(compute_merkle_branch(&[leaf], 0), Some(vec![]));
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let l = leaves(3);
        let left = sha256d_pair(&l[0], &l[1]);
        let right = sha256d_pair(&l[2], &l[2]);
        assert_eq!(compute_merkle_root(&l), Some(sha256d_pair(&left, &right)));
    }

    #[test]
    fn test_every_branch_verifies() {
        for n in 1..=9u8 {
            let l = leaves(n);
            let root = compute_merkle_root(&l).unwrap();
            for (i, leaf) in l.iter().enumerate() {
                let branch = compute_merkle_branch(&l, i).unwrap();
                assert_eq!(check_merkle_branch(*leaf, &branch, i as u32), root);
            }
        }
    }

    #[test]
    fn test_branch_out_of_range() {
        assert_eq!(compute_merkle_branch(&leaves(2), 2), None);
    }
}
