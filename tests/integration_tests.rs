//! Integration tests for auxpow-consensus

use auxpow_consensus::*;
use auxpow_consensus::block::version_with_chain_id;
use auxpow_consensus::mining::*;
use auxpow_consensus::serialize::{deserialize, serialize};

const CHAIN_ID: i32 = 1829;

fn create_aux_header(nonce: u32) -> BlockHeader {
    BlockHeader {
        version: version_with_chain_id(4, CHAIN_ID).unwrap() | VERSION_AUXPOW,
        prev_block_hash: [0xab; 32],
        merkle_root: [0xcd; 32],
        time: 1_600_000_000,
        bits: 0x207fffff,
        nonce,
    }
}

#[test]
fn test_created_auxpow_checks() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(0);

    let auxpow = consensus.create_auxpow(&header).unwrap();
    assert_eq!(consensus.check_auxpow(&auxpow, &header.hash()), Ok(()));
}

#[test]
fn test_created_auxpow_rejects_other_hashes() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(0);
    let auxpow = consensus.create_auxpow(&header).unwrap();

    for other in [create_aux_header(1).hash(), [0u8; 32], auxpow.parent_block_hash()] {
        assert!(consensus.check_auxpow(&auxpow, &other).is_err());
    }
}

#[test]
fn test_mutating_header_breaks_commitment() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(0);
    let auxpow = consensus.create_auxpow(&header).unwrap();

    let mut mutated = header.clone();
    mutated.time += 1;
    assert_eq!(
        consensus.check_auxpow(&auxpow, &mutated.hash()),
        Err(AuxPowError::MissingCommitment)
    );
}

#[test]
fn test_flipped_parent_hash_byte() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(0);
    let mut auxpow = consensus.create_auxpow(&header).unwrap();
    auxpow.coinbase_tx.block_hash[5] ^= 0x01;

    assert_eq!(
        consensus.check_auxpow(&auxpow, &header.hash()),
        Err(AuxPowError::MismatchedParentHash)
    );
}

#[test]
fn test_bad_coinbase_merkle_branch() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(0);
    let mut auxpow = consensus.create_auxpow(&header).unwrap();
    auxpow.coinbase_tx.merkle_branch.push([0x77; 32]);

    assert_eq!(
        consensus.check_auxpow(&auxpow, &header.hash()),
        Err(AuxPowError::BadCoinbaseMerkleBranch)
    );
}

#[test]
fn test_marker_twice_is_rejected() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(0);
    let auxpow = consensus.create_auxpow(&header).unwrap();

    // Keep the valid commitment and add a second marker after it
    let mut coinbase = auxpow.coinbase_tx.tx.clone();
    coinbase.inputs[0]
        .script_sig
        .extend(transaction::push_data(&MERGED_MINING_HEADER));
    let doubled = assemble_auxpow(coinbase, vec![], 0);

    assert_eq!(
        consensus.check_auxpow(&doubled, &header.hash()),
        Err(AuxPowError::MultipleCommitments)
    );
}

#[test]
fn test_chain_branch_too_long() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(0);
    let mut auxpow = consensus.create_auxpow(&header).unwrap();
    auxpow.chain_merkle_branch = vec![[0x01; 32]; MAX_CHAIN_MERKLE_DEPTH + 5];

    assert_eq!(
        consensus.check_auxpow(&auxpow, &header.hash()),
        Err(AuxPowError::ChainMerkleTreeTooLarge(MAX_CHAIN_MERKLE_DEPTH + 5))
    );
}

fn find_multi_auxpow(chains: &[(i32, Hash)], height: u32) -> (u32, Vec<AuxPow>) {
    (0u32..10_000)
        .find_map(|nonce| create_multi_auxpow(chains, nonce, height).ok().map(|a| (nonce, a)))
        .unwrap()
}

#[test]
fn test_multi_chain_commitment() {
    let params = ConsensusParams::regtest();
    let chains = [
        (CHAIN_ID, create_aux_header(0).hash()),
        (1, [0x11; 32]),
        (6, [0x66; 32]),
        (42, [0x42; 32]),
    ];

    let (_, auxpows) = find_multi_auxpow(&chains, 4);
    assert_eq!(auxpows.len(), chains.len());
    for ((chain_id, aux_hash), auxpow) in chains.iter().zip(&auxpows) {
        assert_eq!(auxpow.chain_merkle_branch.len(), 4);
        assert_eq!(auxpow.check(aux_hash, *chain_id, &params), Ok(()));
    }
    // All proofs share the same parent block
    assert!(auxpows.iter().all(|a| a.parent_block == auxpows[0].parent_block));
}

#[test]
fn test_multi_chain_wrong_chain_id() {
    let params = ConsensusParams::regtest();
    let chains = [(1, [0x11; 32]), (2, [0x22; 32])];
    let (nonce, auxpows) = find_multi_auxpow(&chains, 2);

    // Chain 1's proof presented for chain 2 lands on chain 2's slot rule
    let expected = auxpow::expected_index(nonce, 2, 2);
    assert_eq!(
        auxpows[0].check(&[0x11; 32], 2, &params),
        Err(AuxPowError::IndexMismatch {
            expected,
            found: auxpows[0].chain_index,
        })
    );
}

#[test]
fn test_header_pipeline_roundtrip() {
    let consensus = AuxPowConsensus::new(ConsensusParams::regtest());
    let header = create_aux_header(7);
    let auxpow = consensus.create_auxpow(&header).unwrap();
    let parent_hash = auxpow.parent_block_hash();

    let aux_header = AuxBlockHeader::with_auxpow(header.clone(), auxpow);
    let bytes = serialize(&aux_header).unwrap();

    let (decoded, pow_hash) = consensus.check_header_bytes(&bytes).unwrap();
    assert_eq!(decoded, aux_header);
    assert_eq!(decoded.hash(), header.hash());
    assert_eq!(pow_hash, parent_hash);
}

#[test]
fn test_auxpow_bytes_roundtrip() {
    let auxpow = create_auxpow(&create_aux_header(3)).unwrap();
    let bytes = serialize(&auxpow).unwrap();
    let decoded: AuxPow = deserialize(&bytes).unwrap();
    assert_eq!(decoded, auxpow);
    assert_eq!(serialize(&decoded).unwrap(), bytes);
}

#[test]
fn test_auxpow_json_projection() {
    let auxpow = create_auxpow(&create_aux_header(3)).unwrap();
    let json = serde_json::to_string(&auxpow).unwrap();
    let decoded: AuxPow = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, auxpow);
}
