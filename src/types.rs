//! Core merge-mining types

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash, in internal (raw digest) byte order
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// OutPoint: reference to a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    /// The null outpoint spent by coinbase inputs
    pub fn null() -> Self {
        OutPoint {
            hash: [0u8; 32],
            index: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.hash == [0u8; 32] && self.index == u32::MAX
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: i64,
    pub script_pubkey: ByteString,
}

/// Parent-chain transaction in its legacy (non-witness) form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

/// Pure 80-byte block header, used both for the parent block and for the
/// auxiliary block that is being merge-mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

/// A transaction bundled with a Merkle proof of its inclusion in a block.
///
/// `index` is `None` when the position is unknown. The wire format carries
/// this as `-1`; it is a wallet-layer marker and the auxpow rules only ever
/// accept `Some(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProofTx {
    pub tx: Transaction,
    /// Hash of the containing block, all zero when unknown
    pub block_hash: Hash,
    pub merkle_branch: Vec<Hash>,
    pub index: Option<u32>,
}

/// Merge-mining proof linking an auxiliary block hash to a parent block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxPow {
    /// The parent block's coinbase, proven against the parent merkle root
    pub coinbase_tx: MerkleProofTx,
    /// Branch connecting the auxiliary block hash to the committed chain root
    pub chain_merkle_branch: Vec<Hash>,
    /// Slot of the auxiliary block in the chain merkle tree
    pub chain_index: u32,
    /// Parent block header, on which the actual work is done
    pub parent_block: BlockHeader,
}

/// Block header of the auxiliary chain together with its optional auxpow.
///
/// The auxpow is present exactly when the header's version carries the
/// auxpow flag; the constructors in [`crate::block`] keep the two in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuxBlockHeader {
    pub(crate) header: BlockHeader,
    pub(crate) auxpow: Option<Box<AuxPow>>,
}
