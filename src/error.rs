//! Error types for auxpow validation and consensus encoding

use thiserror::Error;

/// Reasons an auxpow is rejected.
///
/// Every variant means "invalid block/header" to the caller; none of them
/// is fatal to the node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuxPowError {
    #[error("aux POW chain merkle branch too long: {0}")]
    ChainMerkleTreeTooLarge(usize),

    #[error("aux POW coinbase merkle branch too long: {0}")]
    CoinbaseMerkleTreeTooLarge(usize),

    #[error("auxpow is not a generate")]
    NotCoinbase,

    #[error("aux POW coinbase has no inputs")]
    MissingCoinbaseInput,

    #[error("aux POW parent has our chain ID {0}")]
    ParentHasOurChainId(i32),

    #[error("aux POW coinbase does not belong to the parent block")]
    MismatchedParentHash,

    #[error("aux POW merkle root incorrect")]
    BadCoinbaseMerkleBranch,

    #[error("aux POW missing chain merkle root in parent coinbase")]
    MissingCommitment,

    #[error("multiple merged mining headers in coinbase")]
    MultipleCommitments,

    #[error("merged mining header is not just before chain merkle root")]
    MarkerNotBeforeRoot,

    #[error("aux POW chain merkle root starts at byte {0}, beyond the first {} bytes of the parent coinbase", crate::constants::LEGACY_COMMITMENT_MAX_OFFSET)]
    PositionTooDeep(usize),

    #[error("aux POW missing chain merkle tree size and nonce in parent coinbase")]
    MissingTreeSizeAndNonce,

    #[error("aux POW merkle branch size {found} does not match parent coinbase (expected {expected})")]
    MerkleSizeMismatch { expected: u32, found: u32 },

    #[error("aux POW wrong index: expected {expected}, found {found}")]
    IndexMismatch { expected: u32, found: u32 },

    #[error("block has wrong chain ID {found}, expected {expected}")]
    WrongChainId { expected: i32, found: i32 },

    #[error("header does not carry the auxpow version flag")]
    HeaderNotAuxPow,

    #[error("chains {0} and {1} collide on slot {2}")]
    SlotCollision(i32, i32, u32),
}

/// Structural errors raised while decoding consensus bytes
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vector of {requested} elements exceeds the maximum of {max}")]
    OversizedVector { requested: u64, max: usize },

    #[error("non-minimal CompactSize encoding")]
    NonMinimalCompactSize,

    #[error("negative merkle index {0}")]
    NegativeIndex(i32),

    #[error("merkle branch of {len} hashes exceeds the maximum depth of {max}")]
    BranchTooLong { len: u64, max: usize },

    #[error("merkle index {0} does not fit the signed 32-bit wire field")]
    IndexOutOfRange(u32),

    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    #[error("header has the auxpow flag but no auxpow data")]
    MissingAuxPow,
}

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("AuxPow validation failed: {0}")]
    AuxPow(#[from] AuxPowError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] EncodeError),

    #[error("Invalid consensus parameters: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
