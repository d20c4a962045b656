//! Merge-mining consensus constants

/// Header for merge-mining data in the parent coinbase script
pub const MERGED_MINING_HEADER: [u8; 4] = [0xfa, 0xbe, b'm', b'm'];

/// Maximum height of the chain merkle tree (and of the coinbase branch)
pub const MAX_CHAIN_MERKLE_DEPTH: usize = 30;

/// Marker-less commitments must start within this many bytes of the script start.
/// 8-12 bytes are enough to encode extraNonce and nBits in front of it.
pub const LEGACY_COMMITMENT_MAX_OFFSET: usize = 20;

/// Multiplier of the linear congruential step used for slot assignment
pub const EXPECTED_INDEX_MULTIPLIER: u32 = 1_103_515_245;

/// Increment of the linear congruential step used for slot assignment
pub const EXPECTED_INDEX_INCREMENT: u32 = 12_345;

/// Version bit marking a header that carries an auxpow
pub const VERSION_AUXPOW: i32 = 1 << 8;

/// Chain id is stored in the version bits above this multiplier
pub const VERSION_CHAIN_START: i32 = 1 << 16;

/// Serialized size of a pure block header
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Upper bound for any length-prefixed vector during decoding
pub const MAX_VEC_SIZE: usize = 4_000_000;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;
