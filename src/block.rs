//! Block header hashing, auxpow version bits and auxpow-carrying headers

use crate::constants::*;
use crate::error::AuxPowError;
use crate::hash::{sha256d, MerkleHasher};
use crate::params::{ConsensusParams, MAX_AUXPOW_CHAIN_ID};
use crate::serialize::hash_preimage;
use crate::types::*;
use tracing::debug;

/// Block hash: SHA256(SHA256(80-byte header))
pub fn calculate_block_hash(header: &BlockHeader) -> Hash {
    sha256d(&hash_preimage(header))
}

/// Block hash computed through an arbitrary hasher
pub fn calculate_block_hash_with<H: MerkleHasher + ?Sized>(hasher: &H, header: &BlockHeader) -> Hash {
    hasher.hash(&hash_preimage(header))
}

/// Whether the version carries the auxpow flag
pub fn is_auxpow_version(version: i32) -> bool {
    version & VERSION_AUXPOW != 0
}

/// Chain id encoded in the upper version bits
pub fn chain_id_of(version: i32) -> i32 {
    version / VERSION_CHAIN_START
}

/// Versions below the auxpow flag predate chain ids altogether
pub fn is_legacy_version(version: i32) -> bool {
    version < VERSION_AUXPOW
}

/// Base version with the given chain id folded into the upper bits.
///
/// `None` if the chain id is outside `0..=MAX_AUXPOW_CHAIN_ID`, since the
/// upper version bits cannot hold it.
pub fn version_with_chain_id(base_version: i32, chain_id: i32) -> Option<i32> {
    if !(0..=MAX_AUXPOW_CHAIN_ID).contains(&chain_id) {
        return None;
    }
    chain_id
        .checked_mul(VERSION_CHAIN_START)?
        .checked_add(base_version % VERSION_AUXPOW)
}

impl BlockHeader {
    pub fn hash(&self) -> Hash {
        calculate_block_hash(self)
    }

    pub fn is_auxpow(&self) -> bool {
        is_auxpow_version(self.version)
    }

    pub fn chain_id(&self) -> i32 {
        chain_id_of(self.version)
    }

    pub fn is_legacy(&self) -> bool {
        is_legacy_version(self.version)
    }

    /// Copy of this header with the auxpow flag set or cleared.
    ///
    /// The flag is part of the hashed header, so it has to be settled
    /// before an auxpow committing to the hash is built.
    pub fn with_auxpow_flag(&self, auxpow: bool) -> BlockHeader {
        let mut header = self.clone();
        if auxpow {
            header.version |= VERSION_AUXPOW;
        } else {
            header.version &= !VERSION_AUXPOW;
        }
        header
    }
}

impl AuxBlockHeader {
    /// Header without auxpow; clears the auxpow flag
    pub fn new(header: BlockHeader) -> Self {
        AuxBlockHeader {
            header: header.with_auxpow_flag(false),
            auxpow: None,
        }
    }

    /// Header carrying an auxpow; sets the auxpow flag.
    ///
    /// If the flag was not already set, the header hash changes and the
    /// auxpow will no longer commit to it.
    pub fn with_auxpow(header: BlockHeader, auxpow: AuxPow) -> Self {
        AuxBlockHeader {
            header: header.with_auxpow_flag(true),
            auxpow: Some(Box::new(auxpow)),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn auxpow(&self) -> Option<&AuxPow> {
        self.auxpow.as_deref()
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Validate the merge-mining side of the header and return the hash
    /// whose proof of work the caller still has to verify against the
    /// header's target: the parent block hash for merge-mined headers,
    /// the header's own hash otherwise.
    pub fn check_auxpow(&self, params: &ConsensusParams) -> Result<Hash, AuxPowError> {
        let header = &self.header;
        if !header.is_legacy() && params.strict_chain_id && header.chain_id() != params.auxpow_chain_id {
            debug!(
                found = header.chain_id(),
                expected = params.auxpow_chain_id,
                "auxpow: block has wrong chain id"
            );
            return Err(AuxPowError::WrongChainId {
                expected: params.auxpow_chain_id,
                found: header.chain_id(),
            });
        }

        match self.auxpow() {
            None => Ok(header.hash()),
            Some(auxpow) => {
                auxpow.check(&header.hash(), header.chain_id(), params)?;
                Ok(auxpow.parent_block_hash())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_block_header() -> BlockHeader {
        BlockHeader {
            version: 1,
            prev_block_hash: [0; 32],
            merkle_root: [0; 32],
            time: 1231006505,
            bits: 0x1d00ffff,
            nonce: 2083236893,
        }
    }

    #[test]
    fn test_genesis_block_hash() {
        // Bitcoin genesis header
        let mut header = create_valid_block_header();
        header.merkle_root.copy_from_slice(
            &hex::decode("3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a").unwrap(),
        );
        assert_eq!(
            crate::hash::to_display_hex(&header.hash()),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
    }

    #[test]
    fn test_calculate_block_hash_different_headers() {
        let header1 = create_valid_block_header();
        let header2 = header1.with_auxpow_flag(true);
        assert_ne!(header1.hash(), header2.hash());
    }

    #[test]
    fn test_version_bits() {
        let version = version_with_chain_id(4, 1829).unwrap() | VERSION_AUXPOW;
        assert!(is_auxpow_version(version));
        assert_eq!(chain_id_of(version), 1829);
        assert!(!is_legacy_version(version));
        assert!(is_legacy_version(2));
    }

    #[test]
    fn test_with_auxpow_flag_toggles() {
        let header = create_valid_block_header();
        let flagged = header.with_auxpow_flag(true);
        assert!(flagged.is_auxpow());
        assert_eq!(flagged.with_auxpow_flag(false), header);
    }

    #[test]
    fn test_aux_header_without_auxpow_checks_own_hash() {
        let header = create_valid_block_header();
        let aux_header = AuxBlockHeader::new(header.clone());
        let params = ConsensusParams::regtest();
        assert_eq!(aux_header.check_auxpow(&params).unwrap(), header.hash());
    }

    #[test]
    fn test_aux_header_wrong_chain_id() {
        let mut header = create_valid_block_header();
        header.version = version_with_chain_id(1, 7).unwrap();
        let aux_header = AuxBlockHeader::new(header);
        let params = ConsensusParams::regtest();
        assert!(matches!(
            aux_header.check_auxpow(&params),
            Err(AuxPowError::WrongChainId { found: 7, .. })
        ));
    }

    #[test]
    fn test_version_with_chain_id_bounds() {
        assert_eq!(version_with_chain_id(4, MAX_AUXPOW_CHAIN_ID), Some(0x7fff_0004));
        assert_eq!(version_with_chain_id(4, MAX_AUXPOW_CHAIN_ID + 1), None);
        assert_eq!(version_with_chain_id(4, -1), None);
        assert_eq!(version_with_chain_id(4, i32::MAX), None);
    }

    #[test]
    fn test_aux_header_foreign_chain_id_when_not_strict() {
        let mut header = create_valid_block_header();
        header.version = version_with_chain_id(1, 7).unwrap();
        let aux_header = AuxBlockHeader::new(header.clone());
        let params = ConsensusParams {
            strict_chain_id: false,
            ..ConsensusParams::regtest()
        };
        assert_eq!(aux_header.check_auxpow(&params), Ok(header.hash()));
    }

    #[test]
    fn test_legacy_header_skips_chain_id_check() {
        // Version 1 predates chain ids; chain_id() reads 0 here
        let header = create_valid_block_header();
        assert!(header.is_legacy());
        let aux_header = AuxBlockHeader::new(header.clone());
        let params = ConsensusParams::regtest();
        assert_ne!(header.chain_id(), params.auxpow_chain_id);
        assert!(params.strict_chain_id);
        assert_eq!(aux_header.check_auxpow(&params), Ok(header.hash()));
    }
}
