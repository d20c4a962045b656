//! Consensus (wire) encoding of merge-mining data.
//!
//! All integers are little-endian, vectors carry a CompactSize length prefix.
//! The layout is embedded verbatim in block headers, so encoding must round
//! trip byte-exact.

use crate::constants::*;
use crate::error::EncodeError;
use crate::types::*;
use std::io::{self, Cursor, Read, Write};

/// Data which can be encoded in a consensus-consistent way
pub trait Encodable {
    /// Encode into a writer, returning the number of bytes written
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize>;
}

/// Data which can be decoded in a consensus-consistent way
pub trait Decodable: Sized {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError>;
}

/// Encode an object into a byte vector.
///
/// Fails only for values outside the wire domain, such as a merkle index
/// that does not fit the signed 32-bit field.
pub fn serialize<T: Encodable + ?Sized>(data: &T) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = Vec::new();
    data.consensus_encode(&mut encoder).map_err(into_encode_error)?;
    Ok(encoder)
}

/// Hash preimage of a header or transaction. Neither carries range-limited
/// fields, so encoding into memory cannot fail.
pub(crate) fn hash_preimage<T: Encodable + ?Sized>(data: &T) -> Vec<u8> {
    let mut encoder = Vec::new();
    data.consensus_encode(&mut encoder)
        .expect("in-memory writers don't error");
    encoder
}

fn out_of_range(index: u32) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, EncodeError::IndexOutOfRange(index))
}

/// Unwrap a structural error that an encoder smuggled through `io::Error`
fn into_encode_error(err: io::Error) -> EncodeError {
    if !err.get_ref().map_or(false, |inner| inner.is::<EncodeError>()) {
        return EncodeError::Io(err);
    }
    match err.into_inner().map(|inner| inner.downcast::<EncodeError>()) {
        Some(Ok(inner)) => *inner,
        _ => EncodeError::Io(io::ErrorKind::InvalidInput.into()),
    }
}

/// Encode a merkle index into its signed wire field
fn encode_index<W: Write + ?Sized>(w: &mut W, index: u32) -> io::Result<usize> {
    i32::try_from(index)
        .map_err(|_| out_of_range(index))?
        .consensus_encode(w)
}

/// Decode an object from a byte slice, requiring every byte to be consumed
pub fn deserialize<T: Decodable>(data: &[u8]) -> Result<T, EncodeError> {
    let mut cursor = Cursor::new(data);
    let value = T::consensus_decode(&mut cursor)?;
    let consumed = cursor.position() as usize;
    if consumed != data.len() {
        return Err(EncodeError::TrailingBytes(data.len() - consumed));
    }
    Ok(value)
}

/// Encode a number as a Bitcoin CompactSize
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

fn write_varint<W: Write + ?Sized>(w: &mut W, value: u64) -> io::Result<usize> {
    let bytes = encode_varint(value);
    w.write_all(&bytes)?;
    Ok(bytes.len())
}

/// Decode a CompactSize, rejecting non-minimal encodings
pub fn read_varint<R: Read + ?Sized>(r: &mut R) -> Result<u64, EncodeError> {
    let prefix = read_array::<R, 1>(r)?[0];
    let (value, min) = match prefix {
        0xff => (u64::from_le_bytes(read_array(r)?), 0x1_0000_0000),
        0xfe => (u32::from_le_bytes(read_array(r)?) as u64, 0x1_0000),
        0xfd => (u16::from_le_bytes(read_array(r)?) as u64, 0xfd),
        n => return Ok(n as u64),
    };
    if value < min {
        return Err(EncodeError::NonMinimalCompactSize);
    }
    Ok(value)
}

fn read_array<R: Read + ?Sized, const N: usize>(r: &mut R) -> Result<[u8; N], EncodeError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Decode a merkle branch, capped at the deepest tree a valid auxpow can use
fn read_branch<R: Read + ?Sized>(r: &mut R) -> Result<Vec<Hash>, EncodeError> {
    let len = read_varint(r)?;
    if len > MAX_CHAIN_MERKLE_DEPTH as u64 {
        return Err(EncodeError::BranchTooLong {
            len,
            max: MAX_CHAIN_MERKLE_DEPTH,
        });
    }
    (0..len).map(|_| <Hash as Decodable>::consensus_decode(r)).collect()
}

/// Read a vector length and make sure `len * elem_size` stays bounded
fn read_len<R: Read + ?Sized>(r: &mut R, elem_size: usize) -> Result<usize, EncodeError> {
    let len = read_varint(r)?;
    if len.saturating_mul(elem_size as u64) > MAX_VEC_SIZE as u64 {
        return Err(EncodeError::OversizedVector {
            requested: len,
            max: MAX_VEC_SIZE / elem_size,
        });
    }
    Ok(len as usize)
}

macro_rules! impl_int_encodable {
    ($ty:ty, $size:expr) => {
        impl Encodable for $ty {
            fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
                w.write_all(&self.to_le_bytes())?;
                Ok($size)
            }
        }

        impl Decodable for $ty {
            fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
                Ok(<$ty>::from_le_bytes(read_array(r)?))
            }
        }
    };
}

impl_int_encodable!(u32, 4);
impl_int_encodable!(i32, 4);
impl_int_encodable!(i64, 8);

impl Encodable for Hash {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        w.write_all(self)?;
        Ok(32)
    }
}

impl Decodable for Hash {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        read_array(r)
    }
}

impl Encodable for ByteString {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let len = write_varint(w, self.len() as u64)?;
        w.write_all(self)?;
        Ok(len + self.len())
    }
}

impl Decodable for ByteString {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        let len = read_len(r, 1)?;
        let mut bytes = Vec::new();
        Read::take(&mut *r, len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(bytes)
    }
}

macro_rules! impl_vec_encodable {
    ($ty:ty, $min_size:expr) => {
        impl Encodable for Vec<$ty> {
            fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
                let mut len = write_varint(w, self.len() as u64)?;
                for item in self {
                    len += item.consensus_encode(w)?;
                }
                Ok(len)
            }
        }

        impl Decodable for Vec<$ty> {
            fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
                let len = read_len(r, $min_size)?;
                // Grow as items arrive so a lying prefix cannot force a large allocation
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(Decodable::consensus_decode(r)?);
                }
                Ok(items)
            }
        }
    };
}

impl_vec_encodable!(Hash, 32);
impl_vec_encodable!(TransactionInput, 41);
impl_vec_encodable!(TransactionOutput, 9);

impl Encodable for OutPoint {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        Ok(self.hash.consensus_encode(w)? + self.index.consensus_encode(w)?)
    }
}

impl Decodable for OutPoint {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        Ok(OutPoint {
            hash: Decodable::consensus_decode(r)?,
            index: Decodable::consensus_decode(r)?,
        })
    }
}

impl Encodable for TransactionInput {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let mut len = 0;
        len += self.prevout.consensus_encode(w)?;
        len += self.script_sig.consensus_encode(w)?;
        len += self.sequence.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for TransactionInput {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        Ok(TransactionInput {
            prevout: Decodable::consensus_decode(r)?,
            script_sig: Decodable::consensus_decode(r)?,
            sequence: Decodable::consensus_decode(r)?,
        })
    }
}

impl Encodable for TransactionOutput {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        Ok(self.value.consensus_encode(w)? + self.script_pubkey.consensus_encode(w)?)
    }
}

impl Decodable for TransactionOutput {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        Ok(TransactionOutput {
            value: Decodable::consensus_decode(r)?,
            script_pubkey: Decodable::consensus_decode(r)?,
        })
    }
}

impl Encodable for Transaction {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let mut len = 0;
        len += self.version.consensus_encode(w)?;
        len += self.inputs.consensus_encode(w)?;
        len += self.outputs.consensus_encode(w)?;
        len += self.lock_time.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for Transaction {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        Ok(Transaction {
            version: Decodable::consensus_decode(r)?,
            inputs: Decodable::consensus_decode(r)?,
            outputs: Decodable::consensus_decode(r)?,
            lock_time: Decodable::consensus_decode(r)?,
        })
    }
}

impl Encodable for BlockHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let mut len = 0;
        len += self.version.consensus_encode(w)?;
        len += self.prev_block_hash.consensus_encode(w)?;
        len += self.merkle_root.consensus_encode(w)?;
        len += self.time.consensus_encode(w)?;
        len += self.bits.consensus_encode(w)?;
        len += self.nonce.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for BlockHeader {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        Ok(BlockHeader {
            version: Decodable::consensus_decode(r)?,
            prev_block_hash: Decodable::consensus_decode(r)?,
            merkle_root: Decodable::consensus_decode(r)?,
            time: Decodable::consensus_decode(r)?,
            bits: Decodable::consensus_decode(r)?,
            nonce: Decodable::consensus_decode(r)?,
        })
    }
}

impl Encodable for MerkleProofTx {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let mut len = 0;
        len += self.tx.consensus_encode(w)?;
        len += self.block_hash.consensus_encode(w)?;
        len += self.merkle_branch.consensus_encode(w)?;
        len += match self.index {
            Some(index) => encode_index(w, index)?,
            None => (-1i32).consensus_encode(w)?,
        };
        Ok(len)
    }
}

impl Decodable for MerkleProofTx {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        let tx = Decodable::consensus_decode(r)?;
        let block_hash = Decodable::consensus_decode(r)?;
        let merkle_branch = read_branch(r)?;
        let index = match i32::consensus_decode(r)? {
            -1 => None,
            n if n < 0 => return Err(EncodeError::NegativeIndex(n)),
            n => Some(n as u32),
        };
        Ok(MerkleProofTx {
            tx,
            block_hash,
            merkle_branch,
            index,
        })
    }
}

impl Encodable for AuxPow {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let mut len = 0;
        len += self.coinbase_tx.consensus_encode(w)?;
        len += self.chain_merkle_branch.consensus_encode(w)?;
        len += encode_index(w, self.chain_index)?;
        len += self.parent_block.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for AuxPow {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        let coinbase_tx = Decodable::consensus_decode(r)?;
        let chain_merkle_branch = read_branch(r)?;
        let chain_index = i32::consensus_decode(r)?;
        if chain_index < 0 {
            return Err(EncodeError::NegativeIndex(chain_index));
        }
        let parent_block = Decodable::consensus_decode(r)?;
        Ok(AuxPow {
            coinbase_tx,
            chain_merkle_branch,
            chain_index: chain_index as u32,
            parent_block,
        })
    }
}

impl Encodable for AuxBlockHeader {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let mut len = self.header().consensus_encode(w)?;
        if let Some(auxpow) = self.auxpow() {
            len += auxpow.consensus_encode(w)?;
        }
        Ok(len)
    }
}

impl Decodable for AuxBlockHeader {
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, EncodeError> {
        let header = BlockHeader::consensus_decode(r)?;
        if !crate::block::is_auxpow_version(header.version) {
            return Ok(AuxBlockHeader::new(header));
        }
        let auxpow = AuxPow::consensus_decode(r).map_err(|err| match err {
            EncodeError::Io(ref io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof => {
                EncodeError::MissingAuxPow
            }
            other => other,
        })?;
        Ok(AuxBlockHeader::with_auxpow(header, auxpow))
    }
}
