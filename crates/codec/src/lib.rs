//! # Codec — on-disk record framing
//!
//! Frames and verifies the two record shapes the store writes to disk.
//! Both shapes carry a leading CRC-32 (IEEE, zero-initial — `crc32fast`'s
//! default) computed over every byte that follows it.
//!
//! ## Intent record (write-ahead log)
//!
//! ```text
//! [crc32: u32 LE][type: u8][key_len: u32 LE][val_len: u32 LE][key][value]
//! ```
//!
//! `type` is 1 for an upsert, 2 for a delete. A delete has `val_len = 0` and
//! no value bytes.
//!
//! ## Segment record
//!
//! ```text
//! [crc32: u32 LE][key_len: u32 LE][val_len: u32 LE][key][value]
//! ```
//!
//! Segment records have no type byte: a segment stores live keys only.
//!
//! ## Decoding
//!
//! [`decode_intent`] and [`decode_segment`] classify the stream position
//! rather than failing: a clean end, a torn tail from a crash mid-write, and
//! a checksum mismatch are all ordinary outcomes that terminate a scan.
//! Only genuine I/O errors surface as `Err`.

use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use std::io::{self, Read};
use thiserror::Error;

/// Record type byte for an upsert.
pub const REC_PUT: u8 = 1;
/// Record type byte for a delete.
pub const REC_DEL: u8 = 2;

/// Maximum framed body size (the bytes covered by the CRC). Records larger
/// than this are refused on encode and classified as corrupt on decode.
pub const MAX_BODY_BYTES: u32 = 16 * 1024 * 1024;

/// The operation carried by an intent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put,
    Del,
}

impl Op {
    fn type_byte(self) -> u8 {
        match self {
            Op::Put => REC_PUT,
            Op::Del => REC_DEL,
        }
    }
}

/// A decoded intent-log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRecord {
    pub op: Op,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// A decoded segment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Outcome of decoding one record from a stream.
///
/// `Truncated` and `Corrupt` both terminate a scan the same way
/// `EndOfStream` does — every record decoded before them is still good.
/// They are kept distinct so tests can tell a torn tail from bit rot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    /// A complete, checksum-verified record.
    Record(T),
    /// Clean end: no bytes remained in the stream.
    EndOfStream,
    /// The stream ended partway through a record (crash mid-write).
    Truncated,
    /// All fields were read but the checksum did not match, a length field
    /// was absurd, or the type byte was unknown.
    Corrupt,
}

#[derive(Debug, Error)]
pub enum CodecError {
    /// The framed body would exceed [`MAX_BODY_BYTES`].
    #[error("record body too large: {0} bytes (max {MAX_BODY_BYTES})")]
    BodyTooLarge(u64),

    /// An underlying I/O error (not end-of-stream).
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Encodes an intent record into `buf`, replacing its contents.
///
/// Layout: `[crc32][type][key_len][val_len][key][value]`. The buffer is
/// cleared first so callers can reuse one allocation across appends.
pub fn encode_intent(
    op: Op,
    key: &[u8],
    value: &[u8],
    buf: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let body_len = 9u64 + key.len() as u64 + value.len() as u64;
    if body_len > MAX_BODY_BYTES as u64 {
        return Err(CodecError::BodyTooLarge(body_len));
    }

    buf.clear();
    // Reserve 4 bytes for the CRC, filled in once the body is complete.
    buf.extend_from_slice(&[0u8; 4]);
    buf.push(op.type_byte());
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);

    let mut hasher = Crc32::new();
    hasher.update(&buf[4..]);
    let crc = hasher.finalize();
    buf[0..4].copy_from_slice(&crc.to_le_bytes());

    Ok(())
}

/// Encodes a segment record into `buf`, replacing its contents.
///
/// Layout: `[crc32][key_len][val_len][key][value]`.
pub fn encode_segment(key: &[u8], value: &[u8], buf: &mut Vec<u8>) -> Result<(), CodecError> {
    let body_len = 8u64 + key.len() as u64 + value.len() as u64;
    if body_len > MAX_BODY_BYTES as u64 {
        return Err(CodecError::BodyTooLarge(body_len));
    }

    buf.clear();
    buf.extend_from_slice(&[0u8; 4]);
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);

    let mut hasher = Crc32::new();
    hasher.update(&buf[4..]);
    let crc = hasher.finalize();
    buf[0..4].copy_from_slice(&crc.to_le_bytes());

    Ok(())
}

/// Decodes the next intent record from `r`.
pub fn decode_intent<R: Read>(r: &mut R) -> Result<Decoded<IntentRecord>, CodecError> {
    // The CRC field doubles as the end-of-stream probe: zero bytes read
    // means a clean end, a short read means a torn tail.
    let mut crc_buf = [0u8; 4];
    match read_up_to(r, &mut crc_buf)? {
        0 => return Ok(Decoded::EndOfStream),
        4 => {}
        _ => return Ok(Decoded::Truncated),
    }
    let stored_crc = u32::from_le_bytes(crc_buf);

    let type_byte = match r.read_u8() {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(Decoded::Truncated),
        Err(e) => return Err(CodecError::Io(e)),
    };
    let op = match type_byte {
        REC_PUT => Op::Put,
        REC_DEL => Op::Del,
        _ => return Ok(Decoded::Corrupt),
    };

    let (key_len, val_len) = match read_lengths(r)? {
        Some(lens) => lens,
        None => return Ok(Decoded::Truncated),
    };
    if 9u64 + key_len as u64 + val_len as u64 > MAX_BODY_BYTES as u64 {
        return Ok(Decoded::Corrupt);
    }

    let key = match read_payload(r, key_len as usize)? {
        Some(k) => k,
        None => return Ok(Decoded::Truncated),
    };
    let value = match read_payload(r, val_len as usize)? {
        Some(v) => v,
        None => return Ok(Decoded::Truncated),
    };

    let mut hasher = Crc32::new();
    hasher.update(&[type_byte]);
    hasher.update(&key_len.to_le_bytes());
    hasher.update(&val_len.to_le_bytes());
    hasher.update(&key);
    hasher.update(&value);
    if hasher.finalize() != stored_crc {
        return Ok(Decoded::Corrupt);
    }

    Ok(Decoded::Record(IntentRecord { op, key, value }))
}

/// Decodes the next segment record from `r`.
pub fn decode_segment<R: Read>(r: &mut R) -> Result<Decoded<SegmentRecord>, CodecError> {
    let mut crc_buf = [0u8; 4];
    match read_up_to(r, &mut crc_buf)? {
        0 => return Ok(Decoded::EndOfStream),
        4 => {}
        _ => return Ok(Decoded::Truncated),
    }
    let stored_crc = u32::from_le_bytes(crc_buf);

    let (key_len, val_len) = match read_lengths(r)? {
        Some(lens) => lens,
        None => return Ok(Decoded::Truncated),
    };
    if 8u64 + key_len as u64 + val_len as u64 > MAX_BODY_BYTES as u64 {
        return Ok(Decoded::Corrupt);
    }

    let key = match read_payload(r, key_len as usize)? {
        Some(k) => k,
        None => return Ok(Decoded::Truncated),
    };
    let value = match read_payload(r, val_len as usize)? {
        Some(v) => v,
        None => return Ok(Decoded::Truncated),
    };

    let mut hasher = Crc32::new();
    hasher.update(&key_len.to_le_bytes());
    hasher.update(&val_len.to_le_bytes());
    hasher.update(&key);
    hasher.update(&value);
    if hasher.finalize() != stored_crc {
        return Ok(Decoded::Corrupt);
    }

    Ok(Decoded::Record(SegmentRecord { key, value }))
}

/// Reads into `buf` until it is full or the stream ends, returning how many
/// bytes were read.
fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize, CodecError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Io(e)),
        }
    }
    Ok(filled)
}

/// Reads the `key_len`/`val_len` pair, `None` on a torn tail.
fn read_lengths<R: Read>(r: &mut R) -> Result<Option<(u32, u32)>, CodecError> {
    let key_len = match r.read_u32::<LittleEndian>() {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(CodecError::Io(e)),
    };
    let val_len = match r.read_u32::<LittleEndian>() {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(CodecError::Io(e)),
    };
    Ok(Some((key_len, val_len)))
}

/// Reads exactly `len` payload bytes, `None` on a torn tail.
fn read_payload<R: Read>(r: &mut R, len: usize) -> Result<Option<Vec<u8>>, CodecError> {
    let mut buf = vec![0u8; len];
    match r.read_exact(&mut buf) {
        Ok(()) => Ok(Some(buf)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(CodecError::Io(e)),
    }
}
