//! LZNT1 chunk framing and token layout.
//!
//! ```text
//! stream := chunk* [0x0000]
//! chunk  := header(u16 LE) body
//!
//! header bit 15     : 1 = compressed body, 0 = raw body
//! header bits 12-14 : signature, always 3
//! header bits 0-11  : body size - 1
//! ```
//!
//! A compressed body is a run of groups: one flag byte followed by up to
//! eight items, least significant flag bit first. A clear bit is a literal
//! byte; a set bit is a little-endian 16-bit back-reference token whose
//! offset/length split widens with the position inside the chunk.

use mscomp_core::bits::log2_floor;
use mscomp_core::error::{MsCompError, Result};

/// Maximum decompressed size of one chunk.
pub const CHUNK_SIZE: usize = 4096;

/// Size of a chunk header.
pub const HEADER_SIZE: usize = 2;

/// Header value that terminates a stream.
pub const END_OF_STREAM: u16 = 0x0000;

const COMPRESSED_FLAG: u16 = 0x8000;
const SIGNATURE: u16 = 3;
const SIZE_MASK: u16 = 0x0FFF;

/// A decoded chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// True if the body is LZ77 tokens, false if it is raw bytes.
    pub compressed: bool,
    /// Size of the body in bytes (1-4096).
    pub size: usize,
}

impl ChunkHeader {
    /// Parse a raw header. Returns `None` for the end-of-stream marker.
    pub fn parse(raw: u16, offset: u64) -> Result<Option<Self>> {
        if raw == END_OF_STREAM {
            return Ok(None);
        }
        let signature = (raw >> 12) & 0x7;
        if signature != SIGNATURE {
            return Err(MsCompError::corrupted(
                offset,
                format!("invalid chunk signature {} in header {:#06x}", signature, raw),
            ));
        }
        Ok(Some(Self {
            compressed: raw & COMPRESSED_FLAG != 0,
            size: (raw & SIZE_MASK) as usize + 1,
        }))
    }

    /// Encode to the on-disk representation.
    pub fn encode(&self) -> u16 {
        debug_assert!(self.size >= 1 && self.size <= CHUNK_SIZE);
        let flag = if self.compressed { COMPRESSED_FLAG } else { 0 };
        flag | (SIGNATURE << 12) | (self.size - 1) as u16
    }
}

/// Number of offset bits in a token emitted at chunk position `pos`.
#[inline]
pub fn offset_bits(pos: usize) -> u32 {
    if pos <= 16 {
        4
    } else {
        log2_floor((pos - 1) as u32) + 1
    }
}

/// Longest match a token can express at chunk position `pos`.
#[inline]
pub fn max_match_len(pos: usize) -> usize {
    (0xFFFF >> offset_bits(pos)) + 3
}

/// Split a token read at chunk position `pos` into `(distance, length)`.
#[inline]
pub fn decode_token(pos: usize, token: u16) -> (usize, usize) {
    let length_bits = 16 - offset_bits(pos);
    let mask = (1u16 << length_bits) - 1;
    (
        (token >> length_bits) as usize + 1,
        (token & mask) as usize + 3,
    )
}

/// Pack a back-reference at chunk position `pos` into a token.
#[inline]
pub fn encode_token(pos: usize, distance: usize, length: usize) -> u16 {
    let length_bits = 16 - offset_bits(pos);
    debug_assert!(distance >= 1 && distance <= pos);
    debug_assert!(length >= 3 && length <= max_match_len(pos));
    (((distance - 1) << length_bits) | (length - 3)) as u16
}
