//! Streaming LZNT1 decoder.
//!
//! The decoder asks the engine for one header (2 bytes), then for the whole
//! chunk body whose size the header announced. A body decodes to at most
//! [`CHUNK_SIZE`] bytes and never references an earlier chunk, so the output
//! stage needs no history window.

use crate::chunk::{CHUNK_SIZE, ChunkHeader, HEADER_SIZE, decode_token};
use mscomp_core::bits::read_u16_le;
use mscomp_core::error::{MsCompError, Result};
use mscomp_core::{Codec, OutputStage};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Body(ChunkHeader),
    End,
}

/// LZNT1 decoder state.
#[derive(Debug)]
pub struct Lznt1Decoder {
    phase: Phase,
    /// Compressed bytes consumed so far.
    offset: u64,
    chunks: u64,
}

impl Lznt1Decoder {
    /// Create a decoder positioned at the first chunk header.
    pub fn new() -> Self {
        Self {
            phase: Phase::Header,
            offset: 0,
            chunks: 0,
        }
    }

    /// Number of chunks decoded so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// True once the end-of-stream marker has been read.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::End
    }

    fn decode_compressed(&self, body: &[u8], out: &mut OutputStage) -> Result<()> {
        let mut pos = 0usize;
        let mut i = 0usize;

        while i < body.len() {
            let flags = body[i];
            i += 1;

            for bit in 0..8 {
                if i >= body.len() {
                    break;
                }

                if flags & (1 << bit) == 0 {
                    if pos >= CHUNK_SIZE {
                        return Err(self.overflow(i));
                    }
                    out.push(body[i]);
                    i += 1;
                    pos += 1;
                    continue;
                }

                if i + 2 > body.len() {
                    return Err(MsCompError::corrupted(
                        self.offset + i as u64,
                        "back-reference token cut off by end of chunk",
                    ));
                }
                let (distance, length) = decode_token(pos, read_u16_le(body, i));
                if distance > pos {
                    return Err(MsCompError::invalid_distance(distance, pos));
                }
                if pos + length > CHUNK_SIZE {
                    return Err(self.overflow(i));
                }
                let copied = out.copy_match(distance, length)?;
                debug_assert_eq!(copied, length);
                i += 2;
                pos += length;
            }
        }

        Ok(())
    }

    fn overflow(&self, at: usize) -> MsCompError {
        MsCompError::corrupted(
            self.offset + at as u64,
            format!("chunk decompresses to more than {} bytes", CHUNK_SIZE),
        )
    }
}

impl Default for Lznt1Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for Lznt1Decoder {
    fn next_unit(&self) -> Option<usize> {
        match self.phase {
            Phase::Header => Some(HEADER_SIZE),
            Phase::Body(header) => Some(header.size),
            Phase::End => None,
        }
    }

    fn feed(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()> {
        match self.phase {
            Phase::Header => {
                let raw = read_u16_le(unit, 0);
                self.phase = match ChunkHeader::parse(raw, self.offset)? {
                    Some(header) => Phase::Body(header),
                    None => {
                        trace!(chunks = self.chunks, "end of stream marker");
                        Phase::End
                    }
                };
                self.offset += HEADER_SIZE as u64;
            }
            Phase::Body(header) => {
                out.reserve(CHUNK_SIZE)?;
                out.restart();
                if header.compressed {
                    self.decode_compressed(unit, out)?;
                } else {
                    out.extend(unit);
                }
                self.offset += unit.len() as u64;
                self.chunks += 1;
                self.phase = Phase::Header;
            }
            Phase::End => {
                return Err(MsCompError::invalid_argument("input after end of stream"));
            }
        }
        Ok(())
    }

    fn flush(&mut self, tail: &[u8], _out: &mut OutputStage) -> Result<()> {
        match self.phase {
            // A stream may stop at any chunk boundary without a marker.
            Phase::Header if tail.is_empty() => {
                self.phase = Phase::End;
                Ok(())
            }
            Phase::Header => Err(MsCompError::truncated(HEADER_SIZE - tail.len())),
            Phase::Body(header) => Err(MsCompError::truncated(header.size - tail.len())),
            Phase::End => Ok(()),
        }
    }
}
