//! Streaming LZNT1 encoder.
//!
//! Input is taken in [`CHUNK_SIZE`] units. Each unit is compressed on its
//! own (LZNT1 never references across chunks) into a scratch buffer and
//! emitted as a compressed chunk, or as a raw chunk when compression would
//! make it larger. Flushing encodes the partial last chunk and appends the
//! end-of-stream marker.

use crate::chunk::{
    CHUNK_SIZE, ChunkHeader, END_OF_STREAM, HEADER_SIZE, encode_token, max_match_len,
};
use mscomp_core::error::Result;
use mscomp_core::{Codec, CompressionLevel, Match, MatchFinder, OutputStage};

/// Hash table size for the per-chunk match finder.
const HASH_BITS: u32 = 12;

/// LZNT1 encoder state.
#[derive(Debug)]
pub struct Lznt1Encoder {
    finder: MatchFinder,
    scratch: Vec<u8>,
    /// Next chunk position to index.
    hashed: usize,
    chunks: u64,
    raw_chunks: u64,
}

impl Lznt1Encoder {
    /// Create an encoder with the given compression level.
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            finder: MatchFinder::new(CHUNK_SIZE, HASH_BITS, level),
            scratch: Vec::with_capacity(CHUNK_SIZE + CHUNK_SIZE / 8 + 1),
            hashed: 0,
            chunks: 0,
            raw_chunks: 0,
        }
    }

    /// Chunks emitted so far, and how many of them were stored raw.
    pub fn chunk_counts(&self) -> (u64, u64) {
        (self.chunks, self.raw_chunks)
    }

    fn index_upto(&mut self, chunk: &[u8], end: usize) {
        if end > self.hashed {
            self.finder.insert_range(chunk, self.hashed, end);
            self.hashed = end;
        }
    }

    fn best_match(&mut self, chunk: &[u8], pos: usize) -> Option<Match> {
        self.index_upto(chunk, pos);
        let found = self.finder.find(chunk, pos, max_match_len(pos), pos)?;

        if self.finder.params().lazy && pos + 1 < chunk.len() {
            self.index_upto(chunk, pos + 1);
            let next = self
                .finder
                .find(chunk, pos + 1, max_match_len(pos + 1), pos + 1);
            if next.is_some_and(|n| n.length > found.length + 1) {
                return None;
            }
        }
        Some(found)
    }

    /// Compress one chunk into the scratch buffer.
    fn compress_chunk(&mut self, chunk: &[u8]) {
        self.finder.reset();
        self.scratch.clear();
        self.hashed = 0;

        let mut pos = 0;
        while pos < chunk.len() {
            let flag_at = self.scratch.len();
            self.scratch.push(0);
            let mut flags = 0u8;

            for bit in 0..8 {
                if pos >= chunk.len() {
                    break;
                }
                match self.best_match(chunk, pos) {
                    Some(m) => {
                        let token = encode_token(pos, m.distance, m.length);
                        self.scratch.extend_from_slice(&token.to_le_bytes());
                        flags |= 1 << bit;
                        pos += m.length;
                    }
                    None => {
                        self.scratch.push(chunk[pos]);
                        pos += 1;
                    }
                }
            }

            self.scratch[flag_at] = flags;
        }
    }

    fn emit_chunk(&mut self, chunk: &[u8], out: &mut OutputStage) -> Result<()> {
        self.compress_chunk(chunk);
        out.reserve(HEADER_SIZE + CHUNK_SIZE)?;

        let compressed = self.scratch.len() <= chunk.len();
        let body: &[u8] = if compressed { &self.scratch } else { chunk };
        let header = ChunkHeader {
            compressed,
            size: body.len(),
        };
        out.extend(&header.encode().to_le_bytes());
        out.extend(body);

        self.chunks += 1;
        if !compressed {
            self.raw_chunks += 1;
        }
        Ok(())
    }
}

impl Default for Lznt1Encoder {
    fn default() -> Self {
        Self::new(CompressionLevel::DEFAULT)
    }
}

impl Codec for Lznt1Encoder {
    fn next_unit(&self) -> Option<usize> {
        Some(CHUNK_SIZE)
    }

    fn feed(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()> {
        self.emit_chunk(unit, out)
    }

    fn flush(&mut self, tail: &[u8], out: &mut OutputStage) -> Result<()> {
        if !tail.is_empty() {
            self.emit_chunk(tail, out)?;
        }
        out.reserve(HEADER_SIZE)?;
        out.extend(&END_OF_STREAM.to_le_bytes());
        Ok(())
    }
}
