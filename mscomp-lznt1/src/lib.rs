//! # mscomp LZNT1
//!
//! Pure Rust streaming implementation of LZNT1, the chunked LZ77 format used
//! by NTFS file compression and `RtlCompressBuffer`.
//!
//! - 4 KiB independent chunks with a 2-byte header each
//! - Flag bytes select literals or 16-bit back-reference tokens
//! - Token offset/length split adapts to the position within the chunk
//!
//! Both directions run on the shared [`Engine`], so they accept input and
//! deliver output in pieces of any size.
//!
//! ## Example
//!
//! ```rust
//! use mscomp_core::CompressionLevel;
//!
//! let data = b"the quick brown fox jumps over the quick brown dog".repeat(20);
//! let packed = mscomp_lznt1::compress(&data, CompressionLevel::DEFAULT).unwrap();
//! assert!(packed.len() < data.len());
//!
//! let unpacked = mscomp_lznt1::decompress(&packed).unwrap();
//! assert_eq!(unpacked, data);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use mscomp_core::{Flush, Status, StreamIo};
//!
//! let mut session = mscomp_lznt1::decompress_session();
//! let input = [0x03, 0xB0, 0x02, b'A', 0x00, 0x00, 0x00, 0x00];
//! let mut out = [0u8; 2];
//! let mut produced = Vec::new();
//! let mut pos = 0;
//!
//! loop {
//!     let (consumed, n, status) = session.process(&input[pos..], &mut out, Flush::Finish).unwrap();
//!     pos += consumed;
//!     produced.extend_from_slice(&out[..n]);
//!     if status == Status::StreamEnd {
//!         break;
//!     }
//! }
//! session.end(&mut StreamIo::new(&[], &mut [])).unwrap();
//! assert_eq!(produced, b"AAAA");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]

pub mod chunk;
pub mod decoder;
pub mod encoder;

pub use chunk::{CHUNK_SIZE, ChunkHeader};
pub use decoder::Lznt1Decoder;
pub use encoder::Lznt1Encoder;

use mscomp_core::error::Result;
use mscomp_core::{CompressionLevel, Engine, Format, InputStage, Mode, OutputStage, Session};

/// Output working area for the encoder: one chunk plus its worst case raw
/// form, and the terminator.
const ENCODER_WORKING: usize = 2 * CHUNK_SIZE + 8;

/// Create a streaming LZNT1 compressor.
pub fn compressor(level: CompressionLevel) -> Engine<Lznt1Encoder> {
    Engine::new(
        Mode::Compress,
        Lznt1Encoder::new(level),
        InputStage::new(CHUNK_SIZE),
        OutputStage::new(0, ENCODER_WORKING),
    )
}

/// Create a streaming LZNT1 decompressor.
pub fn decompressor() -> Engine<Lznt1Decoder> {
    Engine::new(
        Mode::Decompress,
        Lznt1Decoder::new(),
        InputStage::new(CHUNK_SIZE),
        OutputStage::new(0, CHUNK_SIZE),
    )
}

/// Start a compression session.
pub fn compress_session(level: CompressionLevel) -> Session {
    Session::new(Mode::Compress, Format::Lznt1, Box::new(compressor(level)))
}

/// Start a decompression session.
pub fn decompress_session() -> Session {
    Session::new(Mode::Decompress, Format::Lznt1, Box::new(decompressor()))
}

/// Compress `data` into a complete LZNT1 stream.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_session(level).process_all(data)
}

/// Decompress a complete LZNT1 stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_session().process_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_multi_chunk() {
        let mut data = Vec::new();
        for i in 0..3000u32 {
            data.extend_from_slice(format!("record {} of the log\n", i % 97).as_bytes());
        }
        assert!(data.len() > 4 * CHUNK_SIZE);

        let packed = compress(&data, CompressionLevel::DEFAULT).unwrap();
        assert!(packed.len() < data.len() / 2);
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_exact_chunk_multiple() {
        let data = vec![0x5Au8; 2 * CHUNK_SIZE];
        let packed = compress(&data, CompressionLevel::FAST).unwrap();
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_empty() {
        let packed = compress(b"", CompressionLevel::DEFAULT).unwrap();
        assert_eq!(packed, [0x00, 0x00]);
        assert!(decompress(&packed).unwrap().is_empty());
        assert!(decompress(b"").unwrap().is_empty());
    }

    #[test]
    fn test_chunk_counts() {
        let mut engine = compressor(CompressionLevel::DEFAULT);
        let data = vec![7u8; CHUNK_SIZE + 10];
        let mut out = vec![0u8; 1024];
        let mut io = mscomp_core::StreamIo::new(&data, &mut out);
        let status = engine.step(&mut io, mscomp_core::Flush::Finish).unwrap();
        assert_eq!(status, mscomp_core::Status::StreamEnd);
        assert_eq!(engine.codec().chunk_counts(), (2, 0));
    }
}
