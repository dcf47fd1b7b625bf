//! # mscomp Xpress
//!
//! Pure Rust streaming implementation of plain Xpress, the LZ77 variant of
//! the Microsoft Xpress Compression Algorithm (MS-XCA) used by Windows
//! hibernation files, SMB and `RtlCompressBuffer`.
//!
//! - 8 KiB sliding window
//! - 32-bit flag words, one bit per literal or match
//! - Variable-length match lengths with shared half-byte fields
//! - No end marker: the stream ends where its input ends
//!
//! ## Example
//!
//! ```rust
//! use mscomp_core::CompressionLevel;
//!
//! let data = b"abc".repeat(100);
//! let packed = mscomp_xpress::compress(&data, CompressionLevel::DEFAULT).unwrap();
//! assert_eq!(
//!     packed,
//!     [0xFF, 0xFF, 0xFF, 0x1F, b'a', b'b', b'c', 0x17, 0x00, 0x0F, 0xFF, 0x26, 0x01]
//! );
//! assert_eq!(mscomp_xpress::decompress(&packed).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
pub mod token;

pub use decoder::XpressDecoder;
pub use encoder::{BLOCK_SIZE, XpressEncoder};
pub use token::WINDOW_SIZE;

use mscomp_core::error::Result;
use mscomp_core::{CompressionLevel, Engine, Format, InputStage, Mode, OutputStage, Session};

/// Create a streaming Xpress compressor.
pub fn compressor(level: CompressionLevel) -> Engine<XpressEncoder> {
    Engine::new(
        Mode::Compress,
        XpressEncoder::new(level),
        InputStage::new(BLOCK_SIZE),
        OutputStage::new(0, encoder::OUTPUT_WORKING),
    )
}

/// Create a streaming Xpress decompressor.
pub fn decompressor() -> Engine<XpressDecoder> {
    Engine::new(
        Mode::Decompress,
        XpressDecoder::new(),
        InputStage::new(token::FLAG_WORD_SIZE),
        decoder::output_stage(),
    )
}

/// Start a compression session.
pub fn compress_session(level: CompressionLevel) -> Session {
    Session::new(Mode::Compress, Format::Xpress, Box::new(compressor(level)))
}

/// Start a decompression session.
pub fn decompress_session() -> Session {
    Session::new(Mode::Decompress, Format::Xpress, Box::new(decompressor()))
}

/// Compress `data` into a complete Xpress stream.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_session(level).process_all(data)
}

/// Decompress a complete Xpress stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_session().process_all(data)
}
