//! # mscomp
//!
//! Streaming compression and decompression for the Microsoft LZ77 family.
//!
//! - **none**: bytes pass through unchanged
//! - **lznt1**: NTFS chunked LZ77 (4 KiB chunks)
//! - **xpress**: plain Xpress / MS-XCA LZ77 (8 KiB window)
//!
//! Every format is driven through the same [`Session`]: start it for a
//! direction and format, call [`Session::step`] with whatever input and
//! output space is at hand, and [`Session::end`] it. Output never depends on
//! how the caller splits its buffers.
//!
//! ## Example
//!
//! ```rust
//! use mscomp::{Flush, Format, Mode, Status, StreamIo};
//!
//! let mut session = mscomp::start(Mode::Compress, Format::Xpress);
//! let mut packed = vec![0u8; 256];
//! let mut io = StreamIo::new(b"to be or not to be, that is the question", &mut packed);
//! assert_eq!(session.step(&mut io, Flush::Finish).unwrap(), Status::StreamEnd);
//! let n = io.produced();
//! session.end(&mut io).unwrap();
//!
//! let restored = mscomp::decompress_to_vec(Format::Xpress, &packed[..n]).unwrap();
//! assert_eq!(restored, b"to be or not to be, that is the question");
//! ```
//!
//! ## All at once
//!
//! ```rust
//! use mscomp::{Format, MsCompError};
//!
//! let data = vec![b'z'; 10_000];
//! let mut out = vec![0u8; 64];
//! let n = mscomp::compress(Format::Lznt1, &data, &mut out).unwrap();
//!
//! let mut small = [0u8; 100];
//! let err = mscomp::decompress(Format::Lznt1, &out[..n], &mut small).unwrap_err();
//! assert!(matches!(err, MsCompError::BufferTooSmall { .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]

pub mod stored;

pub use mscomp_core::error::{ErrorKind, MsCompError, Result};
pub use mscomp_core::{CompressionLevel, Flush, Format, Mode, Session, Status, StreamIo};
pub use stored::StoredState;

use tracing::debug;

/// Start a stream with the default compression level.
pub fn start(mode: Mode, format: Format) -> Session {
    start_with_level(mode, format, CompressionLevel::DEFAULT)
}

/// Start a stream. `level` only affects compression.
pub fn start_with_level(mode: Mode, format: Format, level: CompressionLevel) -> Session {
    debug!(%mode, %format, level = level.level(), "selecting format");
    match (mode, format) {
        (_, Format::None) => Session::new(mode, format, Box::new(StoredState::new(mode))),
        (Mode::Compress, Format::Lznt1) => mscomp_lznt1::compress_session(level),
        (Mode::Decompress, Format::Lznt1) => mscomp_lznt1::decompress_session(),
        (Mode::Compress, Format::Xpress) => mscomp_xpress::compress_session(level),
        (Mode::Decompress, Format::Xpress) => mscomp_xpress::decompress_session(),
    }
}

/// Start a stream for a format given by name, such as `"lznt1"`.
///
/// Unknown names are an argument error.
pub fn start_by_name(mode: Mode, name: &str) -> Result<Session> {
    Ok(start(mode, name.parse()?))
}

/// Compress `input` into `output` in one call, returning the compressed size.
///
/// Fails with a buffer error if `output` is too small; it is never grown.
/// The error's `needed` is only a lower bound (one byte more than fitted):
/// the full size is not known without finishing the stream.
pub fn compress(format: Format, input: &[u8], output: &mut [u8]) -> Result<usize> {
    compress_with_level(format, CompressionLevel::DEFAULT, input, output)
}

/// [`compress`] with an explicit level.
pub fn compress_with_level(
    format: Format,
    level: CompressionLevel,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize> {
    run_once(
        start_with_level(Mode::Compress, format, level),
        input,
        output,
    )
}

/// Decompress `input` into `output` in one call, returning the output size.
///
/// Fails with a buffer error if `output` is too small; it is never grown.
/// As with [`compress`], the error's `needed` is a lower bound.
pub fn decompress(format: Format, input: &[u8], output: &mut [u8]) -> Result<usize> {
    run_once(start(Mode::Decompress, format), input, output)
}

/// Compress into a growing vector.
pub fn compress_to_vec(format: Format, level: CompressionLevel, input: &[u8]) -> Result<Vec<u8>> {
    start_with_level(Mode::Compress, format, level).process_all(input)
}

/// Decompress into a growing vector.
pub fn decompress_to_vec(format: Format, input: &[u8]) -> Result<Vec<u8>> {
    start(Mode::Decompress, format).process_all(input)
}

fn run_once(mut session: Session, input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut io = StreamIo::new(input, output);
    match session.step(&mut io, Flush::Finish)? {
        Status::StreamEnd => {
            session.end(&mut io)?;
            Ok(io.produced())
        }
        // The output filled up; how much more is needed is unknown.
        Status::Ok | Status::NeedMoreInput => Err(MsCompError::buffer_too_small(
            io.produced() + 1,
            io.produced(),
        )),
    }
}
