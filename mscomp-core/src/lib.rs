//! # mscomp Core
//!
//! Core components for the mscomp streaming codecs.
//!
//! This crate provides the format-independent building blocks:
//!
//! - [`bits`]: Little-endian integer access, rotate, popcount, log2
//! - [`copy`]: Overlap-aware back-reference expansion with a bounded fast path
//! - [`io`]: Per-call input/output views
//! - [`stage`]: Input and output staging buffers (append-in / dump-out)
//! - [`engine`]: Generic streaming driver around a [`Codec`]
//! - [`session`]: Caller-facing stream handle
//! - [`matcher`]: Hash-chain match finder for the encoders
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Session                                                 │
//! │     start / step / end, totals, call validation         │
//! ├─────────────────────────────────────────────────────────┤
//! │ FormatState (Engine<Codec>)                             │
//! │     LZNT1, Xpress encoders and decoders                 │
//! ├─────────────────────────────────────────────────────────┤
//! │ Streaming buffer protocol                               │
//! │     InputStage (append-in), OutputStage (dump-out)      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Primitives (this crate)                                 │
//! │     bits, overlap-aware copy, match finder              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mscomp_core::bits::{log2_floor, read_u16_le};
//! use mscomp_core::copy::expand_backreference;
//!
//! let header = read_u16_le(&[0x03, 0xB0], 0);
//! assert_eq!(header & 0x0FFF, 3);
//! assert_eq!(log2_floor(4095u32), 11);
//!
//! let mut buf = [0u8; 32];
//! buf[0] = b'A';
//! expand_backreference(&mut buf, 1, 1, 3);
//! assert_eq!(&buf[..4], b"AAAA");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]

pub mod bits;
pub mod copy;
pub mod engine;
pub mod error;
pub mod format;
pub mod io;
pub mod matcher;
pub mod session;
pub mod stage;
pub mod traits;

// Re-exports for convenience
pub use engine::Engine;
pub use error::{ErrorKind, MsCompError, Result};
pub use format::{Format, Mode};
pub use io::StreamIo;
pub use matcher::{Match, MatchFinder, MatchParams};
pub use session::Session;
pub use stage::{Drain, InputStage, OutputStage};
pub use traits::{Codec, CompressionLevel, Flush, FormatState, Status};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::Engine;
    pub use crate::error::{ErrorKind, MsCompError, Result};
    pub use crate::format::{Format, Mode};
    pub use crate::io::StreamIo;
    pub use crate::session::Session;
    pub use crate::stage::{InputStage, OutputStage};
    pub use crate::traits::{Codec, CompressionLevel, Flush, FormatState, Status};
}
