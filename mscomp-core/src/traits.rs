//! Core traits for streaming formats.
//!
//! A format plugs into the engine at one of two seams:
//!
//! - [`Codec`]: an encoder or decoder expressed as "consume one indivisible
//!   unit, write output into the stage". [`crate::engine::Engine`] supplies
//!   the buffer protocol around it.
//! - [`FormatState`]: the object-safe step interface a
//!   [`crate::session::Session`] drives. Every `Engine<C>` implements it;
//!   formats with no unit structure may implement it directly.

use crate::error::Result;
use crate::io::StreamIo;
use crate::stage::OutputStage;

/// Outcome of a successful streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Progress was made; call again with more input or output.
    Ok,
    /// All input was consumed without producing output. Compression only.
    NeedMoreInput,
    /// The stream is complete and all output has been delivered.
    StreamEnd,
}

/// Whether the caller has supplied the last of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flush {
    /// More input may follow.
    #[default]
    None,
    /// This call's input is the end of the stream.
    Finish,
}

/// A format encoder or decoder driven one input unit at a time.
pub trait Codec {
    /// Size in bytes of the next indivisible input unit, or `None` once the
    /// format has seen its own end marker.
    fn next_unit(&self) -> Option<usize>;

    /// Process one complete unit of exactly `next_unit()` bytes.
    fn feed(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()>;

    /// True if output from the last unit did not fit and must be resumed.
    fn has_deferred(&self) -> bool {
        false
    }

    /// Continue deferred output after the stage has been drained.
    fn resume(&mut self, _out: &mut OutputStage) -> Result<()> {
        Ok(())
    }

    /// Input has ended. `tail` holds the bytes of an incomplete unit.
    ///
    /// Encoders emit the tail and any trailer and lift every hold. Decoders
    /// check that the stream may legally end here.
    fn flush(&mut self, tail: &[u8], out: &mut OutputStage) -> Result<()>;
}

/// Object-safe streaming interface owned by a session.
pub trait FormatState: Send {
    /// Consume input and produce output within the given views.
    fn step(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status>;

    /// Complete the stream, delivering everything still staged.
    ///
    /// Fails with a buffer error, leaving the state intact, if `io` has too
    /// little output space.
    fn finish(&mut self, io: &mut StreamIo<'_>) -> Result<()>;
}

/// Compression level (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// No match search; literals only.
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a custom compression level (0-9).
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}
