//! Error types for mscomp operations.
//!
//! Every failure a stream can report maps onto one of three caller-visible
//! kinds (see [`ErrorKind`]):
//!
//! - **Arg**: the call itself was malformed (ended session, wrong mode,
//!   wrong format). Nothing was changed.
//! - **Buffer**: the output space was too small to make progress. Supply
//!   more output and retry; the session stays valid.
//! - **Data**: the compressed input is malformed. The session is dead.
//!
//! I/O errors only appear in the file-level helpers built on top.

use std::io;
use thiserror::Error;

/// The main error type for mscomp operations.
#[derive(Debug, Error)]
pub enum MsCompError {
    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument or call sequence.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violated precondition.
        message: String,
    },

    /// Output buffer too small to make progress.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed (a lower bound when not known exactly).
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// Corrupted compressed data.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset in the compressed stream where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Back-reference points before the start of the produced data.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes of history available at that point.
        history_size: usize,
    },

    /// Compressed stream ended in the middle of a unit.
    #[error("Unexpected end of stream: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },
}

/// Caller-visible classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed call; fix the caller.
    Arg,
    /// Not enough output space; retry with more.
    Buffer,
    /// Malformed compressed data; fatal for the stream.
    Data,
    /// Underlying I/O failure.
    Io,
}

/// Result type alias for mscomp operations.
pub type Result<T> = std::result::Result<T, MsCompError>;

impl MsCompError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create a truncated stream error.
    pub fn truncated(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidArgument { .. } => ErrorKind::Arg,
            Self::BufferTooSmall { .. } => ErrorKind::Buffer,
            Self::CorruptedData { .. }
            | Self::InvalidDistance { .. }
            | Self::UnexpectedEof { .. } => ErrorKind::Data,
        }
    }

    /// True if the stream that produced this error cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Data | ErrorKind::Io)
    }
}
