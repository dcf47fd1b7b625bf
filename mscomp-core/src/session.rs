//! Caller-facing stream handle.
//!
//! A [`Session`] owns one [`FormatState`] and adds what every format shares:
//! call validation, cumulative byte totals and the last diagnostic message.
//!
//! ```rust
//! use mscomp_core::{Flush, Format, FormatState, Mode, Session, Status, StreamIo};
//! use mscomp_core::error::Result;
//!
//! /// Copies input straight through.
//! struct Passthrough;
//!
//! impl FormatState for Passthrough {
//!     fn step(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status> {
//!         let n = io.input_remaining().min(io.output_remaining());
//!         let data = io.take_input(n);
//!         io.write_output(data);
//!         if flush == Flush::Finish && io.input_remaining() == 0 {
//!             Ok(Status::StreamEnd)
//!         } else {
//!             Ok(Status::Ok)
//!         }
//!     }
//!
//!     fn finish(&mut self, _io: &mut StreamIo<'_>) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut session = Session::new(Mode::Compress, Format::None, Box::new(Passthrough));
//! let mut out = [0u8; 8];
//! let (consumed, produced, status) = session.process(b"abc", &mut out, Flush::Finish).unwrap();
//! assert_eq!((consumed, produced, status), (3, 3, Status::StreamEnd));
//! assert_eq!(session.total_out(), 3);
//! ```

use crate::error::{ErrorKind, MsCompError, Result};
use crate::format::{Format, Mode};
use crate::io::StreamIo;
use crate::traits::{Flush, FormatState, Status};
use tracing::{debug, warn};

/// Scratch size used by [`Session::process_all`].
const SCRATCH_SIZE: usize = 32768;

/// A compression or decompression stream.
pub struct Session {
    mode: Mode,
    format: Format,
    state: Option<Box<dyn FormatState>>,
    total_in: u64,
    total_out: u64,
    message: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("format", &self.format)
            .field("live", &self.state.is_some())
            .field("total_in", &self.total_in)
            .field("total_out", &self.total_out)
            .field("message", &self.message)
            .finish()
    }
}

impl Session {
    /// Start a session around an initialized format state.
    pub fn new(mode: Mode, format: Format, state: Box<dyn FormatState>) -> Self {
        debug!(%mode, %format, "stream started");
        Self {
            mode,
            format,
            state: Some(state),
            total_in: 0,
            total_out: 0,
            message: None,
        }
    }

    /// Direction of this stream.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Format of this stream.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Total input consumed over the life of the stream.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total output delivered over the life of the stream.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Text of the most recent error, if any.
    ///
    /// Advisory only. The text stays after later calls succeed, so a caller
    /// can still read why a retried call failed.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// True once [`end`](Self::end) has released the format state.
    pub fn is_ended(&self) -> bool {
        self.state.is_none()
    }

    /// Check that this is a live session of the given mode and format.
    pub fn expect(&self, mode: Mode, format: Format) -> Result<()> {
        if self.state.is_none() {
            return Err(MsCompError::invalid_argument("session has ended"));
        }
        if self.mode != mode {
            return Err(MsCompError::invalid_argument(format!(
                "{} session used to {}",
                self.mode, mode
            )));
        }
        if self.format != format {
            return Err(MsCompError::invalid_argument(format!(
                "{} session used as {}",
                self.format, format
            )));
        }
        Ok(())
    }

    /// Advance the stream within the given buffers.
    pub fn step(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status> {
        let Some(state) = self.state.as_mut() else {
            return Err(MsCompError::invalid_argument("session has ended"));
        };

        let (in_start, out_start) = (io.consumed(), io.produced());
        let result = state.step(io, flush);
        self.total_in += (io.consumed() - in_start) as u64;
        self.total_out += (io.produced() - out_start) as u64;

        if let Err(e) = &result {
            self.record(e);
        }
        result
    }

    /// Compress within the given buffers. Fails on a decompression session.
    pub fn deflate(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status> {
        self.expect(Mode::Compress, self.format)?;
        self.step(io, flush)
    }

    /// Decompress within the given buffers. Fails on a compression session.
    pub fn inflate(&mut self, io: &mut StreamIo<'_>) -> Result<Status> {
        self.expect(Mode::Decompress, self.format)?;
        self.step(io, Flush::None)
    }

    /// One call over plain slices, returning `(consumed, produced, status)`.
    pub fn process(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
    ) -> Result<(usize, usize, Status)> {
        let mut io = StreamIo::new(input, output);
        let status = self.step(&mut io, flush)?;
        Ok((io.consumed(), io.produced(), status))
    }

    /// Run the whole of `input` through the stream and end it.
    pub fn process_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len());
        let mut buffer = vec![0u8; SCRATCH_SIZE];
        let mut pos = 0;

        loop {
            let (consumed, produced, status) =
                self.process(&input[pos..], &mut buffer, Flush::Finish)?;
            pos += consumed;
            output.extend_from_slice(&buffer[..produced]);
            if status == Status::StreamEnd {
                break;
            }
        }

        self.end(&mut StreamIo::new(&[], &mut []))?;
        Ok(output)
    }

    /// End the stream and release its state.
    ///
    /// For compression this flushes everything still buffered. If `io` lacks
    /// the output space a buffer error is returned and the session stays
    /// live, so the call can be repeated with more room. Any other outcome
    /// releases the state; later calls fail with an argument error.
    pub fn end(&mut self, io: &mut StreamIo<'_>) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Err(MsCompError::invalid_argument("session has ended"));
        };

        let (in_start, out_start) = (io.consumed(), io.produced());
        let result = state.finish(io);
        self.total_in += (io.consumed() - in_start) as u64;
        self.total_out += (io.produced() - out_start) as u64;

        match result {
            Err(e) if e.kind() == ErrorKind::Buffer => {
                self.record(&e);
                Err(e)
            }
            other => {
                self.state = None;
                debug!(
                    mode = %self.mode,
                    format = %self.format,
                    total_in = self.total_in,
                    total_out = self.total_out,
                    "stream ended"
                );
                if let Err(e) = &other {
                    self.record(e);
                }
                other
            }
        }
    }

    fn record(&mut self, e: &MsCompError) {
        if e.is_fatal() {
            warn!(format = %self.format, total_in = self.total_in, error = %e, "stream failed");
        }
        self.message = Some(e.to_string());
    }
}
