//! The "none" format: bytes pass through unchanged in both directions.
//!
//! Nothing is staged, so this state works on the caller's buffers directly
//! instead of going through an engine.

use mscomp_core::error::{MsCompError, Result};
use mscomp_core::{Flush, FormatState, Mode, Status, StreamIo};

/// Pass-through format state.
#[derive(Debug)]
pub struct StoredState {
    mode: Mode,
    ended: bool,
}

impl StoredState {
    /// Create a pass-through state for either direction.
    pub fn new(mode: Mode) -> Self {
        Self { mode, ended: false }
    }
}

impl FormatState for StoredState {
    fn step(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status> {
        if self.ended {
            return Err(MsCompError::invalid_argument("stream has already ended"));
        }

        let n = io.input_remaining().min(io.output_remaining());
        let data = io.take_input(n);
        io.write_output(data);

        if io.input_remaining() == 0 {
            if flush == Flush::Finish {
                self.ended = true;
                return Ok(Status::StreamEnd);
            }
            if n == 0 && self.mode == Mode::Compress {
                return Ok(Status::NeedMoreInput);
            }
        } else if n == 0 {
            return Err(MsCompError::buffer_too_small(
                io.input_remaining(),
                io.output_remaining(),
            ));
        }
        Ok(Status::Ok)
    }

    fn finish(&mut self, _io: &mut StreamIo<'_>) -> Result<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_what_fits() {
        let mut state = StoredState::new(Mode::Compress);
        let mut out = [0u8; 4];
        let mut io = StreamIo::new(b"abcdef", &mut out);
        assert_eq!(state.step(&mut io, Flush::Finish).unwrap(), Status::Ok);
        assert_eq!(io.consumed(), 4);
        assert_eq!(io.written(), b"abcd");
    }

    #[test]
    fn test_stream_end_on_finish() {
        let mut state = StoredState::new(Mode::Decompress);
        let mut out = [0u8; 8];
        let mut io = StreamIo::new(b"ab", &mut out);
        assert_eq!(state.step(&mut io, Flush::Finish).unwrap(), Status::StreamEnd);

        let mut io = StreamIo::new(b"", &mut out);
        let err = state.step(&mut io, Flush::Finish).unwrap_err();
        assert_eq!(err.kind(), mscomp_core::ErrorKind::Arg);
    }

    #[test]
    fn test_idle_statuses() {
        let mut out = [0u8; 8];

        let mut state = StoredState::new(Mode::Compress);
        let mut io = StreamIo::new(b"", &mut out);
        assert_eq!(state.step(&mut io, Flush::None).unwrap(), Status::NeedMoreInput);

        let mut state = StoredState::new(Mode::Decompress);
        let mut io = StreamIo::new(b"", &mut out);
        assert_eq!(state.step(&mut io, Flush::None).unwrap(), Status::Ok);
    }

    #[test]
    fn test_no_output_space() {
        let mut state = StoredState::new(Mode::Compress);
        let mut io = StreamIo::new(b"abc", &mut []);
        let err = state.step(&mut io, Flush::None).unwrap_err();
        assert_eq!(err.kind(), mscomp_core::ErrorKind::Buffer);
        assert_eq!(io.consumed(), 0);
    }
}
