//! Generic streaming engine.
//!
//! [`Engine`] wraps any [`Codec`] with the streaming buffer protocol so that
//! formats never see partial units or the caller's buffers:
//!
//! ```text
//!            ┌──────────── step(io, flush) ─────────────┐
//!            ▼                                           │
//!   drain output stage ──partial──► return Ok            │
//!            │ complete                                  │
//!   deferred output? ──yes──► codec.resume ──────────────┤
//!            │ no                                        │
//!   next_unit() == None ──► drain the rest, StreamEnd    │
//!            │ Some(n)                                   │
//!   input stage fill(n) ──complete──► codec.feed ────────┘
//!            │ incomplete
//!   Finish? ──yes──► codec.flush(tail), drain, StreamEnd
//!            │ no
//!   return Ok / NeedMoreInput
//! ```
//!
//! Staged output is always delivered before any further input is consumed,
//! so memory stays bounded by the two stages no matter how the caller splits
//! its buffers.

use crate::error::{MsCompError, Result};
use crate::format::Mode;
use crate::io::StreamIo;
use crate::stage::{Drain, InputStage, OutputStage};
use crate::traits::{Codec, Flush, FormatState, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Draining,
    Ended,
    Failed,
}

/// Streaming driver for a [`Codec`].
#[derive(Debug)]
pub struct Engine<C> {
    mode: Mode,
    codec: C,
    input: InputStage,
    output: OutputStage,
    phase: Phase,
}

impl<C: Codec> Engine<C> {
    /// Create an engine with preallocated stages.
    pub fn new(mode: Mode, codec: C, input: InputStage, output: OutputStage) -> Self {
        Self {
            mode,
            codec,
            input,
            output,
            phase: Phase::Running,
        }
    }

    /// Direction of this stream.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The wrapped codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// True once `StreamEnd` has been reported.
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// True once a data error has been reported.
    pub fn is_failed(&self) -> bool {
        self.phase == Phase::Failed
    }

    /// Bytes staged for output but not yet delivered.
    pub fn pending_output(&self) -> usize {
        self.output.undelivered()
    }

    /// Run the stream as far as the given buffers allow.
    pub fn step(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status> {
        match self.phase {
            Phase::Ended => {
                return Err(MsCompError::invalid_argument("stream has already ended"));
            }
            Phase::Failed => {
                return Err(MsCompError::invalid_argument(
                    "stream failed on corrupted data",
                ));
            }
            Phase::Running | Phase::Draining => {}
        }

        let result = self.run(io, flush);
        if let Err(e) = &result {
            if e.is_fatal() {
                self.phase = Phase::Failed;
            }
        }
        result
    }

    /// Complete the stream, delivering everything still staged.
    pub fn finish(&mut self, io: &mut StreamIo<'_>) -> Result<()> {
        if matches!(self.phase, Phase::Ended | Phase::Failed) {
            return Ok(());
        }
        match self.step(io, Flush::Finish)? {
            Status::StreamEnd => Ok(()),
            Status::Ok | Status::NeedMoreInput => Err(MsCompError::buffer_too_small(
                self.output.undelivered(),
                io.output_remaining(),
            )),
        }
    }

    fn run(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status> {
        let (in_start, out_start) = (io.consumed(), io.produced());

        loop {
            if self.output.drain(io) == Drain::Partial {
                if io.consumed() == in_start && io.produced() == out_start {
                    return Err(MsCompError::buffer_too_small(
                        self.output.undelivered(),
                        io.output_remaining(),
                    ));
                }
                return Ok(Status::Ok);
            }

            if self.phase == Phase::Draining {
                debug_assert!(self.output.is_drained(), "hold left after flush");
                self.phase = Phase::Ended;
                return Ok(Status::StreamEnd);
            }

            if self.codec.has_deferred() {
                self.codec.resume(&mut self.output)?;
                continue;
            }

            let Some(n) = self.codec.next_unit() else {
                self.phase = Phase::Draining;
                continue;
            };

            match self.input.fill(io, n)? {
                Some(unit) => {
                    self.codec.feed(unit, &mut self.output)?;
                    self.input.complete();
                }
                None if flush == Flush::Finish => {
                    self.codec.flush(self.input.pending(), &mut self.output)?;
                    self.input.complete();
                    self.phase = Phase::Draining;
                }
                None => {
                    let idle = io.produced() == out_start;
                    return Ok(if self.mode == Mode::Compress && idle {
                        Status::NeedMoreInput
                    } else {
                        Status::Ok
                    });
                }
            }
        }
    }
}

impl<C: Codec + Send> FormatState for Engine<C> {
    fn step(&mut self, io: &mut StreamIo<'_>, flush: Flush) -> Result<Status> {
        Engine::step(self, io, flush)
    }

    fn finish(&mut self, io: &mut StreamIo<'_>) -> Result<()> {
        Engine::finish(self, io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Units are `[count, byte]` pairs; a zero count ends the stream and
    /// 0xFF is reserved.
    #[derive(Debug, Default)]
    struct RunDecoder {
        ended: bool,
        deferred: usize,
        offset: u64,
    }

    impl Codec for RunDecoder {
        fn next_unit(&self) -> Option<usize> {
            if self.ended { None } else { Some(2) }
        }

        fn feed(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()> {
            let (count, byte) = (unit[0] as usize, unit[1]);
            self.offset += 2;
            match count {
                0 => self.ended = true,
                0xFF => return Err(MsCompError::corrupted(self.offset - 2, "reserved count")),
                _ => {
                    out.reserve(1)?;
                    out.push(byte);
                    self.deferred = count - 1;
                    self.resume(out)?;
                }
            }
            Ok(())
        }

        fn has_deferred(&self) -> bool {
            self.deferred > 0
        }

        fn resume(&mut self, out: &mut OutputStage) -> Result<()> {
            let n = out.copy_match(1, self.deferred)?;
            self.deferred -= n;
            Ok(())
        }

        fn flush(&mut self, tail: &[u8], _out: &mut OutputStage) -> Result<()> {
            if tail.is_empty() {
                Ok(())
            } else {
                Err(MsCompError::truncated(2 - tail.len()))
            }
        }
    }

    /// Upper-cases 4-byte units and appends `!` at the end.
    #[derive(Debug, Default)]
    struct ShoutEncoder;

    impl Codec for ShoutEncoder {
        fn next_unit(&self) -> Option<usize> {
            Some(4)
        }

        fn feed(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()> {
            out.reserve(unit.len())?;
            out.extend(&unit.to_ascii_uppercase());
            Ok(())
        }

        fn flush(&mut self, tail: &[u8], out: &mut OutputStage) -> Result<()> {
            out.reserve(tail.len() + 1)?;
            out.extend(&tail.to_ascii_uppercase());
            out.push(b'!');
            Ok(())
        }
    }

    fn decoder() -> Engine<RunDecoder> {
        Engine::new(
            Mode::Decompress,
            RunDecoder::default(),
            InputStage::new(2),
            OutputStage::new(1, 8),
        )
    }

    fn encoder() -> Engine<ShoutEncoder> {
        Engine::new(
            Mode::Compress,
            ShoutEncoder,
            InputStage::new(4),
            OutputStage::new(0, 16),
        )
    }

    fn drive<C: Codec>(
        engine: &mut Engine<C>,
        input: &[u8],
        in_chunk: usize,
        out_chunk: usize,
    ) -> Vec<u8> {
        let mut result = Vec::new();
        let mut out = vec![0u8; out_chunk];
        let mut pos = 0;
        loop {
            let end = (pos + in_chunk).min(input.len());
            let flush = if end == input.len() {
                Flush::Finish
            } else {
                Flush::None
            };
            let mut io = StreamIo::new(&input[pos..end], &mut out);
            let status = engine.step(&mut io, flush).unwrap();
            let (consumed, produced) = (io.consumed(), io.produced());
            pos += consumed;
            result.extend_from_slice(&out[..produced]);
            if status == Status::StreamEnd {
                return result;
            }
        }
    }

    #[test]
    fn test_ten_ten_five() {
        let mut engine = Engine::new(
            Mode::Decompress,
            RunDecoder::default(),
            InputStage::new(2),
            OutputStage::new(1, 32),
        );
        let input = [25, b'z', 0, 0];
        let mut out = [0u8; 10];
        let mut total = 0;
        let mut pos = 0;
        // (produced, status, total out, total in) after each call; the end
        // marker is only read once the run is fully delivered.
        let expected = [
            (10, Status::Ok, 10, 2),
            (10, Status::Ok, 20, 2),
            (5, Status::StreamEnd, 25, 4),
        ];

        for (produced, status, total_out, total_in) in expected {
            let mut io = StreamIo::new(&input[pos..], &mut out);
            assert_eq!(engine.step(&mut io, Flush::None).unwrap(), status);
            assert_eq!(io.produced(), produced);
            pos += io.consumed();
            total += produced;
            assert_eq!((total, pos), (total_out, total_in));
        }
    }

    #[test]
    fn test_chunk_invariance() {
        let input = [3, b'a', 1, b'b', 40, b'c', 2, b'd', 0, 0];
        let mut reference = Vec::new();
        reference.extend_from_slice(b"aaab");
        reference.extend(std::iter::repeat_n(b'c', 40));
        reference.extend_from_slice(b"dd");

        for in_chunk in 1..=input.len() {
            for out_chunk in [1, 2, 3, 7, 64] {
                let got = drive(&mut decoder(), &input, in_chunk, out_chunk);
                assert_eq!(got, reference, "in {} out {}", in_chunk, out_chunk);
            }
        }
    }

    #[test]
    fn test_long_run_is_deferred_across_calls() {
        let mut engine = decoder();
        let got = drive(&mut engine, &[200, b'q', 0, 0], 4, 5);
        assert_eq!(got, vec![b'q'; 200]);
        assert!(engine.is_ended());
    }

    #[test]
    fn test_data_error_is_fatal() {
        let mut engine = decoder();
        let mut out = [0u8; 16];
        let mut io = StreamIo::new(&[2, b'a', 0xFF, 0], &mut out);
        let err = engine.step(&mut io, Flush::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(engine.is_failed());

        let mut io = StreamIo::new(&[0, 0], &mut out);
        let err = engine.step(&mut io, Flush::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arg);
        assert_eq!(io.consumed(), 0);
    }

    #[test]
    fn test_step_after_end_is_arg_error() {
        let mut engine = decoder();
        let mut out = [0u8; 16];
        let mut io = StreamIo::new(&[1, b'x', 0, 0], &mut out);
        assert_eq!(engine.step(&mut io, Flush::None).unwrap(), Status::StreamEnd);

        let mut io = StreamIo::new(&[1, b'x'], &mut out);
        let err = engine.step(&mut io, Flush::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arg);
        assert!(engine.finish(&mut io).is_ok());
    }

    #[test]
    fn test_truncated_input_on_finish() {
        let mut engine = decoder();
        let mut out = [0u8; 16];
        let mut io = StreamIo::new(&[3, b'a', 4], &mut out);
        let err = engine.step(&mut io, Flush::Finish).unwrap_err();
        assert!(matches!(err, MsCompError::UnexpectedEof { expected: 1 }));
    }

    #[test]
    fn test_no_output_space_is_buffer_error() {
        let mut engine = decoder();
        let mut out = [0u8; 4];
        let mut io = StreamIo::new(&[6, b'a'], &mut out);
        assert_eq!(engine.step(&mut io, Flush::None).unwrap(), Status::Ok);

        let mut none = [0u8; 0];
        let mut io = StreamIo::new(&[0, 0], &mut none);
        let err = engine.step(&mut io, Flush::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Buffer);
        assert_eq!(io.consumed(), 0);

        // Nothing was lost.
        let mut io = StreamIo::new(&[0, 0], &mut out);
        assert_eq!(engine.step(&mut io, Flush::None).unwrap(), Status::StreamEnd);
        assert_eq!(io.written(), b"aa");
    }

    #[test]
    fn test_encoder_needs_more_input() {
        let mut engine = encoder();
        let mut out = [0u8; 16];

        let mut io = StreamIo::new(b"ab", &mut out);
        assert_eq!(
            engine.step(&mut io, Flush::None).unwrap(),
            Status::NeedMoreInput
        );
        assert_eq!(io.consumed(), 2);

        let mut io = StreamIo::new(b"cdef", &mut out);
        assert_eq!(engine.step(&mut io, Flush::None).unwrap(), Status::Ok);
        assert_eq!(io.written(), b"ABCD");

        let mut io = StreamIo::new(b"", &mut out);
        assert_eq!(engine.step(&mut io, Flush::Finish).unwrap(), Status::StreamEnd);
        assert_eq!(io.written(), b"EF!");
    }

    #[test]
    fn test_finish_without_room_keeps_state() {
        let mut engine = encoder();
        let mut out = [0u8; 16];
        let mut io = StreamIo::new(b"xyz", &mut out);
        engine.step(&mut io, Flush::None).unwrap();

        let mut tiny = [0u8; 1];
        let mut io = StreamIo::new(b"", &mut tiny);
        let err = engine.finish(&mut io).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Buffer);
        assert_eq!(&tiny, b"X");

        let mut io = StreamIo::new(b"", &mut out);
        engine.finish(&mut io).unwrap();
        assert_eq!(io.written(), b"YZ!");
        assert!(engine.is_ended());
    }
}
