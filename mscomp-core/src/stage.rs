//! Staging buffers for the streaming buffer protocol.
//!
//! - [`InputStage`] implements *append-in*: a format asks for an indivisible
//!   unit of `n` bytes and either gets it in one piece or the engine suspends
//!   until later calls have supplied the rest.
//! - [`OutputStage`] implements *dump-out*: a format writes decoded bytes (and
//!   back-references into them) here, and [`OutputStage::drain`] moves as
//!   much as fits into the caller's output, keeping the rest for later.
//!
//! Both are allocated once when a stream starts and never grow.

use crate::copy::{FAST_COPY_ROOM, GROUP, expand_backreference};
use crate::error::{MsCompError, Result};
use crate::io::StreamIo;
use tracing::trace;

// ============================================================================
// Input staging
// ============================================================================

/// Accumulates a partially received input unit across calls.
///
/// Invariant: `staged + needed == unit <= capacity` while a unit is in
/// progress.
#[derive(Debug)]
pub struct InputStage {
    buf: Box<[u8]>,
    len: usize,
    unit: usize,
}

impl InputStage {
    /// Create a stage that can hold units of up to `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
            unit: 0,
        }
    }

    /// Largest unit this stage can assemble.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes of the current unit already staged.
    pub fn staged(&self) -> usize {
        self.len
    }

    /// Bytes still missing from the current unit.
    pub fn needed(&self) -> usize {
        self.unit - self.len
    }

    /// The staged bytes of an incomplete unit.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Try to obtain a complete unit of `n` bytes.
    ///
    /// When nothing is staged and the caller's input already holds `n` bytes,
    /// the unit is borrowed straight from the input. Otherwise the available
    /// bytes are appended to the stage and `None` is returned until the unit
    /// is complete. Call [`complete`](Self::complete) after the unit has been
    /// processed.
    pub fn fill<'s, 'a: 's>(
        &'s mut self,
        io: &mut StreamIo<'a>,
        n: usize,
    ) -> Result<Option<&'s [u8]>> {
        if n > self.buf.len() {
            return Err(MsCompError::invalid_argument(format!(
                "unit of {} bytes exceeds input stage capacity {}",
                n,
                self.buf.len()
            )));
        }

        if self.len == 0 && io.input_remaining() >= n {
            return Ok(Some(io.take_input(n)));
        }

        debug_assert!(self.len == 0 || self.unit == n, "unit size changed mid-fill");
        self.unit = n;

        let chunk = io.take_input(n - self.len);
        self.buf[self.len..self.len + chunk.len()].copy_from_slice(chunk);
        self.len += chunk.len();

        if self.len == n {
            Ok(Some(&self.buf[..n]))
        } else {
            Ok(None)
        }
    }

    /// Mark the current unit as processed.
    pub fn complete(&mut self) {
        self.len = 0;
        self.unit = 0;
    }
}

// ============================================================================
// Output staging
// ============================================================================

/// Result of draining the output stage into the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Every deliverable byte has been delivered.
    Complete,
    /// The caller's output filled up; bytes remain staged.
    Partial,
}

/// Window-preserving output buffer with deferred delivery.
///
/// ```text
/// 0          history_start   deliver_from          hold        pos     limit
/// │ (evictable)   │  window     │  undelivered      │  held    │  room │
/// ```
///
/// Back-references resolve against `[history_start, pos)`. Bytes at and after
/// the hold are not delivered, so encoders can patch placeholders (flag words,
/// shared length bytes) after writing past them.
#[derive(Debug)]
pub struct OutputStage {
    buf: Box<[u8]>,
    limit: usize,
    window: usize,
    pos: usize,
    history_start: usize,
    deliver_from: usize,
    base: u64,
    hold: Option<u64>,
}

impl OutputStage {
    /// Create a stage keeping `window` bytes of history plus `working` bytes
    /// of fresh output.
    pub fn new(window: usize, working: usize) -> Self {
        let limit = window + working;
        Self {
            buf: vec![0u8; limit + FAST_COPY_ROOM + GROUP].into_boxed_slice(),
            limit,
            window,
            pos: 0,
            history_start: 0,
            deliver_from: 0,
            base: 0,
            hold: None,
        }
    }

    /// Total bytes written since the stream started.
    #[inline]
    pub fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Bytes written since the last [`restart`](Self::restart) that are still
    /// in the buffer.
    #[inline]
    pub fn history(&self) -> usize {
        self.pos - self.history_start
    }

    /// Largest distance a back-reference may use right now.
    ///
    /// Limited to the window when one is configured, since a compaction may
    /// evict anything older. A stage without a window keeps its history only
    /// until the next compaction.
    #[inline]
    pub fn reach(&self) -> usize {
        if self.window > 0 {
            self.history().min(self.window)
        } else {
            self.history()
        }
    }

    /// Free space before a compaction.
    #[inline]
    pub fn room(&self) -> usize {
        self.limit - self.pos
    }

    /// Bytes written but not yet delivered, held bytes included.
    #[inline]
    pub fn undelivered(&self) -> usize {
        self.pos - self.deliver_from
    }

    /// True if nothing is waiting for delivery.
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.deliver_from == self.pos
    }

    /// Current hold position, if any.
    pub fn hold(&self) -> Option<u64> {
        self.hold
    }

    /// Stop delivery at absolute offset `hold` (or lift the hold).
    pub fn set_hold(&mut self, hold: Option<u64>) {
        debug_assert!(hold.is_none_or(|h| h >= self.base + self.deliver_from as u64));
        self.hold = hold;
    }

    /// Forget all history; later back-references may only reach bytes
    /// written after this call.
    pub fn restart(&mut self) {
        self.history_start = self.pos;
    }

    /// Make sure `n` bytes can be written, compacting if necessary.
    pub fn reserve(&mut self, n: usize) -> Result<()> {
        if self.room() < n {
            self.compact();
        }
        if self.room() < n {
            return Err(MsCompError::buffer_too_small(n, self.room()));
        }
        Ok(())
    }

    /// Append one byte. Space must have been reserved.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        debug_assert!(self.pos < self.limit);
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    /// Append bytes. Space must have been reserved.
    #[inline]
    pub fn extend(&mut self, data: &[u8]) {
        debug_assert!(self.pos + data.len() <= self.limit);
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
    }

    /// Expand a back-reference, copying as much as fits.
    ///
    /// Returns the number of bytes copied, which is less than `len` only when
    /// the stage is full of undelivered output. The caller resumes the rest
    /// after a drain.
    pub fn copy_match(&mut self, distance: usize, len: usize) -> Result<usize> {
        if self.room() < len {
            self.compact();
        }
        if distance == 0 || distance > self.reach() {
            return Err(MsCompError::invalid_distance(distance, self.reach()));
        }
        let n = len.min(self.room());
        if n > 0 {
            expand_backreference(&mut self.buf, self.pos, distance, n);
            self.pos += n;
        }
        Ok(n)
    }

    /// Overwrite a held byte at absolute offset `at`.
    pub fn patch_byte(&mut self, at: u64, value: u8) {
        let i = self.index_of(at);
        self.buf[i] = value;
    }

    /// Overwrite a held little-endian `u32` at absolute offset `at`.
    pub fn patch_u32(&mut self, at: u64, value: u32) {
        let i = self.index_of(at);
        crate::bits::write_u32_le(&mut self.buf, i, value);
    }

    /// Deliver staged bytes up to the hold into the caller's output.
    pub fn drain(&mut self, io: &mut StreamIo<'_>) -> Drain {
        let end = self.deliverable_end();
        if self.deliver_from < end {
            self.deliver_from += io.write_output(&self.buf[self.deliver_from..end]);
        }
        if self.deliver_from == end {
            Drain::Complete
        } else {
            Drain::Partial
        }
    }

    fn deliverable_end(&self) -> usize {
        match self.hold {
            Some(h) => (h.saturating_sub(self.base) as usize).min(self.pos),
            None => self.pos,
        }
    }

    fn index_of(&self, at: u64) -> usize {
        debug_assert!(at >= self.base + self.deliver_from as u64 && at < self.position());
        (at - self.base) as usize
    }

    /// Move live bytes to the front of the buffer.
    fn compact(&mut self) {
        let keep = self
            .pos
            .saturating_sub(self.window)
            .max(self.history_start)
            .min(self.deliver_from)
            .min(self.deliverable_end());
        if keep == 0 {
            return;
        }

        trace!(
            evicted = keep,
            live = self.pos - keep,
            "compacting output stage"
        );
        self.buf.copy_within(keep..self.pos, 0);
        self.pos -= keep;
        self.deliver_from -= keep;
        self.history_start = self.history_start.saturating_sub(keep);
        self.base += keep as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_direct_from_input() {
        let mut stage = InputStage::new(8);
        let input = [1u8, 2, 3, 4, 5];
        let mut out = [0u8; 0];
        let mut io = StreamIo::new(&input, &mut out);

        let unit = stage.fill(&mut io, 4).unwrap().map(<[u8]>::to_vec);
        assert_eq!(unit, Some(vec![1, 2, 3, 4]));
        stage.complete();
        assert_eq!(stage.staged(), 0);
        assert_eq!(io.input_remaining(), 1);
    }

    #[test]
    fn test_fill_accumulates_across_calls() {
        let mut stage = InputStage::new(8);
        let mut out = [0u8; 0];

        let mut io = StreamIo::new(&[1, 2], &mut out);
        assert!(stage.fill(&mut io, 5).unwrap().is_none());
        assert_eq!((stage.staged(), stage.needed()), (2, 3));
        assert_eq!(io.input_remaining(), 0);

        let mut io = StreamIo::new(&[3], &mut out);
        assert!(stage.fill(&mut io, 5).unwrap().is_none());
        assert_eq!(stage.pending(), &[1, 2, 3]);

        let mut io = StreamIo::new(&[4, 5, 6, 7], &mut out);
        let unit = stage.fill(&mut io, 5).unwrap().map(<[u8]>::to_vec);
        assert_eq!(unit, Some(vec![1, 2, 3, 4, 5]));
        assert_eq!(io.input_remaining(), 2);
        stage.complete();
        assert!(stage.pending().is_empty());
    }

    #[test]
    fn test_fill_rejects_oversized_unit() {
        let mut stage = InputStage::new(2);
        let mut out = [0u8; 0];
        let mut io = StreamIo::new(&[0; 4], &mut out);
        assert!(stage.fill(&mut io, 3).is_err());
        assert_eq!(io.consumed(), 0);
    }

    #[test]
    fn test_drain_partial_and_resume() {
        let mut stage = OutputStage::new(0, 16);
        stage.reserve(5).unwrap();
        stage.extend(b"hello");

        let mut small = [0u8; 2];
        let mut io = StreamIo::new(&[], &mut small);
        assert_eq!(stage.drain(&mut io), Drain::Partial);
        assert_eq!(&small, b"he");
        assert_eq!(stage.undelivered(), 3);

        let mut rest = [0u8; 8];
        let mut io = StreamIo::new(&[], &mut rest);
        assert_eq!(stage.drain(&mut io), Drain::Complete);
        assert_eq!(io.written(), b"llo");
        assert!(stage.is_drained());
    }

    #[test]
    fn test_copy_match_validates_distance() {
        let mut stage = OutputStage::new(8, 8);
        assert!(stage.copy_match(1, 3).is_err());

        stage.reserve(1).unwrap();
        stage.push(b'A');
        assert!(matches!(
            stage.copy_match(2, 3),
            Err(MsCompError::InvalidDistance { distance: 2, history_size: 1 })
        ));
        assert!(stage.copy_match(0, 3).is_err());
        assert_eq!(stage.copy_match(1, 3).unwrap(), 3);

        let mut out = [0u8; 8];
        let mut io = StreamIo::new(&[], &mut out);
        stage.drain(&mut io);
        assert_eq!(io.written(), b"AAAA");
    }

    #[test]
    fn test_window_survives_compaction() {
        let mut stage = OutputStage::new(4, 4);
        let mut sink = [0u8; 64];

        stage.reserve(4).unwrap();
        stage.extend(b"abcd");
        let mut io = StreamIo::new(&[], &mut sink);
        stage.drain(&mut io);

        // Full: the next reserve must evict delivered bytes beyond the window.
        stage.reserve(4).unwrap();
        stage.extend(b"efgh");
        let mut io = StreamIo::new(&[], &mut sink);
        stage.drain(&mut io);

        stage.reserve(4).unwrap();
        assert_eq!(stage.history(), 4);
        assert_eq!(stage.copy_match(4, 4).unwrap(), 4);
        assert_eq!(stage.position(), 12);

        let mut io = StreamIo::new(&[], &mut sink);
        stage.drain(&mut io);
        assert_eq!(io.written(), b"efgh");
    }

    #[test]
    fn test_copy_match_rejects_distance_beyond_window() {
        let mut stage = OutputStage::new(4, 4);
        let mut sink = [0u8; 16];
        stage.reserve(8).unwrap();
        stage.extend(b"abcdefgh");
        let mut io = StreamIo::new(&[], &mut sink);
        assert_eq!(stage.drain(&mut io), Drain::Complete);

        // The stage is full, so this copy compacts away everything but the
        // last four bytes first.
        assert!(matches!(
            stage.copy_match(6, 2),
            Err(MsCompError::InvalidDistance { distance: 6, history_size: 4 })
        ));
        assert_eq!(stage.copy_match(4, 2).unwrap(), 2);

        let mut io = StreamIo::new(&[], &mut sink);
        stage.drain(&mut io);
        assert_eq!(io.written(), b"ef");
    }

    #[test]
    fn test_window_caps_reach_without_compaction() {
        let mut stage = OutputStage::new(4, 16);
        stage.reserve(8).unwrap();
        stage.extend(b"abcdefgh");
        assert_eq!(stage.history(), 8);
        assert_eq!(stage.reach(), 4);
        assert!(matches!(
            stage.copy_match(5, 1),
            Err(MsCompError::InvalidDistance { distance: 5, history_size: 4 })
        ));
    }

    #[test]
    fn test_copy_match_is_limited_by_undelivered_output() {
        let mut stage = OutputStage::new(2, 6);
        stage.reserve(2).unwrap();
        stage.extend(b"xy");

        // Nothing delivered yet, so nothing can be evicted.
        assert_eq!(stage.copy_match(2, 10).unwrap(), 6);
        assert_eq!(stage.copy_match(2, 4).unwrap(), 0);

        let mut out = [0u8; 8];
        let mut io = StreamIo::new(&[], &mut out);
        assert_eq!(stage.drain(&mut io), Drain::Complete);
        assert_eq!(io.written(), b"xyxyxyxy");
        assert_eq!(stage.copy_match(2, 4).unwrap(), 4);
    }

    #[test]
    fn test_hold_blocks_delivery_until_patched() {
        let mut stage = OutputStage::new(0, 32);
        stage.reserve(8).unwrap();
        let placeholder = stage.position();
        stage.extend(&[0, 0, 0, 0]);
        stage.set_hold(Some(placeholder));
        stage.extend(b"data");

        let mut out = [0u8; 16];
        let mut io = StreamIo::new(&[], &mut out);
        assert_eq!(stage.drain(&mut io), Drain::Complete);
        assert_eq!(io.produced(), 0);

        stage.patch_u32(placeholder, 0x1FFF_FFFF);
        stage.set_hold(None);
        let mut io = StreamIo::new(&[], &mut out);
        stage.drain(&mut io);
        assert_eq!(io.written(), &[0xFF, 0xFF, 0xFF, 0x1F, b'd', b'a', b't', b'a']);
    }

    #[test]
    fn test_restart_forgets_history() {
        let mut stage = OutputStage::new(0, 16);
        stage.reserve(3).unwrap();
        stage.extend(b"abc");
        stage.restart();
        assert_eq!(stage.history(), 0);
        assert!(stage.copy_match(1, 3).is_err());
    }

    #[test]
    fn test_reserve_fails_when_all_output_is_pending() {
        let mut stage = OutputStage::new(0, 4);
        stage.reserve(4).unwrap();
        stage.extend(b"full");
        assert!(matches!(
            stage.reserve(1),
            Err(MsCompError::BufferTooSmall { needed: 1, available: 0 })
        ));
    }
}
