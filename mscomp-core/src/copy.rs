//! Overlap-aware back-reference expansion.
//!
//! An LZ77 back-reference `(distance, length)` copies `length` bytes starting
//! `distance` bytes behind the write position. When `distance < length` the
//! source overlaps the bytes being written, which reproduces a periodic
//! pattern (`distance == 1` is a run of one byte).
//!
//! # Fast path
//!
//! ```text
//!   dst-distance        dst               near_end        buf.len()
//!        │               │                    │               │
//!        ▼               ▼                    ▼               ▼
//!   ─────[history.......][pfx][pair][group][group]...[slow....]│
//!                         ≤3    8     16     16        exact
//! ```
//!
//! 1. For distances 1, 2 and 3 up to three prefix bytes are written so that
//!    the effective distance becomes 4, 4 or 6. Every later 4-byte word then
//!    reads only bytes that are already final.
//! 2. One 8-byte pair is written without a bound check. This is why entry
//!    requires [`FAST_COPY_ROOM`] bytes of room.
//! 3. Remaining bytes are written in 16-byte groups. Before each group the
//!    write cursor is compared with `near_end`; once reached, a byte-exact
//!    copy finishes the run.
//!
//! The fast path may write past the logical end of the run (never past the
//! end of `buf`). Those bytes are scratch until overwritten.

/// Room required after the destination for [`fast_copy`]: 3 prefix bytes
/// plus one unchecked 8-byte pair.
pub const FAST_COPY_ROOM: usize = 3 + PAIR;

/// Bytes per word copy.
pub const WORD: usize = 4;

/// Bytes written by the unchecked pair of words.
pub const PAIR: usize = 2 * WORD;

/// Bytes written per bound-checked group.
pub const GROUP: usize = 4 * WORD;

/// Which copy path finished a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    /// The whole run was written by the unrolled fast path.
    Fast,
    /// The run was finished (or entirely written) byte by byte.
    Slow,
}

/// Precomputed bounds of a destination buffer.
///
/// This is the single place where the fast/slow threshold is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyBounds {
    /// Total length of the destination buffer.
    pub end: usize,
    /// First write position at which a full [`GROUP`] no longer fits.
    pub near_end: usize,
}

impl CopyBounds {
    /// Compute the bounds of a buffer of `len` bytes.
    #[inline(always)]
    pub const fn new(len: usize) -> Self {
        Self {
            end: len,
            near_end: len.saturating_sub(GROUP - 1),
        }
    }

    /// True if a fast copy may start at `dst`.
    #[inline(always)]
    pub const fn fast_copy_fits(&self, dst: usize) -> bool {
        dst + FAST_COPY_ROOM <= self.end
    }

    /// True if a full group may be written at `at`.
    #[inline(always)]
    pub const fn group_fits(&self, at: usize) -> bool {
        at < self.near_end
    }
}

/// Expand a back-reference, picking the fast path when there is room.
///
/// Writes `buf[dst..dst + len]` so that each byte equals the byte `distance`
/// positions before it at the time it is written.
///
/// Callers validate `1 <= distance <= dst` and `dst + len <= buf.len()`.
#[inline]
pub fn expand_backreference(
    buf: &mut [u8],
    dst: usize,
    distance: usize,
    len: usize,
) -> CopyPath {
    if CopyBounds::new(buf.len()).fast_copy_fits(dst) {
        fast_copy(buf, dst, distance, len)
    } else {
        slow_copy(buf, dst, distance, len);
        CopyPath::Slow
    }
}

/// Unrolled overlapping copy. See the module documentation.
///
/// Requires `dst + FAST_COPY_ROOM <= buf.len()` in addition to the
/// [`expand_backreference`] preconditions.
pub fn fast_copy(buf: &mut [u8], dst: usize, distance: usize, len: usize) -> CopyPath {
    debug_assert!(distance >= 1 && distance <= dst);
    debug_assert!(dst + len <= buf.len());

    let bounds = CopyBounds::new(buf.len());
    debug_assert!(bounds.fast_copy_fits(dst));

    // Prefix bytes would run past a very short match.
    if len < 3 {
        slow_copy(buf, dst, distance, len);
        return CopyPath::Slow;
    }

    let end = dst + len;
    let (mut out, distance) = match distance {
        1 => {
            let b = buf[dst - 1];
            buf[dst..dst + 3].fill(b);
            (dst + 3, 4)
        }
        2 => {
            buf.copy_within(dst - 2..dst, dst);
            (dst + 2, 4)
        }
        3 => {
            buf.copy_within(dst - 3..dst, dst);
            (dst + 3, 6)
        }
        d => (dst, d),
    };

    if out >= end {
        return CopyPath::Fast;
    }

    copy_word(buf, out, distance);
    copy_word(buf, out + WORD, distance);
    out += PAIR;

    while out < end {
        if !bounds.group_fits(out) {
            slow_copy(buf, out, distance, end - out);
            return CopyPath::Slow;
        }
        copy_word(buf, out, distance);
        copy_word(buf, out + WORD, distance);
        copy_word(buf, out + 2 * WORD, distance);
        copy_word(buf, out + 3 * WORD, distance);
        out += GROUP;
    }

    CopyPath::Fast
}

/// Byte-exact overlapping copy. Never writes past `dst + len`.
#[inline]
pub fn slow_copy(buf: &mut [u8], dst: usize, distance: usize, len: usize) {
    debug_assert!(distance >= 1 && distance <= dst);
    // Each step copies at most one period, so the source is always final.
    let mut done = 0;
    while done < len {
        let n = distance.min(len - done);
        let src = dst - distance + done;
        buf.copy_within(src..src + n, dst + done);
        done += n;
    }
}

#[inline(always)]
fn copy_word(buf: &mut [u8], at: usize, distance: usize) {
    debug_assert!(distance >= WORD);
    buf.copy_within(at - distance..at - distance + WORD, at);
}
