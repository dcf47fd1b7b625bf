//! Streaming plain Xpress encoder.
//!
//! Input is taken in [`BLOCK_SIZE`] units appended to a history buffer that
//! keeps the previous [`WINDOW_SIZE`] bytes, so matches reach back across
//! unit boundaries but never past the end of the current unit.
//!
//! Two kinds of output bytes are written before their final value is known:
//! the flag word covering the next 32 items, and a shared length nibble
//! waiting for its high half. The output stage holds delivery at the oldest
//! of them. A nibble left open for more than [`HOLD_LIMIT`] output bytes is
//! closed with a high half of zero, which forces the next long match to a
//! length of exactly 10, so the held region stays bounded.

use crate::token::{
    BYTE_ESCAPE, FLAG_BITS, FLAG_WORD_SIZE, LOW_ESCAPE, MIN_MATCH, NIBBLE_ESCAPE, NIBBLE_MATCH,
    WINDOW_SIZE, pack_match_word, pad_flags,
};
use mscomp_core::error::Result;
use mscomp_core::{Codec, CompressionLevel, Match, MatchFinder, OutputStage};
use tracing::debug;

/// Input unit size.
pub const BLOCK_SIZE: usize = 16 * 1024;

/// Output bytes an open nibble may hold back before it is closed.
pub const HOLD_LIMIT: u64 = 16 * 1024;

const HASH_BITS: u32 = 15;

/// History buffer size: one window behind the current block.
const HISTORY_SIZE: usize = WINDOW_SIZE + BLOCK_SIZE;

/// Worst case output for one block: every byte a literal, plus flag words.
const BLOCK_RESERVE: usize = BLOCK_SIZE + BLOCK_SIZE / 8 + 2 * FLAG_WORD_SIZE;

/// Output stage working size for the encoder.
pub(crate) const OUTPUT_WORKING: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nibble {
    /// No half-used nibble byte.
    Empty,
    /// Low half written at `at`; the next long match fills the high half.
    Open { at: u64, low: u8 },
    /// Written with a high half of zero; the next long match must use it.
    Closed,
}

/// Plain Xpress encoder state.
#[derive(Debug)]
pub struct XpressEncoder {
    finder: MatchFinder,
    history: Vec<u8>,
    hashed: usize,
    flags: u32,
    flag_count: u32,
    flag_at: Option<u64>,
    nibble: Nibble,
    literals: u64,
    matches: u64,
}

impl XpressEncoder {
    /// Create an encoder with the given compression level.
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            finder: MatchFinder::new(HISTORY_SIZE, HASH_BITS, level),
            history: Vec::with_capacity(HISTORY_SIZE),
            hashed: 0,
            flags: 0,
            flag_count: 0,
            flag_at: None,
            nibble: Nibble::Empty,
            literals: 0,
            matches: 0,
        }
    }

    /// Literals and matches emitted so far.
    pub fn item_counts(&self) -> (u64, u64) {
        (self.literals, self.matches)
    }

    fn encode(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()> {
        out.reserve(BLOCK_RESERVE)?;
        if self.flag_at.is_none() {
            self.open_flag_word(out);
        }

        if self.history.len() + unit.len() > HISTORY_SIZE {
            let amount = self.history.len() - WINDOW_SIZE;
            self.history.drain(..amount);
            self.finder.slide(amount);
            self.hashed = self.hashed.saturating_sub(amount);
        }
        let mut pos = self.history.len();
        self.history.extend_from_slice(unit);

        while pos < self.history.len() {
            match self.best_match(pos) {
                Some(mut m) => {
                    if self.nibble == Nibble::Closed && m.length > NIBBLE_MATCH {
                        m.length = NIBBLE_MATCH;
                    }
                    self.put_match(m, out);
                    pos += m.length;
                }
                None => {
                    out.push(self.history[pos]);
                    self.literals += 1;
                    self.add_flag(0, out);
                    pos += 1;
                }
            }

            if let Nibble::Open { at, .. } = self.nibble {
                if out.position() - at > HOLD_LIMIT {
                    self.nibble = Nibble::Closed;
                }
            }
        }

        self.update_hold(out);
        Ok(())
    }

    fn best_match(&mut self, pos: usize) -> Option<Match> {
        if self.hashed < pos {
            self.finder.insert_range(&self.history, self.hashed, pos);
            self.hashed = pos;
        }
        let found = self
            .finder
            .find(&self.history, pos, usize::MAX, WINDOW_SIZE)?;

        if self.finder.params().lazy && pos + 1 < self.history.len() {
            self.finder.insert(&self.history, pos);
            self.hashed = pos + 1;
            let next = self
                .finder
                .find(&self.history, pos + 1, usize::MAX, WINDOW_SIZE);
            if next.is_some_and(|n| n.length > found.length + 1) {
                return None;
            }
        }
        Some(found)
    }

    fn put_match(&mut self, m: Match, out: &mut OutputStage) {
        let short = m.length - MIN_MATCH;
        if short < LOW_ESCAPE as usize {
            out.extend(&pack_match_word(m.distance, short as u16).to_le_bytes());
        } else {
            out.extend(&pack_match_word(m.distance, LOW_ESCAPE).to_le_bytes());

            let rest = m.length - NIBBLE_MATCH;
            let nibble = rest.min(NIBBLE_ESCAPE as usize) as u8;
            self.nibble = match self.nibble {
                Nibble::Empty => {
                    let at = out.position();
                    out.push(nibble);
                    Nibble::Open { at, low: nibble }
                }
                Nibble::Open { at, low } => {
                    out.patch_byte(at, low | (nibble << 4));
                    Nibble::Empty
                }
                Nibble::Closed => {
                    debug_assert_eq!(nibble, 0);
                    Nibble::Empty
                }
            };

            if rest >= NIBBLE_ESCAPE as usize {
                let rest = rest - NIBBLE_ESCAPE as usize;
                if rest < BYTE_ESCAPE as usize {
                    out.push(rest as u8);
                } else {
                    out.push(BYTE_ESCAPE);
                    let wide = m.length - MIN_MATCH;
                    if let Ok(value) = u16::try_from(wide) {
                        out.extend(&value.to_le_bytes());
                    } else {
                        out.extend(&[0, 0]);
                        out.extend(&(wide as u32).to_le_bytes());
                    }
                }
            }
        }

        self.matches += 1;
        self.add_flag(1, out);
    }

    fn add_flag(&mut self, bit: u32, out: &mut OutputStage) {
        self.flags = (self.flags << 1) | bit;
        self.flag_count += 1;
        if self.flag_count == FLAG_BITS {
            if let Some(at) = self.flag_at {
                out.patch_u32(at, self.flags);
            }
            self.flags = 0;
            self.flag_count = 0;
            self.open_flag_word(out);
        }
    }

    fn open_flag_word(&mut self, out: &mut OutputStage) {
        self.flag_at = Some(out.position());
        out.extend(&[0; FLAG_WORD_SIZE]);
    }

    fn update_hold(&self, out: &mut OutputStage) {
        let nibble_at = match self.nibble {
            Nibble::Open { at, .. } => Some(at),
            Nibble::Empty | Nibble::Closed => None,
        };
        let hold = match (self.flag_at, nibble_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        out.set_hold(hold);
    }
}

impl Default for XpressEncoder {
    fn default() -> Self {
        Self::new(CompressionLevel::DEFAULT)
    }
}

impl Codec for XpressEncoder {
    fn next_unit(&self) -> Option<usize> {
        Some(BLOCK_SIZE)
    }

    fn feed(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()> {
        self.encode(unit, out)
    }

    fn flush(&mut self, tail: &[u8], out: &mut OutputStage) -> Result<()> {
        if !tail.is_empty() {
            self.encode(tail, out)?;
        }
        out.reserve(FLAG_WORD_SIZE)?;
        if self.flag_at.is_none() {
            self.open_flag_word(out);
        }
        if let Some(at) = self.flag_at.take() {
            out.patch_u32(at, pad_flags(self.flags, self.flag_count));
        }
        self.flags = 0;
        self.flag_count = 0;
        self.nibble = Nibble::Empty;
        out.set_hold(None);

        debug!(
            literals = self.literals,
            matches = self.matches,
            "xpress stream flushed"
        );
        Ok(())
    }
}
