//! Streaming plain Xpress decoder.
//!
//! Every field of the format is its own input unit, so the decoder is a small
//! state machine that never looks ahead: a flag word, then one literal byte
//! or a match word followed by however many length fields it escapes to.
//! History lives in the output stage, which keeps [`WINDOW_SIZE`] bytes
//! behind the current position across calls. A match longer than the free
//! space in the stage is finished by [`Codec::resume`] after a drain.

use crate::token::{
    BYTE_ESCAPE, BYTE_MATCH, FLAG_BITS, FLAG_WORD_SIZE, LOW_ESCAPE, MATCH_WORD_SIZE, MIN_MATCH,
    MIN_WIDE_LENGTH, NIBBLE_ESCAPE, NIBBLE_MATCH, WINDOW_SIZE, unpack_match_word, wide_length,
};
use mscomp_core::bits::{read_u16_le, read_u32_le};
use mscomp_core::error::{MsCompError, Result};
use mscomp_core::{Codec, OutputStage};

/// What the next input unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Flags,
    Literal,
    MatchWord,
    Nibble,
    LengthByte,
    Length16,
    Length32,
    End,
}

impl Phase {
    fn unit(self) -> Option<usize> {
        match self {
            Phase::Flags | Phase::Length32 => Some(FLAG_WORD_SIZE),
            Phase::MatchWord | Phase::Length16 => Some(MATCH_WORD_SIZE),
            Phase::Literal | Phase::Nibble | Phase::LengthByte => Some(1),
            Phase::End => None,
        }
    }
}

/// Plain Xpress decoder state.
#[derive(Debug)]
pub struct XpressDecoder {
    phase: Phase,
    flags: u32,
    /// Item bits left in `flags`.
    flag_count: u32,
    /// High half of the last shared nibble byte, not yet used.
    upper_nibble: Option<u8>,
    distance: usize,
    /// Match bytes still to copy.
    deferred: usize,
    offset: u64,
}

impl XpressDecoder {
    /// Create a decoder expecting the first flag word.
    pub fn new() -> Self {
        Self {
            phase: Phase::Flags,
            flags: 0,
            flag_count: 0,
            upper_nibble: None,
            distance: 0,
            deferred: 0,
            offset: 0,
        }
    }

    /// Compressed bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Pick the phase for the next item from the flag word.
    fn next_item(&mut self) {
        if self.flag_count == 0 {
            self.phase = Phase::Flags;
            return;
        }
        self.flag_count -= 1;
        self.phase = if (self.flags >> self.flag_count) & 1 == 0 {
            Phase::Literal
        } else {
            Phase::MatchWord
        };
    }

    fn nibble(&mut self, value: u8, out: &mut OutputStage) -> Result<()> {
        if value == NIBBLE_ESCAPE {
            self.phase = Phase::LengthByte;
            Ok(())
        } else {
            self.start_match(value as usize + NIBBLE_MATCH, out)
        }
    }

    fn wide(&self, value: u32) -> Result<usize> {
        wide_length(value).ok_or_else(|| {
            MsCompError::corrupted(
                self.offset,
                format!(
                    "match length field {} is below the minimum of {}",
                    value, MIN_WIDE_LENGTH
                ),
            )
        })
    }

    fn start_match(&mut self, length: usize, out: &mut OutputStage) -> Result<()> {
        let copied = out.copy_match(self.distance, length)?;
        self.deferred = length - copied;
        self.next_item();
        Ok(())
    }
}

impl Default for XpressDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for XpressDecoder {
    fn next_unit(&self) -> Option<usize> {
        self.phase.unit()
    }

    fn feed(&mut self, unit: &[u8], out: &mut OutputStage) -> Result<()> {
        match self.phase {
            Phase::Flags => {
                self.flags = read_u32_le(unit, 0);
                self.flag_count = FLAG_BITS;
                self.next_item();
            }
            Phase::Literal => {
                out.reserve(1)?;
                out.push(unit[0]);
                self.next_item();
            }
            Phase::MatchWord => {
                let (distance, low) = unpack_match_word(read_u16_le(unit, 0));
                self.distance = distance;
                if low < LOW_ESCAPE {
                    self.start_match(low as usize + MIN_MATCH, out)?;
                } else if let Some(upper) = self.upper_nibble.take() {
                    self.nibble(upper, out)?;
                } else {
                    self.phase = Phase::Nibble;
                }
            }
            Phase::Nibble => {
                self.upper_nibble = Some(unit[0] >> 4);
                self.nibble(unit[0] & 0x0F, out)?;
            }
            Phase::LengthByte => {
                if unit[0] == BYTE_ESCAPE {
                    self.phase = Phase::Length16;
                } else {
                    self.start_match(unit[0] as usize + BYTE_MATCH, out)?;
                }
            }
            Phase::Length16 => {
                let value = read_u16_le(unit, 0);
                if value == 0 {
                    self.phase = Phase::Length32;
                } else {
                    let length = self.wide(value as u32)?;
                    self.start_match(length, out)?;
                }
            }
            Phase::Length32 => {
                let length = self.wide(read_u32_le(unit, 0))?;
                self.start_match(length, out)?;
            }
            Phase::End => {
                return Err(MsCompError::invalid_argument("input after end of stream"));
            }
        }
        self.offset += unit.len() as u64;
        Ok(())
    }

    fn has_deferred(&self) -> bool {
        self.deferred > 0
    }

    fn resume(&mut self, out: &mut OutputStage) -> Result<()> {
        let copied = out.copy_match(self.distance, self.deferred)?;
        self.deferred -= copied;
        Ok(())
    }

    fn flush(&mut self, tail: &[u8], _out: &mut OutputStage) -> Result<()> {
        match self.phase {
            // Input may stop before any item, including the padding matches
            // of the last flag word.
            Phase::Flags | Phase::Literal | Phase::MatchWord if tail.is_empty() => {
                self.phase = Phase::End;
                Ok(())
            }
            Phase::End => Ok(()),
            phase => {
                let unit = phase.unit().unwrap_or(0);
                Err(MsCompError::truncated(unit - tail.len()))
            }
        }
    }
}

/// Output stage sizing for the decoder: the full window plus working space.
pub(crate) fn output_stage() -> OutputStage {
    OutputStage::new(WINDOW_SIZE, 4 * WINDOW_SIZE)
}
