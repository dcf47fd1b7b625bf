//! Hash-chain match finder shared by the LZ77 encoders.
//!
//! Positions are indices into a caller-owned history buffer. Each position
//! is hashed on its first three bytes; `head` maps a hash to the most recent
//! position and `prev` links every position to the previous one with the
//! same hash. [`MatchFinder::slide`] keeps the chains valid when the caller
//! discards the start of its buffer.

use crate::traits::CompressionLevel;

/// Minimum match length for every supported format.
pub const MIN_MATCH: usize = 3;

const NIL: u32 = u32::MAX;

/// A back-reference candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Number of bytes to copy.
    pub length: usize,
    /// Distance back from the current position.
    pub distance: usize,
}

/// Search parameters derived from a compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchParams {
    /// Maximum chain entries examined per search. Zero disables matching.
    pub max_chain: usize,
    /// Stop searching once a match this long is found.
    pub nice_length: usize,
    /// Try the next position before committing to a match.
    pub lazy: bool,
}

impl MatchParams {
    /// Literals only.
    pub const STORE: Self = Self {
        max_chain: 0,
        nice_length: 0,
        lazy: false,
    };

    /// Parameters for a compression level.
    pub fn for_level(level: CompressionLevel) -> Self {
        let (max_chain, nice_length, lazy) = match level.level() {
            0 => return Self::STORE,
            1 => (4, 16, false),
            2 => (8, 32, false),
            3 => (16, 32, false),
            4 => (32, 64, false),
            5 => (64, 128, true),
            6 => (128, 258, true),
            7 => (256, 1024, true),
            8 => (1024, 4096, true),
            _ => (4096, usize::MAX, true),
        };
        Self {
            max_chain,
            nice_length,
            lazy,
        }
    }
}

/// Hash-chain index over a history buffer.
#[derive(Debug)]
pub struct MatchFinder {
    head: Vec<u32>,
    prev: Vec<u32>,
    hash_mask: usize,
    params: MatchParams,
}

impl MatchFinder {
    /// Create a finder for buffers of up to `capacity` bytes with a
    /// `2^hash_bits` entry hash table.
    pub fn new(capacity: usize, hash_bits: u32, level: CompressionLevel) -> Self {
        let size = 1usize << hash_bits;
        Self {
            head: vec![NIL; size],
            prev: vec![NIL; capacity],
            hash_mask: size - 1,
            params: MatchParams::for_level(level),
        }
    }

    /// Active search parameters.
    pub fn params(&self) -> MatchParams {
        self.params
    }

    /// Forget every indexed position.
    pub fn reset(&mut self) {
        self.head.fill(NIL);
        self.prev.fill(NIL);
    }

    #[inline(always)]
    fn hash(&self, b0: u8, b1: u8, b2: u8) -> usize {
        let h = ((b0 as usize).wrapping_mul(506832829))
            ^ ((b1 as usize).wrapping_mul(2654435761) << 8)
            ^ ((b2 as usize).wrapping_mul(374761393) << 16);
        (h ^ (h >> 15)) & self.hash_mask
    }

    /// Index position `pos` of `data`. Positions too close to the end to
    /// hash are skipped.
    #[inline]
    pub fn insert(&mut self, data: &[u8], pos: usize) {
        if pos + MIN_MATCH <= data.len() {
            let h = self.hash(data[pos], data[pos + 1], data[pos + 2]);
            self.prev[pos] = self.head[h];
            self.head[h] = pos as u32;
        }
    }

    /// Index every position in `start..end`.
    pub fn insert_range(&mut self, data: &[u8], start: usize, end: usize) {
        for pos in start..end {
            self.insert(data, pos);
        }
    }

    /// Find the longest match for `pos` no further back than `max_distance`
    /// and no longer than `max_len`.
    ///
    /// `pos` itself must not have been inserted yet.
    pub fn find(
        &self,
        data: &[u8],
        pos: usize,
        max_len: usize,
        max_distance: usize,
    ) -> Option<Match> {
        let max_len = max_len.min(data.len() - pos);
        if self.params.max_chain == 0 || max_len < MIN_MATCH {
            return None;
        }

        let h = self.hash(data[pos], data[pos + 1], data[pos + 2]);
        let min_pos = pos.saturating_sub(max_distance);
        let mut candidate = self.head[h];
        let mut best = Match {
            length: MIN_MATCH - 1,
            distance: 0,
        };
        let mut chain = 0;

        while candidate != NIL && chain < self.params.max_chain {
            let cand = candidate as usize;
            if cand < min_pos || cand >= pos {
                break;
            }

            // Reject early on the byte that would make this match longer.
            if data[cand + best.length] == data[pos + best.length] {
                let mut len = 0;
                while len < max_len && data[cand + len] == data[pos + len] {
                    len += 1;
                }
                if len > best.length {
                    best = Match {
                        length: len,
                        distance: pos - cand,
                    };
                    if len >= max_len || len >= self.params.nice_length {
                        break;
                    }
                }
            }

            candidate = self.prev[cand];
            chain += 1;
        }

        (best.length >= MIN_MATCH).then_some(best)
    }

    /// Account for the caller discarding the first `amount` bytes of its
    /// buffer.
    pub fn slide(&mut self, amount: usize) {
        let shift = |e: &mut u32| {
            *e = if *e == NIL || (*e as usize) < amount {
                NIL
            } else {
                *e - amount as u32
            };
        };
        self.head.iter_mut().for_each(&shift);
        self.prev.copy_within(amount.., 0);
        let len = self.prev.len();
        self.prev[len - amount..].fill(NIL);
        self.prev.iter_mut().for_each(&shift);
    }
}
