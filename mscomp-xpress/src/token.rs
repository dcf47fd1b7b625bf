//! Plain Xpress token layout.
//!
//! ```text
//! stream    := (flag word, up to 32 items)*
//! flag word := u32 LE, consumed most significant bit first
//!              bit 0 = literal byte, bit 1 = match
//! match     := u16 LE word [nibble] [byte] [u16] [u32]
//!              word bits 0-2  : length - 3, 7 = longer
//!              word bits 3-15 : distance - 1
//! ```
//!
//! Longer matches escape step by step:
//!
//! | field  | value      | length        |
//! |--------|------------|---------------|
//! | nibble | 0-14       | nibble + 10   |
//! | byte   | 0-254      | byte + 25     |
//! | u16    | 22-65535   | u16 + 3       |
//! | u32    | 22-        | u32 + 3       |
//!
//! A nibble value of 15 escapes to the byte, a byte of 255 to the u16, and a
//! u16 of 0 to the u32. Nibbles are shared: the first long match stores its
//! nibble in the low half of a fresh byte and the next long match uses the
//! high half of that same byte.
//!
//! There is no end marker. Unused bits of the last flag word are set to 1,
//! so the decoder runs out of input while expecting a match word.

/// Largest back-reference distance.
pub const WINDOW_SIZE: usize = 8192;

/// Size of a flag word.
pub const FLAG_WORD_SIZE: usize = 4;

/// Items described by one flag word.
pub const FLAG_BITS: u32 = 32;

/// Size of a match word.
pub const MATCH_WORD_SIZE: usize = 2;

/// Shortest match.
pub const MIN_MATCH: usize = 3;

/// Shortest match that needs a shared nibble.
pub const NIBBLE_MATCH: usize = MIN_MATCH + 7;

/// Shortest match that needs the extra length byte.
pub const BYTE_MATCH: usize = NIBBLE_MATCH + 15;

/// Smallest legal value of a 16 or 32-bit length field.
pub const MIN_WIDE_LENGTH: u32 = 22;

/// Low length bits escaping to a shared nibble.
pub const LOW_ESCAPE: u16 = 7;
/// Nibble value escaping to a length byte.
pub const NIBBLE_ESCAPE: u8 = 15;
/// Byte value escaping to a 16-bit length.
pub const BYTE_ESCAPE: u8 = 255;

/// Pack a distance and the low three length bits into a match word.
#[inline]
pub fn pack_match_word(distance: usize, low: u16) -> u16 {
    debug_assert!((1..=WINDOW_SIZE).contains(&distance));
    debug_assert!(low <= LOW_ESCAPE);
    (((distance - 1) as u16) << 3) | low
}

/// Split a match word into `(distance, low length bits)`.
#[inline]
pub fn unpack_match_word(word: u16) -> (usize, u16) {
    ((word >> 3) as usize + 1, word & LOW_ESCAPE)
}

/// Final value of a flag word holding `count` item bits in `flags`.
///
/// The bits move to the top of the word and the unused low bits are set.
#[inline]
pub fn pad_flags(flags: u32, count: u32) -> u32 {
    debug_assert!(count < FLAG_BITS);
    let unused = FLAG_BITS - count;
    (((flags as u64) << unused) | ((1u64 << unused) - 1)) as u32
}

/// Length of a match given a 16 or 32-bit length field.
#[inline]
pub fn wide_length(value: u32) -> Option<usize> {
    (value >= MIN_WIDE_LENGTH).then(|| (value as usize).saturating_add(MIN_MATCH))
}
