//! Primitive layer: little-endian integer access and bit twiddling.
//!
//! All compressed formats in this workspace store multi-byte integers in
//! little-endian order regardless of the host. The helpers here are the only
//! place that converts between byte slices and integers.
//!
//! [`Bits::count_leading_zeros`] and [`Bits::log2`] are undefined for zero.
//! Callers must guard; debug builds assert.

/// Read a little-endian `u16` at `pos`.
///
/// # Panics
///
/// Panics if `data` holds fewer than `pos + 2` bytes.
#[inline(always)]
pub fn read_u16_le(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

/// Read a little-endian `u32` at `pos`.
///
/// # Panics
///
/// Panics if `data` holds fewer than `pos + 4` bytes.
#[inline(always)]
pub fn read_u32_le(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// Write `value` as little-endian at `pos`.
#[inline(always)]
pub fn write_u16_le(data: &mut [u8], pos: usize, value: u16) {
    data[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

/// Write `value` as little-endian at `pos`.
#[inline(always)]
pub fn write_u32_le(data: &mut [u8], pos: usize, value: u32) {
    data[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

/// Bit operations shared by all fixed-width unsigned integers.
pub trait Bits: Copy {
    /// Rotate left by `bits` (taken modulo the width).
    fn rotl(self, bits: u32) -> Self;

    /// Number of set bits.
    fn count_bits_set(self) -> u32;

    /// Number of leading zero bits. Undefined for zero.
    fn count_leading_zeros(self) -> u32;

    /// Floor of the base-2 logarithm. Undefined for zero.
    fn log2(self) -> u32;

    /// Reverse the byte order.
    fn byte_swap(self) -> Self;
}

macro_rules! impl_bits {
    ($($t:ty),*) => {
        $(
            impl Bits for $t {
                #[inline(always)]
                fn rotl(self, bits: u32) -> Self {
                    self.rotate_left(bits)
                }

                #[inline(always)]
                fn count_bits_set(self) -> u32 {
                    self.count_ones()
                }

                #[inline(always)]
                fn count_leading_zeros(self) -> u32 {
                    debug_assert!(self != 0, "leading zero count of 0 is undefined");
                    self.leading_zeros()
                }

                #[inline(always)]
                fn log2(self) -> u32 {
                    debug_assert!(self != 0, "log2 of 0 is undefined");
                    <$t>::BITS - 1 - self.leading_zeros()
                }

                #[inline(always)]
                fn byte_swap(self) -> Self {
                    self.swap_bytes()
                }
            }
        )*
    };
}

impl_bits!(u8, u16, u32, u64);

/// Rotate `x` left by `bits`.
#[inline(always)]
pub fn rotate_left<T: Bits>(x: T, bits: u32) -> T {
    x.rotl(bits)
}

/// Number of set bits in `x`.
#[inline(always)]
pub fn population_count<T: Bits>(x: T) -> u32 {
    x.count_bits_set()
}

/// Number of leading zero bits in `x`. `x` must be non-zero.
#[inline(always)]
pub fn leading_zero_count<T: Bits>(x: T) -> u32 {
    x.count_leading_zeros()
}

/// Floor of log2 of `x`. `x` must be non-zero.
#[inline(always)]
pub fn log2_floor<T: Bits>(x: T) -> u32 {
    x.log2()
}
