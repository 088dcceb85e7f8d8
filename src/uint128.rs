//! Fixed-width 128-bit arithmetic over KSUID payloads.

#[cfg(not(feature = "std"))]
use core as std;

use std::fmt;

/// An unsigned 128-bit integer stored as two 64-bit words.
///
/// The 16-byte KSUID payload is read as a big-endian number of this type. All arithmetic wraps
/// around modulo 2<sup>128</sup>. The derived ordering compares the high word first, which matches
/// the byte order of the payload.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uint128 {
    hi: u64,
    lo: u64,
}

impl Uint128 {
    /// Zero.
    pub const ZERO: Self = Self::new(0, 0);

    /// One.
    pub const ONE: Self = Self::new(0, 1);

    /// 2<sup>128</sup> - 1
    pub const MAX: Self = Self::new(u64::MAX, u64::MAX);

    /// Creates a value from its high and low 64-bit words.
    pub const fn new(hi: u64, lo: u64) -> Self {
        Self { hi, lo }
    }

    /// Returns the most significant 64 bits.
    pub const fn hi(&self) -> u64 {
        self.hi
    }

    /// Returns the least significant 64 bits.
    pub const fn lo(&self) -> u64 {
        self.lo
    }

    /// Creates a value from a 16-byte big-endian array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut hi = 0u64;
        let mut lo = 0u64;
        let mut i = 0;
        while i < 8 {
            hi = (hi << 8) | bytes[i] as u64;
            lo = (lo << 8) | bytes[i + 8] as u64;
            i += 1;
        }
        Self { hi, lo }
    }

    /// Returns the 16-byte big-endian representation.
    pub const fn to_bytes(&self) -> [u8; 16] {
        let hi = self.hi.to_be_bytes();
        let lo = self.lo.to_be_bytes();
        let mut bytes = [0u8; 16];
        let mut i = 0;
        while i < 8 {
            bytes[i] = hi[i];
            bytes[i + 8] = lo[i];
            i += 1;
        }
        bytes
    }

    /// Adds `rhs`, carrying from the low word into the high word and discarding the final carry.
    #[must_use]
    pub const fn wrapping_add(self, rhs: Self) -> Self {
        let (lo, carry) = self.lo.overflowing_add(rhs.lo);
        let hi = self.hi.wrapping_add(rhs.hi).wrapping_add(carry as u64);
        Self { hi, lo }
    }

    /// Subtracts `rhs`, borrowing from the high word and discarding the final borrow.
    #[must_use]
    pub const fn wrapping_sub(self, rhs: Self) -> Self {
        let (lo, borrow) = self.lo.overflowing_sub(rhs.lo);
        let hi = self.hi.wrapping_sub(rhs.hi).wrapping_sub(borrow as u64);
        Self { hi, lo }
    }

    /// Returns `self + 1`, wrapping [`Uint128::MAX`] to [`Uint128::ZERO`].
    #[must_use]
    pub const fn increment(self) -> Self {
        self.wrapping_add(Self::ONE)
    }

    /// Returns `self - 1`, wrapping [`Uint128::ZERO`] to [`Uint128::MAX`].
    #[must_use]
    pub const fn decrement(self) -> Self {
        self.wrapping_sub(Self::ONE)
    }

    /// Returns the fewest big-endian bytes that represent the value without a leading zero byte.
    ///
    /// Zero is reported as one byte.
    pub(crate) const fn min_byte_len(&self) -> usize {
        if self.hi != 0 {
            8 + min_byte_len_u64(self.hi)
        } else {
            min_byte_len_u64(self.lo)
        }
    }
}

/// Returns the fewest big-endian bytes that represent `value`, counting zero as one byte.
pub(crate) const fn min_byte_len_u64(value: u64) -> usize {
    if value == 0 {
        1
    } else {
        8 - value.leading_zeros() as usize / 8
    }
}

impl From<u64> for Uint128 {
    fn from(src: u64) -> Self {
        Self::new(0, src)
    }
}

impl From<u128> for Uint128 {
    fn from(src: u128) -> Self {
        Self::new((src >> 64) as u64, src as u64)
    }
}

impl From<Uint128> for u128 {
    fn from(src: Uint128) -> Self {
        ((src.hi as u128) << 64) | src.lo as u128
    }
}

impl fmt::Display for Uint128 {
    /// Formats the value as `0x` followed by 32 uppercase hexadecimal digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}{:016X}", self.hi, self.lo)
    }
}
