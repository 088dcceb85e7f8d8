//! Order-preserving conversion between the 20-byte binary form and the 27-character base62 form.
//!
//! The alphabet lists digits, then uppercase, then lowercase letters, so the ASCII order of the
//! characters matches the order of their digit values. Combined with fixed-width zero padding on
//! both sides, comparing two encoded strings gives the same result as comparing the bytes they
//! encode.

use crate::{Error, BYTE_LENGTH, STRING_ENCODED_LENGTH};

/// Digit characters in ascending value order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Number of 32-bit words in the binary form.
const WORD_COUNT: usize = BYTE_LENGTH / 4;

/// Encodes 20 bytes into 27 base62 characters, left-padded with `'0'`.
///
/// The input is read as a 160-bit big-endian number split into five 32-bit words. Each pass
/// divides the remaining words by 62 in place and emits the remainder as the next digit from the
/// right; leading words are dropped from the working range as soon as they reach zero.
///
/// # Examples
///
/// ```rust
/// use ksuid::base62;
///
/// assert_eq!(&base62::encode(&[0xff; 20]), b"aWgEPTl1tmebfsQzFP4bxwgy80V");
/// assert_eq!(&base62::encode(&[0x00; 20]), b"000000000000000000000000000");
/// ```
pub fn encode(src: &[u8; BYTE_LENGTH]) -> [u8; STRING_ENCODED_LENGTH] {
    const SRC_BASE: u64 = 1 << 32;
    const DST_BASE: u64 = 62;

    let mut words = [0u32; WORD_COUNT];
    for (word, chunk) in words.iter_mut().zip(src.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let mut dst = [b'0'; STRING_ENCODED_LENGTH];
    let mut n = dst.len();
    let mut start = leading_zeros(&words);

    while start < words.len() {
        let mut remainder = 0u64;
        for word in &mut words[start..] {
            let value = u64::from(*word) + remainder * SRC_BASE;
            *word = (value / DST_BASE) as u32;
            remainder = value % DST_BASE;
        }

        // lowest digits come out first
        n -= 1;
        dst[n] = ALPHABET[remainder as usize];

        while start < words.len() && words[start] == 0 {
            start += 1;
        }
    }

    dst
}

/// Decodes 27 base62 characters into 20 bytes.
///
/// Each pass divides the remaining base62 digits by 2<sup>32</sup> in place and writes the
/// remainder as the next big-endian 32-bit group from the right.
///
/// # Errors
///
/// Returns [`Error::InvalidCharacter`] if `src` contains a byte outside [`ALPHABET`], and
/// [`Error::Overflow`] if the encoded value exceeds 2<sup>160</sup> - 1 (i.e. is greater than
/// `"aWgEPTl1tmebfsQzFP4bxwgy80V"`).
pub fn decode(src: &[u8; STRING_ENCODED_LENGTH]) -> Result<[u8; BYTE_LENGTH], Error> {
    const SRC_BASE: u64 = 62;
    const DST_BASE: u64 = 1 << 32;

    let mut digits = [0u8; STRING_ENCODED_LENGTH];
    for (digit, &c) in digits.iter_mut().zip(src) {
        *digit = digit_value(c).ok_or(Error::InvalidCharacter)?;
    }

    let mut dst = [0u8; BYTE_LENGTH];
    let mut n = dst.len();
    let mut start = leading_zeros(&digits);

    while start < digits.len() {
        if n == 0 {
            return Err(Error::Overflow);
        }

        let mut remainder = 0u64;
        for digit in &mut digits[start..] {
            let value = u64::from(*digit) + remainder * SRC_BASE;
            *digit = (value / DST_BASE) as u8;
            remainder = value % DST_BASE;
        }

        dst[n - 4..n].copy_from_slice(&(remainder as u32).to_be_bytes());
        n -= 4;

        while start < digits.len() && digits[start] == 0 {
            start += 1;
        }
    }

    Ok(dst)
}

/// Returns the value of a base62 digit character.
const fn digit_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'Z' => Some(c - b'A' + 10),
        b'a'..=b'z' => Some(c - b'a' + 36),
        _ => None,
    }
}

/// Counts the leading zero elements of a working buffer.
fn leading_zeros<T: Default + PartialEq>(values: &[T]) -> usize {
    let zero = T::default();
    values.iter().take_while(|&v| *v == zero).count()
}
