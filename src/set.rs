//! Compressed, immutable storage for sorted collections of KSUIDs.
//!
//! # Wire format
//!
//! A set is a stream of records, each introduced by a tag byte. The two high bits of the tag
//! select the record kind and the six low bits carry a byte count `n`:
//!
//! | Kind | Tag bits | Body |
//! | --- | --- | --- |
//! | raw | `00` | the full 20-byte KSUID (`n` unused) |
//! | time delta | `01` | `n` bytes of timestamp delta, then the full 16-byte payload |
//! | payload delta | `10` | `n` bytes of 128-bit payload delta from the previous id |
//! | payload range | `11` | `n` bytes of run length `m`: the next `m` ids each add one to the payload |
//!
//! All numbers are big-endian and written with the fewest bytes that hold them. Every
//! independently built set starts with a raw record, and the reader resets its running state on
//! each raw record, so concatenated sets read back as one.

use alloc::{borrow::Cow, vec::Vec};
use core::iter::FusedIterator;

use crate::sequence::{counter_of, MAX_COUNTER};
use crate::uint128::min_byte_len_u64;
use crate::{is_sorted, Error, Ksuid, Sequence, Uint128, BYTE_LENGTH, PAYLOAD_LENGTH};

const KIND_MASK: u8 = 0b11 << 6;
const COUNT_MASK: u8 = !KIND_MASK;

const RAW: u8 = 0b00 << 6;
const TIME_DELTA: u8 = 0b01 << 6;
const PAYLOAD_DELTA: u8 = 0b10 << 6;
const PAYLOAD_RANGE: u8 = 0b11 << 6;

/// Represents an immutable set of KSUIDs stored in a compact binary form.
///
/// Sets built from ids that share timestamps, and especially from ids produced by a [`Sequence`],
/// take far less than 20 bytes per id. Iteration always yields the ids in ascending order with
/// duplicates removed.
///
/// # Examples
///
/// ```rust
/// use ksuid::{CompressedSet, Ksuid, Sequence};
///
/// let seq = Sequence::new(Ksuid::new());
/// let ids: Vec<Ksuid> = (0..1000).map(|_| seq.next()).collect::<Result<_, _>>()?;
///
/// let set = CompressedSet::compress(&ids);
/// assert!(set.as_bytes().len() < 32);
/// assert!(set.iter().eq(ids.iter().copied()));
/// # Ok::<(), ksuid::Error>(())
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct CompressedSet(Vec<u8>);

impl CompressedSet {
    /// Creates a set from a collection of KSUIDs in any order.
    pub fn compress(ids: &[Ksuid]) -> Self {
        let capacity = 1 + BYTE_LENGTH + ids.len() / 5;
        Self::append_compressed(Vec::with_capacity(capacity), ids)
    }

    /// Appends the compressed form of `ids` to `buf` and returns the result as a set.
    ///
    /// `buf` must be empty or hold a valid set; the new records start with their own raw record,
    /// so the resulting set contains the ids of both. Note that the size of the compressed form is
    /// not `20 * ids.len()`, so the capacity reserved in `buf` is only a hint.
    pub fn append_compressed(mut buf: Vec<u8>, ids: &[Ksuid]) -> Self {
        let mut ids = Cow::Borrowed(ids);
        if !is_sorted(&ids) {
            ids.to_mut().sort_unstable();
        }

        let start = buf.len();
        let distinct = encode_sorted(&mut buf, &ids);
        tracing::trace!(
            ids = ids.len(),
            distinct,
            bytes = buf.len() - start,
            "compressed KSUID set"
        );
        Self(buf)
    }

    /// Concatenates sets into one that holds the union of their ids.
    ///
    /// The result yields every id of every input, set by set; ids are in ascending order only if
    /// each input set covers a range above the previous one.
    pub fn concat<'a>(sets: impl IntoIterator<Item = &'a CompressedSet>) -> Self {
        let mut buf = Vec::new();
        for set in sets {
            buf.extend_from_slice(&set.0);
        }
        Self(buf)
    }

    /// Wraps bytes produced by [`CompressedSet::as_bytes()`] without checking them.
    ///
    /// Use [`CompressedSet::try_from()`] or [`CompressedSet::validate()`] for untrusted input;
    /// iterating over a malformed set panics.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Walks the whole set and returns the number of ids it holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSet`] if the set contains an invalid tag or a truncated record.
    pub fn validate(&self) -> Result<usize, Error> {
        let mut it = self.iter();
        let mut count = 0;
        while it.try_next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Returns an iterator over the ids in the set.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.0)
    }

    /// Returns the compressed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the compressed bytes, consuming the set.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the size of the compressed form in bytes.
    pub fn len_bytes(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no ids.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Writes the records for a sorted slice that may contain duplicates, returning the number of
/// distinct ids written.
fn encode_sorted(buf: &mut Vec<u8>, ids: &[Ksuid]) -> usize {
    let Some((&first, rest)) = ids.split_first() else {
        return 0;
    };

    // the first id is always written in full; it is the baseline for all deltas
    buf.push(RAW);
    buf.extend_from_slice(first.as_bytes());

    let mut distinct = 1;
    let mut timestamp = first.timestamp();
    let mut last = first;
    let mut rest = rest.iter().copied().peekable();

    while let Some(id) = rest.next() {
        if id == last {
            continue;
        }
        distinct += 1;

        let t = id.timestamp();
        if t != timestamp {
            let delta = t - timestamp;
            let n = min_byte_len_u64(delta.into());
            buf.push(TIME_DELTA | n as u8);
            buf.extend_from_slice(&delta.to_be_bytes()[4 - n..]);
            buf.extend_from_slice(id.payload());
            timestamp = t;
        } else if continues_range(&last, &id) {
            let mut end = id;
            let mut length = 1u64;
            while let Some(&next) = rest.peek() {
                if next == end {
                    rest.next();
                } else if continues_range(&end, &next) {
                    end = next;
                    length += 1;
                    distinct += 1;
                    rest.next();
                } else {
                    break;
                }
            }

            let n = min_byte_len_u64(length);
            buf.push(PAYLOAD_RANGE | n as u8);
            buf.extend_from_slice(&length.to_be_bytes()[8 - n..]);
            last = end;
            continue;
        } else {
            let delta = id.payload_value().wrapping_sub(last.payload_value());
            let n = delta.min_byte_len();
            buf.push(PAYLOAD_DELTA | n as u8);
            buf.extend_from_slice(&delta.to_bytes()[PAYLOAD_LENGTH - n..]);
        }

        last = id;
    }

    distinct
}

/// Returns `true` if `next` can be replayed by a [`Sequence`] resuming right after `prev`: the
/// payload is one greater and the increment does not carry out of the 16-bit counter.
fn continues_range(prev: &Ksuid, next: &Ksuid) -> bool {
    u32::from(counter_of(prev)) < MAX_COUNTER && *next == prev.next()
}

impl TryFrom<Vec<u8>> for CompressedSet {
    type Error = Error;

    /// Wraps bytes after checking that they form a well-formed set.
    fn try_from(src: Vec<u8>) -> Result<Self, Self::Error> {
        let set = Self(src);
        set.validate()?;
        Ok(set)
    }
}

impl From<CompressedSet> for Vec<u8> {
    fn from(src: CompressedSet) -> Self {
        src.0
    }
}

impl AsRef<[u8]> for CompressedSet {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl FromIterator<Ksuid> for CompressedSet {
    fn from_iter<T: IntoIterator<Item = Ksuid>>(iter: T) -> Self {
        let ids: Vec<Ksuid> = iter.into_iter().collect();
        Self::compress(&ids)
    }
}

impl<'a> IntoIterator for &'a CompressedSet {
    type Item = Ksuid;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the ids of a [`CompressedSet`], created by [`CompressedSet::iter()`].
///
/// The iterator is a single-pass cursor; create one per reader. Any number of iterators may read
/// the same set at once.
///
/// # Panics
///
/// [`Iterator::next()`] panics when it reaches malformed data, because the record framing cannot
/// be recovered. Use [`Iter::try_next()`] to receive an error instead.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    content: &'a [u8],
    offset: usize,
    state: State,

    /// The id produced last.
    current: Ksuid,
    timestamp: u32,
    last_value: Uint128,
}

#[derive(Clone, Debug)]
enum State {
    ReadingTag,
    ReplayingRange { sequence: Sequence, remaining: u64 },
}

impl<'a> Iter<'a> {
    fn new(content: &'a [u8]) -> Self {
        Self {
            content,
            offset: 0,
            state: State::ReadingTag,
            current: Ksuid::NIL,
            timestamp: 0,
            last_value: Uint128::ZERO,
        }
    }

    /// Returns the next id, `Ok(None)` at the end of the set, or an error on malformed data.
    ///
    /// After an error the iterator is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSet`] if the set contains an invalid tag or a truncated record.
    pub fn try_next(&mut self) -> Result<Option<Ksuid>, Error> {
        let result = self.step();
        if result.is_err() {
            tracing::error!(offset = self.offset, "KSUID set iterator is reading malformed data");
            self.offset = self.content.len();
            self.state = State::ReadingTag;
        }
        result
    }

    fn step(&mut self) -> Result<Option<Ksuid>, Error> {
        if let State::ReplayingRange {
            sequence,
            remaining,
        } = &mut self.state
        {
            let id = sequence.next().map_err(|_| Error::MalformedSet)?;
            *remaining -= 1;
            if *remaining == 0 {
                self.state = State::ReadingTag;
            }
            return Ok(Some(self.emit(id)));
        }

        if self.offset == self.content.len() {
            return Ok(None);
        }

        let tag = self.take(1)?[0];
        let n = usize::from(tag & COUNT_MASK);

        let id = match tag & KIND_MASK {
            RAW => {
                let id = Ksuid::from_slice(self.take(BYTE_LENGTH)?)?;
                self.timestamp = id.timestamp();
                id
            }
            TIME_DELTA => {
                let delta = read_varint(self.take_varint(n, 4)?) as u32;
                let mut payload = [0u8; PAYLOAD_LENGTH];
                payload.copy_from_slice(self.take(PAYLOAD_LENGTH)?);
                self.timestamp = self.timestamp.wrapping_add(delta);
                Ksuid::from_fields(self.timestamp, payload)
            }
            PAYLOAD_DELTA => {
                let bytes = self.take_varint(n, PAYLOAD_LENGTH)?;
                let mut delta = [0u8; PAYLOAD_LENGTH];
                delta[PAYLOAD_LENGTH - bytes.len()..].copy_from_slice(bytes);
                let value = self.last_value.wrapping_add(Uint128::from_bytes(delta));
                Ksuid::from_fields(self.timestamp, value.to_bytes())
            }
            _ => {
                let length = read_varint(self.take_varint(n, 8)?);
                if length == 0 {
                    return Err(Error::MalformedSet);
                }

                let sequence =
                    Sequence::with_counter(self.current, u32::from(counter_of(&self.current)) + 1);
                let id = sequence.next().map_err(|_| Error::MalformedSet)?;
                if length > 1 {
                    self.state = State::ReplayingRange {
                        sequence,
                        remaining: length - 1,
                    };
                }
                id
            }
        };

        Ok(Some(self.emit(id)))
    }

    /// Records `id` as the baseline for the next record.
    fn emit(&mut self, id: Ksuid) -> Ksuid {
        self.current = id;
        self.last_value = id.payload_value();
        id
    }

    /// Consumes `n` bytes of the set.
    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self.offset + n;
        let bytes = self
            .content
            .get(self.offset..end)
            .ok_or(Error::MalformedSet)?;
        self.offset = end;
        Ok(bytes)
    }

    /// Consumes a varint of `n` bytes, where `n` must be within `1..=max`.
    fn take_varint(&mut self, n: usize, max: usize) -> Result<&'a [u8], Error> {
        if n == 0 || n > max {
            return Err(Error::MalformedSet);
        }
        self.take(n)
    }
}

/// Reads up to eight big-endian bytes as an unsigned integer.
fn read_varint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

impl Iterator for Iter<'_> {
    type Item = Ksuid;

    fn next(&mut self) -> Option<Self::Item> {
        match self.try_next() {
            Ok(id) => id,
            Err(err) => panic!("KSUID set iterator is reading malformed data: {}", err),
        }
    }
}

impl FusedIterator for Iter<'_> {}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use alloc::vec::Vec;
    use core::fmt;

    use super::CompressedSet;
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for CompressedSet {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_bytes(self.as_bytes())
        }
    }

    impl<'de> serde::Deserialize<'de> for CompressedSet {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_bytes(VisitorImpl)
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = CompressedSet;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a compressed KSUID set")
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            CompressedSet::try_from(value.to_vec()).map_err(de::Error::custom)
        }

        fn visit_byte_buf<E: de::Error>(self, value: Vec<u8>) -> Result<Self::Value, E> {
            CompressedSet::try_from(value).map_err(de::Error::custom)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(b) = seq.next_element::<u8>()? {
                bytes.push(b);
            }
            CompressedSet::try_from(bytes).map_err(de::Error::custom)
        }
    }

}
