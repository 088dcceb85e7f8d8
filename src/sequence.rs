//! Bounded generator of ordered KSUIDs derived from a seed.

#[cfg(not(feature = "std"))]
use core as std;

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{Error, Ksuid, BYTE_LENGTH};

/// Largest counter value a sequence stamps into its ids.
pub(crate) const MAX_COUNTER: u32 = u16::MAX as u32;

/// Represents a KSUID generator that produces up to 65536 ordered KSUIDs from a seed.
///
/// Every id shares the leading 18 bytes of the seed; the trailing 2 bytes carry a big-endian
/// counter that starts at zero. The counter is advanced atomically, so one sequence can be shared
/// by concurrent callers without external locking and no counter value is handed out twice.
///
/// # Examples
///
/// ```rust
/// use ksuid::{Ksuid, Sequence};
///
/// let seq = Sequence::new(Ksuid::parse("0ujtsYcgvSTl8PAuAdqWYSMnLOv")?);
/// let a = seq.next()?;
/// let b = seq.next()?;
/// assert!(a < b);
/// assert_eq!(&a.as_bytes()[..18], &b.as_bytes()[..18]);
/// # Ok::<(), ksuid::Error>(())
/// ```
#[derive(Debug)]
pub struct Sequence {
    seed: Ksuid,

    /// Next counter value. Kept wider than 16 bits so that exhaustion is observable.
    count: AtomicU32,
}

impl Sequence {
    /// Creates a sequence that starts at counter zero.
    pub const fn new(seed: Ksuid) -> Self {
        Self::with_counter(seed, 0)
    }

    /// Creates a sequence that resumes at the given counter value.
    pub(crate) const fn with_counter(seed: Ksuid, count: u32) -> Self {
        Self {
            seed,
            count: AtomicU32::new(count),
        }
    }

    /// Returns the seed.
    pub const fn seed(&self) -> Ksuid {
        self.seed
    }

    /// Produces the next KSUID in the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequenceExhausted`] once 65536 ids have been produced.
    pub fn next(&self) -> Result<Ksuid, Error> {
        let count = self
            .count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                (count <= MAX_COUNTER).then(|| count + 1)
            })
            .map_err(|_| Error::SequenceExhausted)?;
        Ok(stamp_counter(self.seed, count as u16))
    }

    /// Returns the smallest and largest KSUIDs the sequence can still produce.
    ///
    /// Once the sequence is exhausted, both bounds are the last id it produced.
    pub fn bounds(&self) -> (Ksuid, Ksuid) {
        let count = self.count.load(Ordering::Relaxed).min(MAX_COUNTER);
        (
            stamp_counter(self.seed, count as u16),
            stamp_counter(self.seed, MAX_COUNTER as u16),
        )
    }
}

impl Clone for Sequence {
    fn clone(&self) -> Self {
        Self::with_counter(self.seed, self.count.load(Ordering::Relaxed))
    }
}

/// Returns the counter stored in the trailing two bytes of `id`.
pub(crate) fn counter_of(id: &Ksuid) -> u16 {
    let bytes = id.as_bytes();
    u16::from_be_bytes([bytes[BYTE_LENGTH - 2], bytes[BYTE_LENGTH - 1]])
}

/// Returns `seed` with its trailing two bytes replaced by `count`.
fn stamp_counter(seed: Ksuid, count: u16) -> Ksuid {
    let mut bytes = <[u8; BYTE_LENGTH]>::from(seed);
    bytes[BYTE_LENGTH - 2..].copy_from_slice(&count.to_be_bytes());
    Ksuid::from(bytes)
}
