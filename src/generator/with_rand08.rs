//! Integration with `rand` (v0.8) crate.

use std::sync::{Mutex, PoisonError};

use rand::RngCore;

use super::RandSource;
use crate::Error;

/// An adapter that implements [`RandSource`] for [`RngCore`] types.
///
/// The wrapped generator is locked for each payload, so a seeded generator yields a reproducible
/// series of payloads when used from one thread.
///
/// # Examples
///
/// ```rust
/// use ksuid::{with_rand08::Adapter, Ksuid};
/// use rand::{rngs::StdRng, SeedableRng};
/// use std::time::SystemTime;
///
/// let source = Adapter::new(StdRng::seed_from_u64(42));
/// let x = Ksuid::from_rand_source(&source, SystemTime::now())?;
/// # Ok::<(), ksuid::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Adapter<T>(Mutex<T>);

impl<T> Adapter<T> {
    /// Wraps `rng`.
    pub const fn new(rng: T) -> Self {
        Self(Mutex::new(rng))
    }

    /// Returns the wrapped generator.
    pub fn into_inner(self) -> T {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: RngCore + Send> RandSource for Adapter<T> {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        rng.try_fill_bytes(dest).map_err(|err| {
            tracing::error!(%err, "could not read random bytes from rand (v0.8) generator");
            Error::Entropy
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    use super::Adapter;
    use crate::RandSource;

    /// Reproduces payloads from a seeded generator
    #[test]
    fn reproduces_payloads_from_a_seeded_generator() {
        let source = Adapter::new(StdRng::seed_from_u64(0x6b73_7569_64));
        let mut expected = StdRng::seed_from_u64(0x6b73_7569_64);

        for _ in 0..100 {
            let mut actual = [0u8; 16];
            let mut want = [0u8; 16];
            source.fill_bytes(&mut actual).unwrap();
            expected.fill_bytes(&mut want);
            assert_eq!(actual, want);
        }

        let mut rest = source.into_inner();
        assert_eq!(rest.next_u64(), expected.next_u64());
    }
}
