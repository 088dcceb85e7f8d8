//! Random payload sources and related types.

use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};

use crate::Error;

pub mod with_rand08;

/// A trait that defines the random byte source used to fill KSUID payloads.
///
/// Sources are shared across threads through the process-wide handle (see
/// [`set_rand_source()`](crate::set_rand_source)), so `fill_bytes` takes `&self`; a source that
/// carries mutable state must synchronize it internally.
pub trait RandSource: Send + Sync {
    /// Fills `dest` with random data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if the source cannot produce random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error>;
}

/// Represents a [`RandSource`] that reads directly from the operating system.
///
/// Every call is a system call; [`ThreadRandSource`](crate::ThreadRandSource) is faster for bulk
/// generation.
///
/// # Examples
///
/// ```rust
/// use ksuid::{Ksuid, OsRandSource};
/// use std::time::SystemTime;
///
/// let x = Ksuid::from_rand_source(&OsRandSource, SystemTime::now())?;
/// # Ok::<(), ksuid::Error>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct OsRandSource;

impl RandSource for OsRandSource {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        OsRng.try_fill_bytes(dest).map_err(|err| {
            tracing::error!(%err, "could not read random bytes from the operating system");
            Error::Entropy
        })
    }
}

impl<T: RandSource + ?Sized> RandSource for &T {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        (**self).fill_bytes(dest)
    }
}

impl<T: RandSource + ?Sized> RandSource for Box<T> {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        (**self).fill_bytes(dest)
    }
}

impl<T: RandSource + ?Sized> RandSource for Arc<T> {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        (**self).fill_bytes(dest)
    }
}
