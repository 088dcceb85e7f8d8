//! Process-wide random source and entry point function.

use std::{cell::RefCell, sync::Arc};

use arc_swap::ArcSwapOption;

use crate::{Error, Ksuid, RandSource};
use inner::ThreadRngInner;

/// Custom source installed by [`set_rand_source()`], if any.
static SOURCE: ArcSwapOption<Box<dyn RandSource>> = ArcSwapOption::const_empty();

/// Generates a KSUID from the current time and the process-wide random source.
///
/// # Panics
///
/// Panics if the random source fails. Use [`Ksuid::new_random()`] to handle the failure.
///
/// # Examples
///
/// ```rust
/// let id = ksuid::ksuid();
/// println!("{}", id); // e.g., "0ujtsYcgvSTl8PAuAdqWYSMnLOv"
/// println!("{:?}", id.as_bytes()); // as 20-byte array
///
/// let id_string: String = ksuid::ksuid().to_string();
/// ```
pub fn ksuid() -> Ksuid {
    Ksuid::new()
}

/// Replaces the process-wide random source used by [`Ksuid::new()`] and related functions.
///
/// Passing `None` restores the default [`ThreadRandSource`]. The swap is atomic: concurrent
/// generators observe either the old or the new source for each payload, never a mix.
///
/// # Examples
///
/// ```rust
/// use ksuid::{set_rand_source, Ksuid, OsRandSource};
///
/// set_rand_source(Some(Box::new(OsRandSource)));
/// let x = Ksuid::new();
/// set_rand_source(None);
/// ```
pub fn set_rand_source(source: Option<Box<dyn RandSource>>) {
    tracing::debug!(custom = source.is_some(), "replacing process-wide KSUID random source");
    SOURCE.store(source.map(Arc::new));
}

/// Returns the process-wide random source currently in effect.
pub fn rand_source() -> Arc<dyn RandSource> {
    match SOURCE.load_full() {
        Some(source) => source,
        None => Arc::new(ThreadRandSource),
    }
}

/// Fills a payload from the process-wide random source.
pub(crate) fn fill_payload(dest: &mut [u8]) -> Result<(), Error> {
    match &*SOURCE.load() {
        Some(source) => source.fill_bytes(dest),
        None => ThreadRandSource.fill_bytes(dest),
    }
}

/// Represents the default [`RandSource`]: a per-thread cryptographically secure generator seeded
/// from the operating system.
///
/// Each thread lazily creates a [`ChaCha12Core`](rand_chacha::ChaCha12Core) generator wrapped in a
/// [`ReseedingRng`](rand::rngs::adapter::ReseedingRng) that reseeds from the operating system
/// every 64 KiB, following the strategy of [`rand::rngs::ThreadRng`]. On Unix, the generator is
/// rebuilt when the process ID changes (i.e., upon process forks) so that parent and child never
/// share a random stream.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct ThreadRandSource;

impl RandSource for ThreadRandSource {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        thread_local!(static RNG: RefCell<Option<ThreadRngInner>> = const { RefCell::new(None) });

        RNG.with(|slot| {
            let mut slot = slot.borrow_mut();
            let rng = match slot.take() {
                Some(rng) if !rng.is_stale() => slot.insert(rng),
                _ => slot.insert(ThreadRngInner::new()?),
            };
            rng.fill_bytes(dest)
        })
    }
}

mod inner {
    use rand::rngs::{adapter::ReseedingRng, OsRng};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha12Core;

    use crate::Error;

    /// Bytes generated before the generator reseeds itself.
    const RESEED_THRESHOLD: u64 = 1024 * 64;

    /// A thin wrapper to rebuild the generator when the process ID changes (i.e., upon Unix
    /// forks).
    #[derive(Debug)]
    pub struct ThreadRngInner {
        #[cfg(unix)]
        pid: u32,
        rng: ReseedingRng<ChaCha12Core, OsRng>,
    }

    impl ThreadRngInner {
        pub fn new() -> Result<Self, Error> {
            let core = ChaCha12Core::from_rng(OsRng).map_err(|err| {
                tracing::error!(%err, "could not seed KSUID random source");
                Error::Entropy
            })?;
            Ok(Self {
                #[cfg(unix)]
                pid: std::process::id(),
                rng: ReseedingRng::new(core, RESEED_THRESHOLD, OsRng),
            })
        }

        /// Returns `true` if the generator was created by another process.
        pub fn is_stale(&self) -> bool {
            #[cfg(unix)]
            return self.pid != std::process::id();
            #[cfg(not(unix))]
            false
        }

        pub fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
            self.rng.try_fill_bytes(dest).map_err(|err| {
                tracing::error!(%err, "could not read random bytes for KSUID payload");
                Error::Entropy
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fill_payload, ksuid, rand_source, set_rand_source, ThreadRandSource};
    use crate::{Error, Ksuid, RandSource};

    const N_SAMPLES: usize = 100_000;
    thread_local!(static SAMPLES: Vec<String> = (0..N_SAMPLES).map(|_| ksuid().into()).collect());

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let re = regex::Regex::new(r"^[0-9A-Za-z]{27}$").unwrap();
        SAMPLES.with(|samples| {
            for e in samples {
                assert!(re.is_match(e));
            }
        });
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        use std::collections::HashSet;
        SAMPLES.with(|samples| {
            let s: HashSet<&String> = samples.iter().collect();
            assert_eq!(s.len(), N_SAMPLES);
        });
    }

    /// Encodes up-to-date timestamp
    #[test]
    fn encodes_up_to_date_timestamp() {
        use std::time;
        for _ in 0..10_000 {
            let ts_now = time::SystemTime::now()
                .duration_since(time::UNIX_EPOCH)
                .expect("clock may have gone backwards")
                .as_secs() as i64;
            assert!((ts_now - ksuid().unix_timestamp()).abs() <= 1);
        }
    }

    /// Sets random bits properly
    #[test]
    fn sets_random_bits_properly() {
        // count '1' of each payload bit
        let mut bins = [0u32; 128];
        for _ in 0..N_SAMPLES {
            for (i, byte) in ksuid().payload().iter().enumerate() {
                for j in 0..8 {
                    bins[i * 8 + j] += u32::from(byte >> (7 - j) & 1);
                }
            }
        }

        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for (i, &bin) in bins.iter().enumerate() {
            let p = bin as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {}: {}", i, p);
        }
    }

    /// Generates no IDs sharing same payload under multithreading
    #[test]
    fn generates_no_ids_sharing_same_payload_under_multithreading(
    ) -> Result<(), Box<dyn std::error::Error>> {
        use std::{collections::HashSet, sync::mpsc, thread};

        let (tx, rx) = mpsc::channel();
        for _ in 0..4 {
            let tx = tx.clone();
            thread::Builder::new()
                .spawn(move || {
                    for _ in 0..10_000 {
                        tx.send(ksuid()).unwrap();
                    }
                })
                .map_err(|err| format!("failed to spawn thread: {:?}", err))?;
        }
        drop(tx);

        let mut s = HashSet::new();
        while let Ok(e) = rx.recv() {
            s.insert(<[u8; 16]>::try_from(e.payload()).unwrap());
        }

        assert_eq!(s.len(), 4 * 10_000);
        Ok(())
    }

    /// Draws payloads from a replaced source until reset
    #[test]
    fn draws_payloads_from_a_replaced_source_until_reset() {
        use std::thread::{self, ThreadId};

        /// Marks payloads for one thread and defers to the default source for the rest
        struct Marked(ThreadId);

        impl RandSource for Marked {
            fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
                if thread::current().id() == self.0 {
                    dest.fill(0xab);
                    Ok(())
                } else {
                    ThreadRandSource.fill_bytes(dest)
                }
            }
        }

        set_rand_source(Some(Box::new(Marked(thread::current().id()))));
        let mut got = [0u8; 16];
        fill_payload(&mut got).unwrap();
        assert_eq!(got, [0xab; 16]);
        assert_eq!(ksuid().payload(), &[0xab; 16]);
        rand_source().fill_bytes(&mut got[..4]).unwrap();
        assert_eq!(got, [0xab; 16]);

        set_rand_source(None);
        fill_payload(&mut got).unwrap();
        assert_ne!(got, [0xab; 16]);
        let x = Ksuid::new_random().unwrap();
        assert_ne!(x.payload(), &[0xab; 16]);
    }

    /// Fills bytes across reseed boundaries
    #[test]
    fn fills_bytes_across_reseed_boundaries() {
        let mut buf = vec![0u8; 1024 * 200];
        ThreadRandSource.fill_bytes(&mut buf).unwrap();
        assert!(buf.chunks(16).any(|c| c != [0u8; 16]));
    }
}
