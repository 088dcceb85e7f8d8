#[cfg(not(feature = "std"))]
use core as std;

use std::{cmp, fmt, str};

use fstr::FStr;

use crate::{base62, Error, Uint128};

/// Unix time, in seconds, at which the KSUID timestamp field reads zero.
///
/// Counting from here instead of 1970 gives the 32-bit field a useful lifetime of around 136
/// years from 2014.
pub const EPOCH_STAMP: i64 = 1_400_000_000;

/// Length of the timestamp field in bytes.
pub const TIMESTAMP_LENGTH: usize = 4;

/// Length of the payload field in bytes.
pub const PAYLOAD_LENGTH: usize = 16;

/// Length of the binary representation in bytes.
pub const BYTE_LENGTH: usize = TIMESTAMP_LENGTH + PAYLOAD_LENGTH;

/// Length of the base62 string representation in characters.
pub const STRING_ENCODED_LENGTH: usize = 27;

/// String representation of [`Ksuid::MAX`].
pub const MAX_STRING_ENCODED: &str = "aWgEPTl1tmebfsQzFP4bxwgy80V";

/// Represents a K-Sortable Unique IDentifier.
///
/// The 20-byte array holds a big-endian 32-bit timestamp (seconds since [`EPOCH_STAMP`]) followed
/// by a 16-byte payload. Byte order, creation-time order and the order of the base62 strings all
/// agree, so the derived [`Ord`] sorts ids chronologically with the payload as tie-breaker.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Ksuid([u8; BYTE_LENGTH]);

impl Ksuid {
    /// Nil KSUID (000000000000000000000000000)
    pub const NIL: Self = Self([0x00; BYTE_LENGTH]);

    /// Max KSUID (aWgEPTl1tmebfsQzFP4bxwgy80V)
    pub const MAX: Self = Self([0xff; BYTE_LENGTH]);

    /// Creates a KSUID from a raw (uncorrected) timestamp and a payload.
    pub const fn from_fields(timestamp: u32, payload: [u8; PAYLOAD_LENGTH]) -> Self {
        let ts = timestamp.to_be_bytes();
        let mut bytes = [0u8; BYTE_LENGTH];
        bytes[0] = ts[0];
        bytes[1] = ts[1];
        bytes[2] = ts[2];
        bytes[3] = ts[3];
        let mut i = 0;
        while i < PAYLOAD_LENGTH {
            bytes[TIMESTAMP_LENGTH + i] = payload[i];
            i += 1;
        }
        Self(bytes)
    }

    /// Creates a KSUID from a 20-byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Size`] if `bytes` is not exactly 20 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        <[u8; BYTE_LENGTH]>::try_from(bytes)
            .map(Self)
            .map_err(|_| Error::Size)
    }

    /// Creates a KSUID from the 27-character base62 string representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StringSize`] if `src` is not exactly 27 bytes long, and
    /// [`Error::InvalidCharacter`] or [`Error::Overflow`] if it is not a valid base62 number
    /// below 2<sup>160</sup>.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ksuid::Ksuid;
    ///
    /// let x = Ksuid::parse("0ujtsYcgvSTl8PAuAdqWYSMnLOv")?;
    /// assert_eq!(x.timestamp(), 107608047);
    /// assert_eq!(&x.encode() as &str, "0ujtsYcgvSTl8PAuAdqWYSMnLOv");
    /// # Ok::<(), ksuid::Error>(())
    /// ```
    pub fn parse(src: &str) -> Result<Self, Error> {
        let src = <&[u8; STRING_ENCODED_LENGTH]>::try_from(src.as_bytes())
            .map_err(|_| Error::StringSize)?;
        base62::decode(src).map(Self)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; BYTE_LENGTH] {
        &self.0
    }

    /// Returns the timestamp field: seconds since [`EPOCH_STAMP`], not since the Unix epoch.
    pub const fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Returns the timestamp corrected to Unix seconds.
    pub const fn unix_timestamp(&self) -> i64 {
        self.timestamp() as i64 + EPOCH_STAMP
    }

    /// Returns the 16-byte payload.
    pub fn payload(&self) -> &[u8] {
        &self.0[TIMESTAMP_LENGTH..]
    }

    /// Returns the payload as a 128-bit integer.
    pub(crate) fn payload_value(&self) -> Uint128 {
        let mut payload = [0u8; PAYLOAD_LENGTH];
        payload.copy_from_slice(self.payload());
        Uint128::from_bytes(payload)
    }

    /// Returns `true` if this is the Nil KSUID.
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Returns the KSUID that immediately follows this one, treating the 20 bytes as a single
    /// 160-bit counter. [`Ksuid::MAX`] wraps around to [`Ksuid::NIL`].
    #[must_use]
    pub fn next(&self) -> Self {
        let payload = self.payload_value();
        let incremented = payload.increment();
        let timestamp = if incremented == Uint128::ZERO {
            self.timestamp().wrapping_add(1)
        } else {
            self.timestamp()
        };
        Self::from_fields(timestamp, incremented.to_bytes())
    }

    /// Returns the KSUID that immediately precedes this one, treating the 20 bytes as a single
    /// 160-bit counter. [`Ksuid::NIL`] wraps around to [`Ksuid::MAX`].
    #[must_use]
    pub fn prev(&self) -> Self {
        let payload = self.payload_value();
        let timestamp = if payload == Uint128::ZERO {
            self.timestamp().wrapping_sub(1)
        } else {
            self.timestamp()
        };
        Self::from_fields(timestamp, payload.decrement().to_bytes())
    }

    /// Returns the 27-character base62 string representation stored in a stack-allocated string
    /// type that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// This method is primarily for `no_std` environments where heap-allocated string types are
    /// not readily available. Use the [`fmt::Display`] trait usually to get the string
    /// representation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ksuid::Ksuid;
    ///
    /// assert_eq!(&Ksuid::NIL.encode() as &str, "000000000000000000000000000");
    /// assert_eq!(&Ksuid::MAX.encode() as &str, "aWgEPTl1tmebfsQzFP4bxwgy80V");
    /// ```
    pub fn encode(&self) -> FStr<STRING_ENCODED_LENGTH> {
        let buffer = base62::encode(&self.0);
        debug_assert!(buffer.is_ascii());
        // SAFETY: the base62 alphabet is ASCII
        unsafe { FStr::from_bytes_unchecked(buffer) }
    }
}

/// Compares two KSUIDs in byte order, which is creation-time order with the payload as
/// tie-breaker.
pub fn compare(a: &Ksuid, b: &Ksuid) -> cmp::Ordering {
    a.cmp(b)
}

/// Sorts a slice of KSUIDs in ascending order.
pub fn sort(ids: &mut [Ksuid]) {
    ids.sort_unstable();
}

/// Returns `true` if a slice of KSUIDs is sorted in ascending order.
pub fn is_sorted(ids: &[Ksuid]) -> bool {
    ids.windows(2).all(|w| w[0] <= w[1])
}

impl fmt::Display for Ksuid {
    /// Returns the 27-character base62 string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Ksuid {
    type Err = Error;

    /// Creates an object from the 27-character base62 string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::parse(src)
    }
}

impl From<Ksuid> for [u8; BYTE_LENGTH] {
    fn from(src: Ksuid) -> Self {
        src.0
    }
}

impl From<[u8; BYTE_LENGTH]> for Ksuid {
    fn from(src: [u8; BYTE_LENGTH]) -> Self {
        Self(src)
    }
}

impl TryFrom<&[u8]> for Ksuid {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(src)
    }
}

impl AsRef<[u8]> for Ksuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
mod std_ext {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use super::{Ksuid, EPOCH_STAMP, PAYLOAD_LENGTH};
    use crate::{global_gen, Error, RandSource};

    impl Ksuid {
        /// Generates a new KSUID from the current time and the process-wide random source.
        ///
        /// # Panics
        ///
        /// Panics if the random source fails. Use [`Ksuid::new_random()`] to handle the failure.
        ///
        /// # Examples
        ///
        /// ```rust
        /// use ksuid::Ksuid;
        ///
        /// let x = Ksuid::new();
        /// println!("{}", x); // e.g., "0ujtsYcgvSTl8PAuAdqWYSMnLOv"
        /// ```
        pub fn new() -> Self {
            match Self::new_random() {
                Ok(id) => id,
                Err(err) => panic!("could not generate KSUID: {}", err),
            }
        }

        /// Generates a new KSUID from the current time and the process-wide random source.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Entropy`] if the random source fails.
        pub fn new_random() -> Result<Self, Error> {
            Self::new_random_with_time(SystemTime::now())
        }

        /// Generates a new KSUID from `time` and the process-wide random source.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Entropy`] if the random source fails.
        pub fn new_random_with_time(time: SystemTime) -> Result<Self, Error> {
            let mut payload = [0u8; PAYLOAD_LENGTH];
            global_gen::fill_payload(&mut payload)?;
            Ok(Self::from_fields(corrected_timestamp(time), payload))
        }

        /// Generates a new KSUID from `time` and a payload drawn from `source`.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Entropy`] if `source` fails.
        pub fn from_rand_source<S: RandSource + ?Sized>(
            source: &S,
            time: SystemTime,
        ) -> Result<Self, Error> {
            let mut payload = [0u8; PAYLOAD_LENGTH];
            source.fill_bytes(&mut payload)?;
            Ok(Self::from_fields(corrected_timestamp(time), payload))
        }

        /// Creates a KSUID from a point in time and a 16-byte payload.
        ///
        /// # Errors
        ///
        /// Returns [`Error::PayloadSize`] if `payload` is not exactly 16 bytes long.
        pub fn from_parts(time: SystemTime, payload: &[u8]) -> Result<Self, Error> {
            let payload =
                <[u8; PAYLOAD_LENGTH]>::try_from(payload).map_err(|_| Error::PayloadSize)?;
            Ok(Self::from_fields(corrected_timestamp(time), payload))
        }

        /// Returns the timestamp as a point in time (UTC, whole seconds).
        pub fn time(&self) -> SystemTime {
            UNIX_EPOCH + Duration::from_secs(self.unix_timestamp() as u64)
        }
    }

    /// Converts a point in time to the 32-bit timestamp field, wrapping outside its range.
    fn corrected_timestamp(time: SystemTime) -> u32 {
        let unix = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(err) => {
                let d = err.duration();
                -(d.as_secs() as i64) - i64::from(d.subsec_nanos() > 0)
            }
        };
        (unix - EPOCH_STAMP) as u32
    }

    impl From<Ksuid> for String {
        fn from(src: Ksuid) -> Self {
            src.to_string()
        }
    }

    impl TryFrom<String> for Ksuid {
        type Error = Error;

        fn try_from(src: String) -> Result<Self, Self::Error> {
            src.parse()
        }
    }

}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Ksuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Ksuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Ksuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Ksuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a KSUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Self::Value::parse(value).map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Self::Value::from_slice(value).map_err(de::Error::custom)
        }
    }

}
