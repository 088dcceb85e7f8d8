//! K-Sortable Unique IDentifiers (KSUIDs)
//!
//! ```rust
//! use ksuid::ksuid;
//!
//! let id = ksuid();
//! println!("{}", id); // e.g. "0ujtsYcgvSTl8PAuAdqWYSMnLOv"
//! println!("{:?}", id.as_bytes()); // as 20-byte array
//! ```
//!
//! # Field and bit layout
//!
//! A KSUID is a 20-byte identifier with the following layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                                                               +
//! |                                                               |
//! +                            payload                            +
//! |                                                               |
//! +                                                               +
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 32-bit `timestamp` field holds whole seconds since 2014-05-13T16:53:20Z (Unix time
//!   1,400,000,000), as a big-endian unsigned integer.
//! - The 128-bit `payload` field is filled with cryptographically strong random bytes.
//!
//! The text form is the 160-bit number written in base62 with exactly 27 characters. Both the
//! binary and the text form sort in creation-time order at one-second resolution.
//!
//! # Other features
//!
//! [`Sequence`] derives up to 65536 ordered ids from one seed, and [`CompressedSet`] stores
//! sorted collections of ids, especially those from sequences, in far fewer bytes:
//!
//! ```rust
//! use ksuid::{CompressedSet, Ksuid, Sequence};
//!
//! let seq = Sequence::new(Ksuid::new());
//! let ids = [seq.next()?, seq.next()?, Ksuid::new()];
//! let set = CompressedSet::compress(&ids);
//! for id in &set {
//!     println!("{}", id);
//! }
//! # Ok::<(), ksuid::Error>(())
//! ```
//!
//! # Crate features
//!
//! Default features:
//!
//! - `std` enables the process-wide random source, generation from the system clock, and
//!   conversions from and to [`String`].
//!
//! Optional features:
//!
//! - `serde` enables serialization and deserialization of [`Ksuid`] and [`CompressedSet`].

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod error;
pub use error::Error;

mod uint128;
pub use uint128::Uint128;

pub mod base62;

mod id;
pub use id::{
    compare, is_sorted, sort, Ksuid, BYTE_LENGTH, EPOCH_STAMP, MAX_STRING_ENCODED, PAYLOAD_LENGTH,
    STRING_ENCODED_LENGTH, TIMESTAMP_LENGTH,
};

mod sequence;
pub use sequence::Sequence;

mod set;
pub use set::{CompressedSet, Iter};

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
mod generator;
#[cfg(feature = "std")]
pub use generator::{with_rand08, OsRandSource, RandSource};

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
mod global_gen;
#[cfg(feature = "std")]
pub use global_gen::{ksuid, rand_source, set_rand_source, ThreadRandSource};
