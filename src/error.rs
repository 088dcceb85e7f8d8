/// Errors returned by the fallible KSUID constructors, the base62 decoder, [`Sequence`] and the
/// [`CompressedSet`] iterator.
///
/// [`Sequence`]: crate::Sequence
/// [`CompressedSet`]: crate::CompressedSet
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The binary representation is not exactly 20 bytes long.
    #[error("valid KSUIDs are 20 bytes")]
    Size,

    /// The string representation is not exactly 27 characters long.
    #[error("valid encoded KSUIDs are 27 characters")]
    StringSize,

    /// The payload given to a constructor is not exactly 16 bytes long.
    #[error("valid KSUID payloads are 16 bytes")]
    PayloadSize,

    /// The string representation contains a character outside the base62 alphabet.
    #[error("invalid base62 character in encoded KSUID")]
    InvalidCharacter,

    /// The string representation encodes a value that does not fit in 160 bits.
    #[error("encoded KSUID is out of range")]
    Overflow,

    /// The sequence already produced all of its 65536 ids.
    #[error("too many IDs were generated")]
    SequenceExhausted,

    /// The compressed set contains an unknown tag or a truncated record.
    #[error("KSUID set is malformed")]
    MalformedSet,

    /// The random source failed to produce bytes.
    #[error("could not read random bytes for KSUID payload")]
    Entropy,
}
