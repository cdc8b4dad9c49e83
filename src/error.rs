//! Error taxonomy for the reader and writer.

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Error type returned by every fallible operation in this crate.
///
/// Each variant corresponds to exactly one cause class from the taxonomy:
/// usage errors, format errors, search misses, capacity errors and
/// transport errors propagated from the caller's byte source/sink.
pub enum Error {
    /// A call was made before `init`/`create` succeeded, or after the
    /// context was otherwise left uninitialised.
    #[error("context is not initialised")]
    Uninit,
    /// A required pointer/slice argument was null or empty.
    #[error("invalid argument")]
    BadArg,
    /// An index was out of range for the table being addressed.
    #[error("index {index} out of range (count {count})")]
    BadIndex {
        /// The index that was requested.
        index: u64,
        /// The valid count at the time of the request.
        count: u64,
    },
    /// The identification prefix did not start with `7F 45 4C 46`.
    #[error("bad ELF magic")]
    BadMagic,
    /// The identification or header version byte was not `1`.
    #[error("unsupported ELF version {0}")]
    BadVersion(u8),
    /// The identification class byte was `NONE` or out of range.
    #[error("bad ELF class {0}")]
    BadClass(u8),
    /// The identification data-encoding byte was `NONE` or out of range.
    #[error("bad ELF data encoding {0}")]
    BadEndianness(u8),
    /// A header/entry size field did not match the class-specific expected size.
    #[error("bad size: expected {expected}, got {actual}")]
    BadSize {
        /// The size mandated by the file's class.
        expected: u64,
        /// The size actually present in the file.
        actual: u64,
    },
    /// A table's offset/count relationship was inconsistent (e.g. a non-zero
    /// count with a zero offset).
    #[error("bad header layout")]
    BadHeader,
    /// A decoded structure violated a type-specific structural invariant
    /// (e.g. a `COMPRESSED` section also flagged `ALLOC`).
    #[error("malformed ELF structure")]
    BadFormat,
    /// A by-name or by-address search completed with no match.
    #[error("not found")]
    NotFound,
    /// A string did not terminate within the caller-provided buffer length.
    #[error("buffer overflow reading string")]
    BufferOverflow,
    /// The byte source reported a short read at end of data.
    #[error("unexpected end of input")]
    IoEof,
    /// The byte source/sink reported a failure other than EOF.
    #[error("I/O error")]
    IoError,
    /// The writer could not allocate memory for a requested operation.
    #[error("allocation failed")]
    NoMem,
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
