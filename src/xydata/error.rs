//! Custom error types for the xydata-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// There are exactly two kinds of failure and they are disjoint:
///
/// - [`Error::Format`] means the byte/character stream does not match the
///   structural expectations of the format currently being decoded (bad
///   magic value, truncated record, value out of range). During guessing it
///   makes the next candidate format be tried; during an explicit load it is
///   fatal to that load and carries the format name for context.
/// - [`Error::Runtime`] is everything else: I/O failure, missing file,
///   unsupported format name, index out of range, invalid option keyword.
///   It is never silently retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream does not look like the format being decoded.
    #[error("format error: {0}")]
    Format(String),

    /// Any failure that is not a mismatch between stream and format.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// True for the recoverable kind that guessing treats as "try the next
    /// candidate".
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

/// Errors raised while opening files or reading whole streams are runtime
/// errors; short reads inside decode routines are reported as format errors
/// by the decoding primitives themselves.
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Runtime(format!("I/O error: {}", e))
    }
}

/// A convenience `Result` type alias using the crate's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;
