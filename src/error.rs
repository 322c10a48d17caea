use trackable::error::{ErrorKind as TrackableErrorKind, TrackableError};

/// This crate specific `Error` type.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(TrackableError<ErrorKind>);

/// Possible error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structurally malformed input (bad start code, marker bit, flags or lengths).
    InvalidInput,

    /// A read went past the end of the available bytes.
    Truncated,

    /// Other errors.
    Other,
}
impl TrackableErrorKind for ErrorKind {}
