//! Error types for codec operations

use thiserror::Error;

/// Error type raised by the document, block, and varint codecs.
///
/// Every variant represents either rejected untrusted input or a value that
/// cannot be represented on the wire. No error is retried internally: a
/// malformed message fails at the point of detection and the caller decides
/// what to do with the connection.
#[derive(Error, Debug)]
pub enum Error {
    #[error("not a PCOS message: bad magic")]
    BadMagic,
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),
    #[error("run out of input bytes: incomplete or corrupted message")]
    TruncatedInput,
    #[error("malformed varint")]
    MalformedVarint,
    #[error("length exceeded: {0} > {1}")]
    LengthExceeded(usize, usize), // found, max
    #[error("argument out of range: {0}")]
    ArgOutOfRange(String),
    #[error("required block '{0}' not found in message")]
    BlockNotFound(String),
    #[error("string field is not valid UTF-8")]
    BadCharEncoding,
    #[error("value does not fit in unsigned varint base-{0}")]
    OutOfRange(u32),
    #[error("internal error: {0}")]
    InternalError(&'static str),
}
