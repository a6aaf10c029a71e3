use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::str::Utf8Error;

use thiserror::Error;

/// Errors raised while encoding or decoding binlog data.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The byte stream ended before the structure was complete.
    #[error("byte stream is incomplete: {0}")]
    Incomplete(Needed),

    /// The bytes are complete but do not form a valid structure.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Utf8(#[from] Utf8Error),

    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
}

impl CodecError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        CodecError::InvalidData(message.into())
    }
}

/// Information on the data needed when a decoder returns
/// [`CodecError::Incomplete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Needed {
    /// More data is needed, amount unknown.
    Unknown,
    /// At least this many more bytes are needed.
    Bytes(usize),
}

impl fmt::Display for Needed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Needed::Unknown => write!(f, "need more bytes"),
            Needed::Bytes(n) => write!(f, "need {} more bytes", n),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        let err = CodecError::Incomplete(Needed::Bytes(4));
        assert_eq!(err.to_string(), "byte stream is incomplete: need 4 more bytes");
        let err = CodecError::invalid("bad tag");
        assert_eq!(err.to_string(), "invalid data: bad tag");
    }
}
