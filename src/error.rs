use std::error::Error;
use std::fmt;

/// Network construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Fewer than two layer sizes were supplied.
    TooFewLayers(usize),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::TooFewLayers(n) => write!(
                f,
                "cannot initialize a network with {} layer sizes; at least 2 are required",
                n
            ),
        }
    }
}

impl Error for NetworkError {}

/// Decode failures for the IDX example format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A file's magic number did not match the expected value.
    BadMagic { expected: u32, found: u32 },
    /// Image and label files disagree on the number of records.
    CountMismatch { images: u32, labels: u32 },
    /// A label byte is outside the one-hot output range.
    BadLabel(u8),
    /// The file ended before the declared records.
    Truncated,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::BadMagic { expected, found } => {
                write!(f, "incorrect magic number: expected {}, found {}", expected, found)
            }
            DecodeError::CountMismatch { images, labels } => write!(
                f,
                "record counts do not match: {} images vs {} labels",
                images, labels
            ),
            DecodeError::BadLabel(b) => write!(f, "label {} exceeds the one-hot range", b),
            DecodeError::Truncated => write!(f, "file is shorter than its header declares"),
        }
    }
}

impl Error for DecodeError {}
