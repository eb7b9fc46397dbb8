//! Error type of the chapter readers.
//!
use std::io;

use thiserror::Error;

/// Why a chapter read produced no chapters.
///
/// A chapter list is either complete or absent: when a reader returns
/// an error, nothing it decoded before the failure is kept.
#[derive(Debug, Error)]
pub enum ChapterError {
    /// The structure that holds the chapters is not there.
    #[error("no chapters: {0}")]
    NotFound(&'static str),

    /// The structure is there but does not have the expected shape.
    #[error("malformed chapter data: {0}")]
    Malformed(String),

    /// The byte source could not be opened or read.
    #[error("i/o error: {0}")]
    Io(io::Error),
}

impl ChapterError {
    pub fn malformed(reason: impl Into<String>) -> ChapterError {
        ChapterError::Malformed(reason.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ChapterError::NotFound(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ChapterError::Malformed(_))
    }
}

/// Truncated and invalid data are malformed input, the rest is I/O.
impl From<io::Error> for ChapterError {
    fn from(err: io::Error) -> ChapterError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => {
                ChapterError::Malformed(err.to_string())
            },
            _ => ChapterError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChapterError>;
