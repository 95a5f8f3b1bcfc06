//! Error types for hbcapture

use crate::storage::writer::WriterState;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hbcapture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hbcapture
#[derive(Error, Debug)]
pub enum Error {
    /// A mutating writer operation was attempted outside the Open state
    #[error("State error: cannot {operation} while writer is {state}")]
    State {
        operation: &'static str,
        state: WriterState,
    },

    /// Header, timestamp or data line text does not match its schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// A DATA segment was found without its paired HEADER file
    #[error(
        "Missing header file {} for data file {}",
        .header.display(),
        .data.display()
    )]
    MissingHeader { header: PathBuf, data: PathBuf },

    /// Header finalization requested for a segment that never saw a line
    #[error("Segment {index} has no lines; its time range is undefined")]
    EmptySegment { index: u64 },

    /// Header record could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid capture line
    #[error("Invalid line: {0}")]
    InvalidLine(String),

    /// IO errors tied to a specific file or directory
    #[error("IO error on {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Build a closure that attaches `path` to an IO error, for use with `map_err`.
    pub fn file(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::File { path, source }
    }
}
