//! # Reader Error Types
//!
//! `read_at` never surfaces these; they exist for construction and for the
//! opt-in `try_read_at` channel, which tells end-of-data apart from a fill
//! that produced nothing.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur while opening or reading from a random-access reader.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Configuration failed validation.
    #[error("Invalid reader configuration: {0}")]
    InvalidConfig(String),

    /// The decrypting source could not report its length or open a stream.
    #[error("Decrypting source error: {0}")]
    Source(#[from] BridgeError),

    /// The fill worker pool could not be started.
    #[error("Failed to start fill workers: {0}")]
    WorkerPool(String),

    /// The reader was closed.
    #[error("Reader is closed")]
    Closed,

    /// A cache miss fill did not produce the requested position.
    #[error(
        "Fill for position {position} produced no data \
         ({integrity_faults} integrity faults, {io_faults} I/O faults)"
    )]
    FillFailed {
        /// Position the caller asked for.
        position: u64,
        /// Workers that hit an integrity fault.
        integrity_faults: usize,
        /// Workers that hit any other fault.
        io_faults: usize,
    },
}

impl ReaderError {
    /// Returns `true` if the failure was caused by tampered or corrupted content.
    pub fn is_integrity_fault(&self) -> bool {
        match self {
            ReaderError::FillFailed {
                integrity_faults, ..
            } => *integrity_faults > 0,
            ReaderError::Source(err) => err.is_integrity_fault(),
            _ => false,
        }
    }

    /// Returns `true` if retrying the same read may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ReaderError::FillFailed {
                integrity_faults,
                io_faults,
                ..
            } => *integrity_faults == 0 && *io_faults > 0,
            ReaderError::Source(err) => !err.is_integrity_fault(),
            _ => false,
        }
    }
}

/// Result type for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;
