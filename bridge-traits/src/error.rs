use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Integrity check failed: {0}")]
    IntegrityFault(String),

    #[error("Offset {offset} is outside the source (length {len})")]
    OutOfBounds { offset: u64, len: u64 },

    #[error("Stream already closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` if the error is a chunk authentication failure.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(self, BridgeError::IntegrityFault(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_classification() {
        assert!(BridgeError::IntegrityFault("chunk 3".into()).is_integrity_fault());
        assert!(!BridgeError::OperationFailed("seek".into()).is_integrity_fault());
        assert!(!BridgeError::Io(std::io::Error::other("disk")).is_integrity_fault());
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = BridgeError::OutOfBounds { offset: 10, len: 4 };
        assert_eq!(err.to_string(), "Offset 10 is outside the source (length 4)");
    }
}
