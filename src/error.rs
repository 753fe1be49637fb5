//! Error types for the ring engine

use std::fmt;

/// Result type alias for ring engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while distributing, evolving or collecting a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration invariant violated before the run started
    InvalidConfig(String),

    /// A board, block or scratch buffer could not be allocated
    AllocationFailed {
        /// What was being allocated
        what: &'static str,
        /// Number of bytes requested
        bytes: usize,
    },

    /// Halo send failed
    SendError(String),

    /// Non-blocking send found the channel full
    ChannelFull,

    /// Halo receive failed
    ReceiveError(String),

    /// A halo message arrived out of order or with the wrong shape
    ProtocolViolation(String),

    /// Worker panicked
    WorkerPanicked(String),

    /// Blocks handed to the collector do not form a board
    PartitionError(String),

    /// Other error
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::AllocationFailed { what, bytes } => {
                write!(f, "Failed to allocate {} ({} bytes)", what, bytes)
            }
            Error::SendError(msg) => write!(f, "Halo send error: {}", msg),
            Error::ChannelFull => write!(f, "Channel is full"),
            Error::ReceiveError(msg) => write!(f, "Halo receive error: {}", msg),
            Error::ProtocolViolation(msg) => write!(f, "Halo protocol violation: {}", msg),
            Error::WorkerPanicked(msg) => write!(f, "Worker panicked: {}", msg),
            Error::PartitionError(msg) => write!(f, "Partitioning error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<flume::RecvError> for Error {
    fn from(err: flume::RecvError) -> Self {
        Error::ReceiveError(err.to_string())
    }
}

impl From<crossbeam::channel::RecvError> for Error {
    fn from(err: crossbeam::channel::RecvError) -> Self {
        Error::ReceiveError(err.to_string())
    }
}

/// Allocate a zeroed cell buffer, reporting failure instead of aborting.
pub(crate) fn alloc_cells(what: &'static str, len: usize) -> Result<Vec<bool>> {
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<bool>()),
        })?;
    cells.resize(len, false);
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_cells_zeroed() {
        let cells = alloc_cells("test buffer", 12).unwrap();
        assert_eq!(cells.len(), 12);
        assert!(cells.iter().all(|&c| !c));
    }

    #[test]
    fn test_alloc_failure_reported() {
        let err = alloc_cells("huge buffer", usize::MAX).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { what: "huge buffer", .. }));
    }

    #[test]
    fn test_display_names_invariant() {
        let err = Error::InvalidConfig("rows (10) not divisible by workers (4)".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: rows (10) not divisible by workers (4)"
        );
    }
}
