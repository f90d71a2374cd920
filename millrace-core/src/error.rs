/// Millrace Error Types
///
/// Error handling for all engine operations.
use std::io;
use thiserror::Error;

/// Main error type for millrace operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while spawning a process thread
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// User logic referenced a port name absent from its table
    #[error("unknown port: {process}.{port}")]
    UnknownPort {
        /// Name of the process whose table was consulted
        process: String,
        /// The missing port name
        port: String,
    },

    /// Non-blocking receive found no packet; recoverable
    #[error("port not ready for recv")]
    NotReady,

    /// The sender closed and every buffered packet has been drained
    #[error("end of stream")]
    EndOfStream,

    /// Send on a connection whose half has been closed
    #[error("connection closed")]
    ClosedConnection,

    /// User logic returned an error or panicked
    #[error("user logic failed: {0}")]
    UserLogic(String),
}

/// Result type alias for millrace operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an unknown-port error for a process/port pair
    pub fn unknown_port(process: impl Into<String>, port: impl Into<String>) -> Self {
        Self::UnknownPort {
            process: process.into(),
            port: port.into(),
        }
    }

    /// True for the recoverable not-ready condition from a non-blocking receive
    #[must_use]
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// True when the upstream sender has closed and the buffer is drained
    #[must_use]
    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        assert!(Error::NotReady.is_not_ready());
        assert!(!Error::NotReady.is_end_of_stream());
        assert!(Error::EndOfStream.is_end_of_stream());
        assert!(!Error::ClosedConnection.is_not_ready());
    }

    #[test]
    fn unknown_port_display_names_both_sides() {
        let err = Error::unknown_port("merge", "in");
        assert_eq!(err.to_string(), "unknown port: merge.in");
    }
}
