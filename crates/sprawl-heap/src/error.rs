//! Heap-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while setting up a heap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// A configuration value is out of range.
    InvalidConfig {
        /// Description of the offending value.
        reason: String,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid heap config: {reason}"),
        }
    }
}

impl Error for HeapError {}
