//! Error types for Sprawl arrays.
//!
//! Split by how the caller is expected to react:
//!
//! - [`AllocFailure`] is never returned. It is handed to a
//!   [`FatalHandler`](crate::FatalHandler), which does not return.
//! - [`ArrayError`] is returned from growth and concatenation and may be
//!   inspected and recovered from.
//! - [`HookError`] is what an element hook reports; it arrives wrapped in
//!   [`ArrayError::ElementConstructionFailure`].
//! - [`TypeInfoError`] rejects an inconsistent element type description.

use std::error::Error;
use std::fmt;

use crate::id::BlockPtr;
use crate::mutability::Mutability;

/// An out-of-memory condition. Never recovered from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocFailure {
    /// `count × element_size` does not fit in `usize`.
    ByteSizeOverflow {
        /// Size of one element in bytes.
        element_size: usize,
        /// Requested element count.
        count: usize,
    },
    /// The summed lengths of concatenation sources do not fit in `usize`.
    LengthOverflow {
        /// Number of sources being concatenated.
        sources: usize,
    },
    /// The allocator could not supply a block of the requested size.
    Exhausted {
        /// Number of bytes requested.
        requested: usize,
    },
}

impl fmt::Display for AllocFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByteSizeOverflow {
                element_size,
                count,
            } => {
                write!(
                    f,
                    "array byte size overflows: {count} elements of {element_size} bytes"
                )
            }
            Self::LengthOverflow { sources } => {
                write!(f, "concatenated length of {sources} sources overflows")
            }
            Self::Exhausted { requested } => {
                write!(f, "allocator exhausted: requested {requested} bytes")
            }
        }
    }
}

impl Error for AllocFailure {}

/// Failure reported by an element hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookError {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl HookError {
    /// Create a hook error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl Error for HookError {}

/// Recoverable errors from array growth and concatenation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// An element hook failed. Elements before `index` in the destination
    /// remain constructed; nothing is rolled back.
    ElementConstructionFailure {
        /// Destination index of the element whose hook failed.
        index: usize,
        /// The hook's error.
        source: HookError,
    },
    /// A source's element type differs from the destination's.
    TypeMismatch {
        /// Name of the destination element type.
        expected: String,
        /// Name of the offending source element type.
        found: String,
    },
    /// A scalar source's byte length is not exactly one element.
    ScalarSize {
        /// Element size in bytes.
        expected: usize,
        /// Byte length supplied.
        found: usize,
    },
    /// A raw sequence's byte length is not a whole number of elements.
    Misaligned {
        /// Byte length supplied.
        len: usize,
        /// Element size in bytes.
        element_size: usize,
    },
    /// Attempted to write through a view whose class forbids it.
    NotWritable {
        /// Mutability class of the view.
        mutability: Mutability,
    },
    /// Element index outside the view.
    OutOfBounds {
        /// Requested index.
        index: usize,
        /// Length of the view.
        len: usize,
    },
    /// The allocator does not recognise the bytes a view refers to.
    InvalidView {
        /// Data pointer of the view.
        ptr: BlockPtr,
        /// Byte length of the view.
        len: usize,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementConstructionFailure { index, source } => {
                write!(f, "construction of element {index} failed: {source}")
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "element type mismatch: expected {expected}, found {found}")
            }
            Self::ScalarSize { expected, found } => {
                write!(f, "scalar is {found} bytes, element size is {expected}")
            }
            Self::Misaligned { len, element_size } => {
                write!(
                    f,
                    "{len} bytes is not a whole number of {element_size}-byte elements"
                )
            }
            Self::NotWritable { mutability } => {
                write!(f, "{mutability} array is not writable")
            }
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::InvalidView { ptr, len } => {
                write!(f, "{ptr} with {len} bytes is not backed by the allocator")
            }
        }
    }
}

impl Error for ArrayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ElementConstructionFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Rejections from [`TypeInfoBuilder::build`](crate::TypeInfoBuilder::build).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeInfoError {
    /// Element size of zero.
    ZeroSize {
        /// Type name.
        name: String,
    },
    /// Initializer length differs from the element size.
    InitializerSize {
        /// Type name.
        name: String,
        /// Element size in bytes.
        expected: usize,
        /// Initializer length in bytes.
        found: usize,
    },
    /// `DefaultConstruct` supplied as the type's copy policy.
    NotACopyPolicy {
        /// Type name.
        name: String,
    },
}

impl fmt::Display for TypeInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize { name } => write!(f, "type '{name}' has zero size"),
            Self::InitializerSize {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "type '{name}' initializer is {found} bytes, element size is {expected}"
                )
            }
            Self::NotACopyPolicy { name } => {
                write!(f, "type '{name}': default-construct is not a copy policy")
            }
        }
    }
}

impl Error for TypeInfoError {}
