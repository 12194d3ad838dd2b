//! Mutability classes of array views.

use std::fmt;

/// How an array view may be accessed.
///
/// Only [`Mutability::Shared`] changes how the array machinery talks to
/// the allocator: every used-size interaction for a shared array passes
/// the atomic flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Thread-local, writable.
    Mutable,
    /// Read-only through this view; other views may write.
    Const,
    /// Never written after construction.
    Immutable,
    /// Visible to several threads; allocator calls are atomic.
    Shared,
}

impl Mutability {
    /// Whether allocator interactions for this class must be atomic.
    pub fn is_atomic(self) -> bool {
        matches!(self, Self::Shared)
    }

    /// Whether element bytes may be written through a view of this class.
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Mutable | Self::Shared)
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mutable => "mutable",
            Self::Const => "const",
            Self::Immutable => "immutable",
            Self::Shared => "shared",
        };
        f.write_str(name)
    }
}
