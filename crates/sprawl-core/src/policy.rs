//! Per-element-type copy policy.

use std::fmt;

/// How elements of a type are materialized into destination memory.
///
/// A closed set: the array machinery dispatches on it with a single
/// `match` per element run. The first three variants describe how an
/// existing element is duplicated; `DefaultConstruct` describes how a
/// previously unoccupied slot is filled and is never a type's copy policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CopyPolicy {
    /// Raw byte copy, no hook.
    Trivial,
    /// Raw byte copy followed by the after-copy hook on each element.
    Postblit,
    /// Each destination element built from its source by the fallible
    /// copy-construction hook. Never byte-copied.
    CopyConstruct,
    /// Each slot built from the type's default value by the
    /// default-construction hook.
    DefaultConstruct,
}

impl CopyPolicy {
    /// Whether elements can be duplicated with a plain byte copy.
    pub fn is_trivial(self) -> bool {
        matches!(self, Self::Trivial)
    }

    /// Whether this policy may describe how a type's elements are copied.
    pub fn is_copy_policy(self) -> bool {
        !matches!(self, Self::DefaultConstruct)
    }
}

impl fmt::Display for CopyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trivial => "trivial",
            Self::Postblit => "postblit",
            Self::CopyConstruct => "copy-construct",
            Self::DefaultConstruct => "default-construct",
        };
        f.write_str(name)
    }
}
