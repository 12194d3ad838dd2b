//! Growth counters.
//!
//! [`GrowthStats`] records which state each resize ended in. It is owned
//! by a [`GrowthEngine`](crate::GrowthEngine) and cumulative over its life.

use std::fmt;

/// The state a single resize took.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrowthPath {
    /// New length not above the old one: the view was narrowed.
    Truncate,
    /// The array had no storage: a fresh block was allocated.
    FreshAllocate,
    /// The allocator grew the existing block.
    InPlaceExpand,
    /// A new block was allocated and the elements moved into it.
    ReallocateAndMigrate,
}

impl fmt::Display for GrowthPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Truncate => "truncate",
            Self::FreshAllocate => "fresh-allocate",
            Self::InPlaceExpand => "in-place-expand",
            Self::ReallocateAndMigrate => "reallocate-and-migrate",
        };
        f.write_str(name)
    }
}

/// Cumulative per-path counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Resizes that narrowed the view.
    pub truncations: u64,
    /// Resizes that allocated storage for an empty array.
    pub fresh_allocations: u64,
    /// Resizes that grew the block in place.
    pub in_place_expansions: u64,
    /// Resizes that relocated the array.
    pub reallocations: u64,
    /// Bytes of existing elements moved by relocations.
    pub bytes_migrated: usize,
}

impl GrowthStats {
    /// Count one resize that took `path`.
    pub fn record(&mut self, path: GrowthPath) {
        match path {
            GrowthPath::Truncate => self.truncations += 1,
            GrowthPath::FreshAllocate => self.fresh_allocations += 1,
            GrowthPath::InPlaceExpand => self.in_place_expansions += 1,
            GrowthPath::ReallocateAndMigrate => self.reallocations += 1,
        }
    }

    /// Total resizes recorded.
    pub fn total(&self) -> u64 {
        self.truncations + self.fresh_allocations + self.in_place_expansions + self.reallocations
    }
}
