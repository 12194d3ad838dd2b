//! Heap activity counters.
//!
//! [`HeapStats`] is cumulative over the heap's lifetime. Tests read it to
//! check which allocator paths a growth took; telemetry can sample it.

/// Cumulative allocation and expansion counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Number of successful `allocate` calls.
    pub allocations: u64,
    /// Number of `allocate` calls that reported exhaustion.
    pub exhausted: u64,
    /// Sum of bytes requested by successful allocations.
    pub allocated_bytes: usize,
    /// Sum of block capacities handed out.
    pub capacity_bytes: usize,
    /// Number of `try_expand_in_place` calls.
    pub expand_attempts: u64,
    /// Number of in-place expansions granted.
    pub expand_successes: u64,
    /// Number of in-place expansions refused.
    pub refused_expansions: u64,
    /// Number of `try_expand_in_place` calls made with the atomic flag set.
    pub atomic_expansions: u64,
    /// Number of `set_used_bytes` calls made with the atomic flag set.
    pub atomic_used_updates: u64,
    /// Number of elements finalized via `finalize_block`.
    pub finalized_elements: u64,
}
