//! Heap configuration parameters.

use crate::error::HeapError;

/// Configuration for the block heap.
///
/// Controls size classes, the total capacity budget and whether blocks
/// may grow in place. Validated at heap construction; immutable after.
#[derive(Clone, Debug)]
pub struct HeapConfig {
    /// Smallest block capacity in bytes.
    ///
    /// Default: 16. Must be a power of two.
    pub min_block_bytes: usize,

    /// Page size in bytes.
    ///
    /// Requests below a page round up to the next power of two; larger
    /// ones round up to a page multiple. Default: 4096. Must be a power
    /// of two and at least `min_block_bytes`.
    pub page_bytes: usize,

    /// Total block capacity the heap may hand out, in bytes.
    ///
    /// Default: 1 GiB. Allocations past the budget report exhaustion.
    pub max_heap_bytes: usize,

    /// Whether blocks may grow in place.
    ///
    /// Default: true. When false, every in-place expansion is refused and
    /// growth always relocates.
    pub allow_in_place: bool,
}

impl HeapConfig {
    /// Default smallest size class.
    pub const DEFAULT_MIN_BLOCK_BYTES: usize = 16;

    /// Default page size.
    pub const DEFAULT_PAGE_BYTES: usize = 4096;

    /// Default capacity budget: 1 GiB.
    pub const DEFAULT_MAX_HEAP_BYTES: usize = 1 << 30;

    /// Create a config with default values and the given capacity budget.
    pub fn new(max_heap_bytes: usize) -> Self {
        Self {
            min_block_bytes: Self::DEFAULT_MIN_BLOCK_BYTES,
            page_bytes: Self::DEFAULT_PAGE_BYTES,
            max_heap_bytes,
            allow_in_place: true,
        }
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), HeapError> {
        if !self.min_block_bytes.is_power_of_two() {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "min_block_bytes ({}) must be a power of two",
                    self.min_block_bytes
                ),
            });
        }
        if !self.page_bytes.is_power_of_two() || self.page_bytes < self.min_block_bytes {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "page_bytes ({}) must be a power of two >= min_block_bytes ({})",
                    self.page_bytes, self.min_block_bytes
                ),
            });
        }
        Ok(())
    }

    /// Block capacity used for a request of `bytes`, or `None` if
    /// rounding overflows.
    pub fn size_class(&self, bytes: usize) -> Option<usize> {
        if bytes <= self.min_block_bytes {
            return Some(self.min_block_bytes);
        }
        if bytes < self.page_bytes {
            return bytes.checked_next_power_of_two();
        }
        let mask = self.page_bytes - 1;
        Some(bytes.checked_add(mask)? & !mask)
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_HEAP_BYTES)
    }
}
