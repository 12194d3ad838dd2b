//! A single heap block with a tracked used size.
//!
//! A [`Block`] is a zeroed `Vec<u8>` sized to its size class plus a used
//! cursor. Array views into the block extend the cursor in place; the
//! cursor only grows from its exact current position, so a view that
//! does not end at the used end cannot stomp on bytes another view owns.

use sprawl_core::BlockAttrs;

/// One contiguous allocation.
///
/// Blocks are never freed by the heap. Their bytes stay valid for as long
/// as the heap lives.
pub struct Block {
    /// Backing storage. Allocated to full capacity at creation.
    data: Vec<u8>,
    /// Bytes in use, measured from the block start.
    used: usize,
    attrs: BlockAttrs,
}

impl Block {
    /// Create a zeroed block of `capacity` bytes with `used` bytes in use.
    ///
    /// `used` is clamped to `capacity`.
    pub fn new(capacity: usize, used: usize, attrs: BlockAttrs) -> Self {
        Self {
            data: vec![0; capacity],
            used: used.min(capacity),
            attrs,
        }
    }

    /// Grow the used size from exactly `old_end` to `new_end`.
    ///
    /// Returns `false` without change if the used size is not `old_end`,
    /// `new_end` is below `old_end`, or `new_end` exceeds the capacity.
    pub fn try_extend(&mut self, old_end: usize, new_end: usize) -> bool {
        if self.used != old_end || new_end < old_end || new_end > self.data.len() {
            return false;
        }
        self.used = new_end;
        true
    }

    /// Set the used size. Returns `false` if `used` exceeds the capacity.
    pub fn set_used(&mut self, used: usize) -> bool {
        if used > self.data.len() {
            return false;
        }
        self.used = used;
        true
    }

    /// Shared view of `len` bytes at `offset`, or `None` past the capacity.
    pub fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.data.get(offset..end)
    }

    /// Mutable view of `len` bytes at `offset`, or `None` past the capacity.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(len)?;
        self.data.get_mut(offset..end)
    }

    /// Bytes in use.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes left past the used end.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.used
    }

    /// Block attributes.
    pub fn attrs(&self) -> BlockAttrs {
        self.attrs
    }

    /// Drop the given attributes.
    pub fn clear_attrs(&mut self, attrs: BlockAttrs) {
        self.attrs.remove(attrs);
    }
}
