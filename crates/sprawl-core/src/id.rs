//! Strongly-typed block identifiers and addresses.

use std::fmt;

/// Identifies a block owned by a [`BlockAllocator`](crate::BlockAllocator).
///
/// Blocks are numbered in allocation order. An allocator never reuses
/// an id for a different block while any [`BlockPtr`] to it may exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// An address inside a block: the block plus a byte offset into it.
///
/// This is the data pointer of an array view. A view that starts in the
/// middle of a block (e.g. a slice of a larger array) carries a non-zero
/// offset; all byte counts exchanged with the allocator for such a view
/// are measured from this address, not from the block start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockPtr {
    /// The block this address points into.
    pub block: BlockId,
    /// Byte offset from the start of the block.
    pub offset: usize,
}

impl BlockPtr {
    /// Create an address at `offset` bytes into `block`.
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }

    /// The address of the first byte of `block`.
    pub fn start(block: BlockId) -> Self {
        Self { block, offset: 0 }
    }

    /// Advance the address by `bytes`, or `None` on offset overflow.
    pub fn add(self, bytes: usize) -> Option<Self> {
        Some(Self {
            block: self.block,
            offset: self.offset.checked_add(bytes)?,
        })
    }
}

impl fmt::Display for BlockPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockPtr(block={}, off={})", self.block, self.offset)
    }
}
