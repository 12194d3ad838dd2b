//! Collaborator traits consumed by the array machinery.

use std::sync::Arc;

use crate::attrs::BlockAttrs;
use crate::error::AllocFailure;
use crate::id::BlockPtr;
use crate::types::TypeInfo;

/// The GC-owned heap as seen by array growth and concatenation.
///
/// Byte counts passed alongside a [`BlockPtr`] are measured from that
/// address, so a view starting mid-block talks about its own bytes. The
/// array machinery never frees a block; abandoned blocks are left for
/// the collector.
///
/// Implementations decide how to honour the `atomic` flag. It is set for
/// every used-size interaction on behalf of a
/// [`Shared`](crate::Mutability::Shared) array.
pub trait BlockAllocator {
    /// Allocate a block of at least `bytes` bytes whose used size is
    /// `bytes`. Returns `None` when the heap is exhausted.
    fn allocate(&mut self, bytes: usize, attrs: BlockAttrs) -> Option<BlockPtr>;

    /// Grow the used size of the block behind `ptr` from `old_used` to
    /// `new_used` without moving it.
    ///
    /// May refuse for any reason, including when capacity would allow it.
    /// Callers must fall back to allocate-and-copy on `false`.
    fn try_expand_in_place(
        &mut self,
        ptr: BlockPtr,
        old_used: usize,
        new_used: usize,
        atomic: bool,
    ) -> bool;

    /// Attributes of the block behind `ptr` (empty if unknown).
    fn query_attributes(&self, ptr: BlockPtr) -> BlockAttrs;

    /// Used bytes of the block past `ptr`, or `None` if `ptr` is unknown.
    fn used_bytes(&self, ptr: BlockPtr, atomic: bool) -> Option<usize>;

    /// Set the used bytes of the block past `ptr`. Returns `false` if
    /// `ptr` is unknown or `used` exceeds the block's capacity.
    fn set_used_bytes(&mut self, ptr: BlockPtr, used: usize, atomic: bool) -> bool;

    /// Capacity of the block past `ptr`, or `None` if `ptr` is unknown.
    fn capacity_bytes(&self, ptr: BlockPtr) -> Option<usize>;

    /// Read `len` bytes at `ptr`.
    fn bytes(&self, ptr: BlockPtr, len: usize) -> Option<&[u8]>;

    /// Write access to `len` bytes at `ptr`.
    fn bytes_mut(&mut self, ptr: BlockPtr, len: usize) -> Option<&mut [u8]>;

    /// Read `src_len` bytes at `src` while writing `dst_len` bytes at
    /// `dst`. Returns `None` if either range is invalid or both lie in
    /// the same block.
    fn split_regions(
        &mut self,
        src: BlockPtr,
        src_len: usize,
        dst: BlockPtr,
        dst_len: usize,
    ) -> Option<(&[u8], &mut [u8])>;

    /// Record that the block behind `ptr` holds elements of `ty` whose
    /// finalizer must run before reclamation.
    fn register_finalizer(&mut self, _ptr: BlockPtr, _ty: &Arc<TypeInfo>) {}
}

/// Receives unrecoverable allocation failures.
///
/// Byte-size overflow and heap exhaustion are reported here and nowhere
/// else. Implementations must not return: they abort, panic, or unwind
/// into the runtime's own out-of-memory machinery.
pub trait FatalHandler {
    /// Handle `failure`. Never returns.
    fn on_fatal(&self, failure: AllocFailure) -> !;
}
