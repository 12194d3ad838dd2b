//! Test utilities and mock allocators for Sprawl development.
//!
//! Provides [`RecordingAllocator`], which logs every allocator call and
//! can refuse expansions or run dry on demand, [`FlakyExpandAllocator`],
//! which refuses expansions at random from a seed, and element type
//! fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sprawl_core::{BlockAllocator, BlockAttrs, BlockPtr, TypeInfo};
use sprawl_heap::BlockHeap;

/// Little-endian encoding of `values`, the element layout fixtures use.
pub fn i32_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`i32_bytes`]. Trailing partial elements are ignored.
pub fn decode_i32s(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// One in-place expansion request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpandCall {
    pub ptr: BlockPtr,
    pub old_used: usize,
    pub new_used: usize,
    pub atomic: bool,
    pub granted: bool,
}

/// A mutating call seen by a [`RecordingAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocCall {
    Allocate {
        bytes: usize,
        attrs: BlockAttrs,
        granted: bool,
    },
    Expand(ExpandCall),
    SetUsed {
        ptr: BlockPtr,
        used: usize,
        atomic: bool,
    },
}

/// A [`BlockHeap`] that records allocator traffic.
///
/// `refuse_expansion` makes every in-place expansion fail without
/// reaching the heap; `exhaust` makes every allocation return `None`.
/// Reads are passed through unrecorded.
pub struct RecordingAllocator {
    heap: BlockHeap,
    calls: Vec<AllocCall>,
    refuse_expansion: bool,
    exhausted: bool,
}

impl RecordingAllocator {
    pub fn new() -> Self {
        Self::with_heap(BlockHeap::new())
    }

    pub fn with_heap(heap: BlockHeap) -> Self {
        Self {
            heap,
            calls: Vec::new(),
            refuse_expansion: false,
            exhausted: false,
        }
    }

    pub fn refuse_expansion(&mut self, refuse: bool) {
        self.refuse_expansion = refuse;
    }

    pub fn exhaust(&mut self, exhausted: bool) {
        self.exhausted = exhausted;
    }

    pub fn heap(&self) -> &BlockHeap {
        &self.heap
    }

    pub fn calls(&self) -> &[AllocCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Allocation requests recorded, granted or not.
    pub fn allocation_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, AllocCall::Allocate { .. }))
            .count()
    }

    pub fn expansions(&self) -> Vec<ExpandCall> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                AllocCall::Expand(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    pub fn expansion_attempts(&self) -> usize {
        self.expansions().len()
    }
}

impl Default for RecordingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockAllocator for RecordingAllocator {
    fn allocate(&mut self, bytes: usize, attrs: BlockAttrs) -> Option<BlockPtr> {
        let ptr = if self.exhausted {
            None
        } else {
            self.heap.allocate(bytes, attrs)
        };
        self.calls.push(AllocCall::Allocate {
            bytes,
            attrs,
            granted: ptr.is_some(),
        });
        ptr
    }

    fn try_expand_in_place(
        &mut self,
        ptr: BlockPtr,
        old_used: usize,
        new_used: usize,
        atomic: bool,
    ) -> bool {
        let granted = !self.refuse_expansion
            && self
                .heap
                .try_expand_in_place(ptr, old_used, new_used, atomic);
        self.calls.push(AllocCall::Expand(ExpandCall {
            ptr,
            old_used,
            new_used,
            atomic,
            granted,
        }));
        granted
    }

    fn query_attributes(&self, ptr: BlockPtr) -> BlockAttrs {
        self.heap.query_attributes(ptr)
    }

    fn used_bytes(&self, ptr: BlockPtr, atomic: bool) -> Option<usize> {
        self.heap.used_bytes(ptr, atomic)
    }

    fn set_used_bytes(&mut self, ptr: BlockPtr, used: usize, atomic: bool) -> bool {
        self.calls.push(AllocCall::SetUsed { ptr, used, atomic });
        self.heap.set_used_bytes(ptr, used, atomic)
    }

    fn capacity_bytes(&self, ptr: BlockPtr) -> Option<usize> {
        self.heap.capacity_bytes(ptr)
    }

    fn bytes(&self, ptr: BlockPtr, len: usize) -> Option<&[u8]> {
        self.heap.bytes(ptr, len)
    }

    fn bytes_mut(&mut self, ptr: BlockPtr, len: usize) -> Option<&mut [u8]> {
        self.heap.bytes_mut(ptr, len)
    }

    fn split_regions(
        &mut self,
        src: BlockPtr,
        src_len: usize,
        dst: BlockPtr,
        dst_len: usize,
    ) -> Option<(&[u8], &mut [u8])> {
        self.heap.split_regions(src, src_len, dst, dst_len)
    }

    fn register_finalizer(&mut self, ptr: BlockPtr, ty: &Arc<TypeInfo>) {
        self.heap.register_finalizer(ptr, ty);
    }
}

/// A [`BlockHeap`] whose in-place expansions fail at random.
///
/// Seeded with ChaCha8, so a given seed refuses the same sequence of
/// expansions on every run.
pub struct FlakyExpandAllocator {
    heap: BlockHeap,
    rng: ChaCha8Rng,
    refuse_probability: f64,
    refused: usize,
}

impl FlakyExpandAllocator {
    /// `refuse_probability` is clamped to `[0, 1]`.
    pub fn new(seed: u64, refuse_probability: f64) -> Self {
        Self {
            heap: BlockHeap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            refuse_probability: refuse_probability.clamp(0.0, 1.0),
            refused: 0,
        }
    }

    pub fn heap(&self) -> &BlockHeap {
        &self.heap
    }

    /// Expansions refused by the coin flip, not by the heap.
    pub fn refused(&self) -> usize {
        self.refused
    }

    fn coin(&mut self) -> bool {
        let sample = f64::from(self.rng.next_u32()) / f64::from(u32::MAX);
        sample < self.refuse_probability
    }
}

impl BlockAllocator for FlakyExpandAllocator {
    fn allocate(&mut self, bytes: usize, attrs: BlockAttrs) -> Option<BlockPtr> {
        self.heap.allocate(bytes, attrs)
    }

    fn try_expand_in_place(
        &mut self,
        ptr: BlockPtr,
        old_used: usize,
        new_used: usize,
        atomic: bool,
    ) -> bool {
        if self.coin() {
            self.refused += 1;
            return false;
        }
        self.heap.try_expand_in_place(ptr, old_used, new_used, atomic)
    }

    fn query_attributes(&self, ptr: BlockPtr) -> BlockAttrs {
        self.heap.query_attributes(ptr)
    }

    fn used_bytes(&self, ptr: BlockPtr, atomic: bool) -> Option<usize> {
        self.heap.used_bytes(ptr, atomic)
    }

    fn set_used_bytes(&mut self, ptr: BlockPtr, used: usize, atomic: bool) -> bool {
        self.heap.set_used_bytes(ptr, used, atomic)
    }

    fn capacity_bytes(&self, ptr: BlockPtr) -> Option<usize> {
        self.heap.capacity_bytes(ptr)
    }

    fn bytes(&self, ptr: BlockPtr, len: usize) -> Option<&[u8]> {
        self.heap.bytes(ptr, len)
    }

    fn bytes_mut(&mut self, ptr: BlockPtr, len: usize) -> Option<&mut [u8]> {
        self.heap.bytes_mut(ptr, len)
    }

    fn split_regions(
        &mut self,
        src: BlockPtr,
        src_len: usize,
        dst: BlockPtr,
        dst_len: usize,
    ) -> Option<(&[u8], &mut [u8])> {
        self.heap.split_regions(src, src_len, dst, dst_len)
    }

    fn register_finalizer(&mut self, ptr: BlockPtr, ty: &Arc<TypeInfo>) {
        self.heap.register_finalizer(ptr, ty);
    }
}
