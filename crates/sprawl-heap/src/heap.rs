//! The block heap.

use std::sync::Arc;

use indexmap::IndexMap;
use sprawl_core::{BlockAllocator, BlockAttrs, BlockId, BlockPtr, TypeInfo};

use crate::block::Block;
use crate::config::HeapConfig;
use crate::error::HeapError;
use crate::stats::HeapStats;

/// A growable list of [`Block`]s implementing [`BlockAllocator`].
///
/// Requests are rounded up to a size class, so a freshly allocated block
/// usually has room to grow in place. Access through `&mut self` already
/// serializes used-size updates; the atomic flag is counted in
/// [`HeapStats::atomic_expansions`] and [`HeapStats::atomic_used_updates`]
/// so callers can check it was passed.
/// Share a heap between threads by wrapping it in a `Mutex`.
pub struct BlockHeap {
    blocks: Vec<Block>,
    config: HeapConfig,
    /// Sum of block capacities handed out, checked against the budget.
    capacity_bytes: usize,
    /// Blocks whose elements need finalization, in allocation order.
    finalizers: IndexMap<BlockId, Arc<TypeInfo>>,
    stats: HeapStats,
}

impl BlockHeap {
    /// Create a heap with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(HeapConfig::default())
    }

    /// Create a heap with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidConfig`] if the configuration fails
    /// [`HeapConfig::validate`].
    pub fn with_config(config: HeapConfig) -> Result<Self, HeapError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: HeapConfig) -> Self {
        Self {
            blocks: Vec::new(),
            config,
            capacity_bytes: 0,
            finalizers: IndexMap::new(),
            stats: HeapStats::default(),
        }
    }

    /// The heap's configuration.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Cumulative activity counters.
    pub fn stats(&self) -> &HeapStats {
        &self.stats
    }

    /// Number of blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total capacity of all blocks in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Look up a block.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    /// Blocks with a registered finalizer, in allocation order.
    pub fn finalizable_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.finalizers.keys().copied()
    }

    /// The element type registered for finalization on `id`, if any.
    pub fn finalizer(&self, id: BlockId) -> Option<&Arc<TypeInfo>> {
        self.finalizers.get(&id)
    }

    /// Run the registered finalizer on every used element of block `id`.
    ///
    /// Called by the collector before it reclaims the block. Clears the
    /// block's `FINALIZE` attribute so the finalizer runs at most once.
    /// Returns the number of elements finalized.
    pub fn finalize_block(&mut self, id: BlockId) -> usize {
        let Some(ty) = self.finalizers.shift_remove(&id) else {
            return 0;
        };
        let Some(block) = self.blocks.get_mut(id.0 as usize) else {
            return 0;
        };
        block.clear_attrs(BlockAttrs::FINALIZE);
        let size = ty.size();
        let count = block.used() / size;
        if let Some(elems) = block.slice_mut(0, count * size) {
            for elem in elems.chunks_exact_mut(size) {
                ty.hooks().finalize(elem);
            }
        }
        self.stats.finalized_elements += count as u64;
        count
    }

    fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.0 as usize)
    }
}

impl Default for BlockHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockAllocator for BlockHeap {
    fn allocate(&mut self, bytes: usize, attrs: BlockAttrs) -> Option<BlockPtr> {
        let capacity = self.config.size_class(bytes);
        let total = capacity.and_then(|c| self.capacity_bytes.checked_add(c));
        let id = u32::try_from(self.blocks.len()).ok();
        let (Some(capacity), Some(total), Some(id)) = (capacity, total, id) else {
            self.stats.exhausted += 1;
            return None;
        };
        if total > self.config.max_heap_bytes {
            self.stats.exhausted += 1;
            return None;
        }

        self.blocks.push(Block::new(capacity, bytes, attrs));
        self.capacity_bytes = total;
        self.stats.allocations += 1;
        self.stats.allocated_bytes += bytes;
        self.stats.capacity_bytes += capacity;
        Some(BlockPtr::start(BlockId(id)))
    }

    fn try_expand_in_place(
        &mut self,
        ptr: BlockPtr,
        old_used: usize,
        new_used: usize,
        atomic: bool,
    ) -> bool {
        self.stats.expand_attempts += 1;
        if atomic {
            self.stats.atomic_expansions += 1;
        }
        let granted = self.config.allow_in_place
            && match (
                ptr.offset.checked_add(old_used),
                ptr.offset.checked_add(new_used),
            ) {
                (Some(old_end), Some(new_end)) => match self.block_mut(ptr.block) {
                    Some(block) if block.attrs().contains(BlockAttrs::APPENDABLE) => {
                        block.try_extend(old_end, new_end)
                    }
                    _ => false,
                },
                _ => false,
            };
        if granted {
            self.stats.expand_successes += 1;
        } else {
            self.stats.refused_expansions += 1;
        }
        granted
    }

    fn query_attributes(&self, ptr: BlockPtr) -> BlockAttrs {
        self.block(ptr.block)
            .map(Block::attrs)
            .unwrap_or_else(BlockAttrs::empty)
    }

    fn used_bytes(&self, ptr: BlockPtr, _atomic: bool) -> Option<usize> {
        let block = self.block(ptr.block)?;
        Some(block.used().saturating_sub(ptr.offset))
    }

    fn set_used_bytes(&mut self, ptr: BlockPtr, used: usize, atomic: bool) -> bool {
        if atomic {
            self.stats.atomic_used_updates += 1;
        }
        let Some(end) = ptr.offset.checked_add(used) else {
            return false;
        };
        self.block_mut(ptr.block)
            .is_some_and(|block| block.set_used(end))
    }

    fn capacity_bytes(&self, ptr: BlockPtr) -> Option<usize> {
        let block = self.block(ptr.block)?;
        block.capacity().checked_sub(ptr.offset)
    }

    fn bytes(&self, ptr: BlockPtr, len: usize) -> Option<&[u8]> {
        self.block(ptr.block)?.slice(ptr.offset, len)
    }

    fn bytes_mut(&mut self, ptr: BlockPtr, len: usize) -> Option<&mut [u8]> {
        self.block_mut(ptr.block)?.slice_mut(ptr.offset, len)
    }

    fn split_regions(
        &mut self,
        src: BlockPtr,
        src_len: usize,
        dst: BlockPtr,
        dst_len: usize,
    ) -> Option<(&[u8], &mut [u8])> {
        let s = src.block.0 as usize;
        let d = dst.block.0 as usize;
        if s == d || s >= self.blocks.len() || d >= self.blocks.len() {
            return None;
        }
        // Split the block list so the source and destination borrows are disjoint.
        let (src_block, dst_block): (&Block, &mut Block) = if s < d {
            let (lo, hi) = self.blocks.split_at_mut(d);
            (&lo[s], &mut hi[0])
        } else {
            let (lo, hi) = self.blocks.split_at_mut(s);
            (&hi[0], &mut lo[d])
        };
        Some((
            src_block.slice(src.offset, src_len)?,
            dst_block.slice_mut(dst.offset, dst_len)?,
        ))
    }

    fn register_finalizer(&mut self, ptr: BlockPtr, ty: &Arc<TypeInfo>) {
        if self
            .block(ptr.block)
            .is_some_and(|b| b.attrs().contains(BlockAttrs::FINALIZE))
        {
            self.finalizers.insert(ptr.block, Arc::clone(ty));
        }
    }
}
