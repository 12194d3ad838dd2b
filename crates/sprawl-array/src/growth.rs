//! Array resizing.
//!
//! [`GrowthEngine::resize`] runs one resize through four terminal states,
//! evaluated in order:
//!
//! ```text
//! new_len <= len ──────────────────────────────> Truncate
//! byte size overflows ─────────────────────────> fatal
//! no storage yet ──────────────────────────────> FreshAllocate
//! allocator grows the block ───────────────────> InPlaceExpand
//! otherwise (exactly one expansion attempt) ───> ReallocateAndMigrate
//! ```
//!
//! Sizes are exact: the new block holds precisely `new_len` elements
//! (rounded only by the allocator's own size classes). There is no
//! retry and no amortized over-allocation.

use std::sync::Arc;

use sprawl_core::{
    AllocFailure, ArrayError, BlockAllocator, BlockAttrs, BlockPtr, FatalHandler, TypeInfo,
};

use crate::concat::Source;
use crate::descriptor::ArrayDescriptor;
use crate::fatal::{allocate_or_die, bytes_or_die, AbortOnFatal};
use crate::policy::{block_attrs, copy_elements, init_elements, retract_used, TailFill};
use crate::stats::{GrowthPath, GrowthStats};

/// How the slots past the old length are populated.
#[derive(Clone, Copy, Debug)]
enum Tail<'s> {
    Fill(TailFill),
    Copy(&'s [u8]),
}

/// Resizes array views against an injected [`BlockAllocator`].
///
/// The engine holds no heap state of its own, only the fatal handler and
/// counters, so one engine can serve any number of arrays and heaps.
#[derive(Debug)]
pub struct GrowthEngine<F = AbortOnFatal> {
    fatal: F,
    stats: GrowthStats,
    last_path: Option<GrowthPath>,
}

impl GrowthEngine {
    /// An engine that aborts the process on fatal allocation failure.
    pub fn new() -> Self {
        Self::with_fatal_handler(AbortOnFatal)
    }
}

impl Default for GrowthEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FatalHandler> GrowthEngine<F> {
    /// An engine that reports overflow and exhaustion to `fatal`.
    pub fn with_fatal_handler(fatal: F) -> Self {
        Self {
            fatal,
            stats: GrowthStats::default(),
            last_path: None,
        }
    }

    /// Cumulative per-path counters.
    pub fn stats(&self) -> &GrowthStats {
        &self.stats
    }

    /// The state the most recent resize took.
    pub fn last_path(&self) -> Option<GrowthPath> {
        self.last_path
    }

    /// Resize `array` to exactly `new_len` elements.
    ///
    /// Elements `[0, min(len, new_len))` keep their values. New slots are
    /// zeroed or default-constructed per `fill`. The returned view replaces
    /// `array`; `array` itself is left valid and unchanged.
    ///
    /// # Errors
    ///
    /// [`ArrayError::ElementConstructionFailure`] if a hook fails while
    /// migrating elements or initializing new slots; the target block's
    /// used size then covers only the elements built. Overflow and heap
    /// exhaustion go to the fatal handler before the heap is touched.
    pub fn resize<A>(
        &mut self,
        alloc: &mut A,
        array: &ArrayDescriptor,
        new_len: usize,
        fill: TailFill,
    ) -> Result<ArrayDescriptor, ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        self.grow(alloc, array, new_len, Tail::Fill(fill))
    }

    /// Append the elements of `source` to `array`.
    ///
    /// Grows through the same states as [`resize`](Self::resize), then
    /// copies the source elements into the new slots with the type's copy
    /// policy. A source may alias `array` itself.
    ///
    /// # Errors
    ///
    /// [`ArrayError::TypeMismatch`], [`ArrayError::ScalarSize`] or
    /// [`ArrayError::Misaligned`] for an unusable source, checked before
    /// any allocation; [`ArrayError::ElementConstructionFailure`] from hooks.
    pub fn append<A>(
        &mut self,
        alloc: &mut A,
        array: &ArrayDescriptor,
        source: Source<'_>,
    ) -> Result<ArrayDescriptor, ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        let extra = source.checked_len(array.element_type())?;
        let Some(new_len) = array.len().checked_add(extra) else {
            self.fatal.on_fatal(AllocFailure::LengthOverflow { sources: 2 })
        };
        // Snapshot heap-resident sources: growing may move or extend the
        // block they live in.
        let owned;
        let src: &[u8] = match source {
            Source::Array(a) => {
                owned = a.bytes(&*alloc)?.to_vec();
                &owned
            }
            Source::Slice(bytes) | Source::Scalar(bytes) => bytes,
        };
        self.grow(alloc, array, new_len, Tail::Copy(src))
    }

    /// Append exactly one element given as raw bytes.
    pub fn append_scalar<A>(
        &mut self,
        alloc: &mut A,
        array: &ArrayDescriptor,
        element: &[u8],
    ) -> Result<ArrayDescriptor, ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        self.append(alloc, array, Source::Scalar(element))
    }

    /// Number of elements `array` can reach without relocating.
    ///
    /// Equals the current length when the view does not end at its
    /// block's used end, since growing it in place would overwrite bytes
    /// another view may own. Zero for an array without storage.
    pub fn capacity<A>(&self, alloc: &A, array: &ArrayDescriptor) -> usize
    where
        A: BlockAllocator + ?Sized,
    {
        let Some(ptr) = array.data() else {
            return 0;
        };
        let atomic = array.mutability().is_atomic();
        let appendable = alloc
            .query_attributes(ptr)
            .contains(BlockAttrs::APPENDABLE);
        if !appendable || alloc.used_bytes(ptr, atomic) != Some(array.byte_len()) {
            return array.len();
        }
        alloc
            .capacity_bytes(ptr)
            .map_or(array.len(), |cap| cap / array.element_size())
    }

    /// Declare that nothing past the end of `array` is in use, so the next
    /// growth may expand its block in place.
    ///
    /// Returns `false` if `array` has no storage or the allocator rejects
    /// the new used size.
    pub fn assume_safe_append<A>(&self, alloc: &mut A, array: &ArrayDescriptor) -> bool
    where
        A: BlockAllocator + ?Sized,
    {
        let Some(ptr) = array.data() else {
            return false;
        };
        alloc.set_used_bytes(ptr, array.byte_len(), array.mutability().is_atomic())
    }

    /// Ensure `array` can reach `n` elements without relocating.
    ///
    /// Relocates into a block of exactly `n` elements when the current
    /// capacity is short. The length never changes.
    pub fn reserve<A>(
        &mut self,
        alloc: &mut A,
        array: &ArrayDescriptor,
        n: usize,
    ) -> Result<ArrayDescriptor, ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        if n <= self.capacity(alloc, array) {
            return Ok(array.clone());
        }
        let ty = Arc::clone(array.element_type());
        let bytes = bytes_or_die(&self.fatal, ty.size(), n);
        let old_bytes = array.byte_len();
        let atomic = array.mutability().is_atomic();

        let mut attrs = block_attrs(&ty);
        if let Some(old) = array.data() {
            attrs |= alloc.query_attributes(old);
        }
        let ptr = allocate_or_die(alloc, &self.fatal, bytes, attrs, &ty);
        let path = match array.data() {
            Some(old) if old_bytes > 0 => {
                self.migrate(alloc, &ty, old, ptr, old_bytes)
                    .map_err(|err| retract_used(&mut *alloc, ptr, &ty, atomic, err))?;
                GrowthPath::ReallocateAndMigrate
            }
            _ => GrowthPath::FreshAllocate,
        };
        self.record(path);
        // Only the existing elements are in use.
        let accepted = alloc.set_used_bytes(ptr, old_bytes, atomic);
        debug_assert!(accepted, "allocator rejected the used size of a fresh block");
        Ok(ArrayDescriptor::from_parts(
            ptr,
            array.len(),
            ty,
            array.mutability(),
        ))
    }

    fn grow<A>(
        &mut self,
        alloc: &mut A,
        array: &ArrayDescriptor,
        new_len: usize,
        tail: Tail<'_>,
    ) -> Result<ArrayDescriptor, ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        let old_len = array.len();
        if new_len <= old_len {
            self.record(GrowthPath::Truncate);
            return Ok(array.truncated(new_len));
        }

        let ty = Arc::clone(array.element_type());
        let new_bytes = bytes_or_die(&self.fatal, ty.size(), new_len);
        let old_bytes = array.byte_len();
        let atomic = array.mutability().is_atomic();

        let (ptr, path) = match array.data() {
            None => {
                let ptr = allocate_or_die(alloc, &self.fatal, new_bytes, block_attrs(&ty), &ty);
                (ptr, GrowthPath::FreshAllocate)
            }
            Some(ptr) if alloc.try_expand_in_place(ptr, old_bytes, new_bytes, atomic) => {
                (ptr, GrowthPath::InPlaceExpand)
            }
            Some(old) => {
                let attrs = block_attrs(&ty) | alloc.query_attributes(old);
                let ptr = allocate_or_die(alloc, &self.fatal, new_bytes, attrs, &ty);
                self.migrate(alloc, &ty, old, ptr, old_bytes)
                    .map_err(|err| retract_used(&mut *alloc, ptr, &ty, atomic, err))?;
                (ptr, GrowthPath::ReallocateAndMigrate)
            }
        };
        self.record(path);

        let region = alloc
            .bytes_mut(ptr, new_bytes)
            .ok_or(ArrayError::InvalidView {
                ptr,
                len: new_bytes,
            })?;
        let new_slots = &mut region[old_bytes..];
        let written = match tail {
            Tail::Fill(fill) => init_elements(&ty, new_slots, fill, old_len),
            Tail::Copy(src) => copy_elements(&ty, new_slots, src, old_len),
        };
        written.map_err(|err| retract_used(&mut *alloc, ptr, &ty, atomic, err))?;
        Ok(ArrayDescriptor::from_parts(
            ptr,
            new_len,
            ty,
            array.mutability(),
        ))
    }

    /// Move `bytes` worth of elements from `old` into `new`, in order.
    /// The old block is abandoned, not freed.
    fn migrate<A>(
        &mut self,
        alloc: &mut A,
        ty: &TypeInfo,
        old: BlockPtr,
        new: BlockPtr,
        bytes: usize,
    ) -> Result<(), ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        if bytes == 0 {
            return Ok(());
        }
        let (src, dst) = alloc
            .split_regions(old, bytes, new, bytes)
            .ok_or(ArrayError::InvalidView { ptr: old, len: bytes })?;
        copy_elements(ty, dst, src, 0)?;
        self.stats.bytes_migrated += bytes;
        Ok(())
    }

    fn record(&mut self, path: GrowthPath) {
        self.stats.record(path);
        self.last_path = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concat::{ConcatRequest, ConcatenationAssembler};
    use crate::fatal::PanicOnFatal;
    use sprawl_core::{BlockId, Mutability};
    use sprawl_heap::{BlockHeap, HeapConfig};
    use sprawl_test_utils::fixtures::{
        counting_postblit_type, failing_copy_type, failing_default_type, failing_finalized_type,
        finalized_type, int32_type, reference_type, sentinel_default_type,
    };
    use sprawl_test_utils::{decode_i32s, i32_bytes, AllocCall, RecordingAllocator};

    fn engine() -> GrowthEngine<PanicOnFatal> {
        GrowthEngine::with_fatal_handler(PanicOnFatal)
    }

    fn array_of<A: BlockAllocator + ?Sized>(
        alloc: &mut A,
        ty: &Arc<TypeInfo>,
        values: &[i32],
        mutability: Mutability,
    ) -> ArrayDescriptor {
        let bytes = i32_bytes(values);
        let request = ConcatRequest::new(Arc::clone(ty), mutability).slice(&bytes);
        ConcatenationAssembler::with_fatal_handler(PanicOnFatal)
            .assemble(alloc, &request)
            .unwrap()
    }

    fn values<A: BlockAllocator + ?Sized>(alloc: &A, array: &ArrayDescriptor) -> Vec<i32> {
        decode_i32s(array.bytes(alloc).unwrap())
    }

    #[test]
    fn truncate_does_not_touch_allocator() {
        let mut alloc = RecordingAllocator::new();
        let arr = array_of(&mut alloc, &int32_type(), &[1, 2, 3, 4], Mutability::Mutable);
        alloc.clear_calls();

        let mut engine = engine();
        let shorter = engine.resize(&mut alloc, &arr, 2, TailFill::Zero).unwrap();
        assert!(alloc.calls().is_empty());
        assert_eq!(engine.last_path(), Some(GrowthPath::Truncate));
        assert_eq!(shorter.data(), arr.data());
        assert_eq!(values(&alloc, &shorter), vec![1, 2]);
        assert_eq!(values(&alloc, &arr), vec![1, 2, 3, 4]);
    }

    #[test]
    fn same_length_is_a_truncation() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1], Mutability::Mutable);
        let mut engine = engine();
        let same = engine.resize(&mut heap, &arr, 1, TailFill::Zero).unwrap();
        assert_eq!(engine.last_path(), Some(GrowthPath::Truncate));
        assert_eq!(same.len(), 1);
    }

    #[test]
    fn empty_array_gets_fresh_block() {
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        let mut engine = engine();
        let grown = engine.resize(&mut heap, &arr, 3, TailFill::Zero).unwrap();
        assert_eq!(engine.last_path(), Some(GrowthPath::FreshAllocate));
        assert_eq!(values(&heap, &grown), vec![0, 0, 0]);
        let attrs = heap.query_attributes(grown.data().unwrap());
        assert_eq!(attrs, BlockAttrs::NO_SCAN | BlockAttrs::APPENDABLE);
    }

    #[test]
    fn fresh_block_for_reference_type_is_scanned() {
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(reference_type(), Mutability::Mutable);
        let grown = engine().resize(&mut heap, &arr, 1, TailFill::Zero).unwrap();
        let attrs = heap.query_attributes(grown.data().unwrap());
        assert!(!attrs.contains(BlockAttrs::NO_SCAN));
    }

    #[test]
    fn finalized_type_registers_finalizer() {
        let (ty, hooks) = finalized_type();
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(ty, Mutability::Mutable);
        let grown = engine().resize(&mut heap, &arr, 2, TailFill::Zero).unwrap();
        let block = grown.data().unwrap().block;
        assert!(heap.query_attributes(grown.data().unwrap()).contains(BlockAttrs::FINALIZE));
        assert!(heap.finalizer(block).is_some());
        assert_eq!(heap.finalize_block(block), 2);
        assert_eq!(hooks.finalized(), 2);
    }

    #[test]
    fn growth_within_size_class_expands_in_place() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1, 2], Mutability::Mutable);
        let mut engine = engine();
        let grown = engine.resize(&mut heap, &arr, 4, TailFill::Zero).unwrap();
        assert_eq!(engine.last_path(), Some(GrowthPath::InPlaceExpand));
        assert_eq!(grown.data(), arr.data());
        assert_eq!(values(&heap, &grown), vec![1, 2, 0, 0]);
    }

    #[test]
    fn growth_past_size_class_relocates() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1, 2], Mutability::Mutable);
        let mut engine = engine();
        let grown = engine.resize(&mut heap, &arr, 5, TailFill::Zero).unwrap();
        assert_eq!(engine.last_path(), Some(GrowthPath::ReallocateAndMigrate));
        assert_ne!(grown.data(), arr.data());
        assert_eq!(values(&heap, &grown), vec![1, 2, 0, 0, 0]);
        assert_eq!(engine.stats().bytes_migrated, 8);
        // Old view still reads its elements.
        assert_eq!(values(&heap, &arr), vec![1, 2]);
    }

    #[test]
    fn refused_expansion_falls_back_exactly_once() {
        let mut alloc = RecordingAllocator::new();
        let arr = array_of(&mut alloc, &int32_type(), &[1, 2], Mutability::Mutable);
        alloc.refuse_expansion(true);
        alloc.clear_calls();

        let mut engine = engine();
        let grown = engine.resize(&mut alloc, &arr, 3, TailFill::Zero).unwrap();
        assert_eq!(engine.last_path(), Some(GrowthPath::ReallocateAndMigrate));
        assert_eq!(alloc.expansion_attempts(), 1);
        assert_eq!(alloc.allocation_count(), 1);
        assert_eq!(values(&alloc, &grown), vec![1, 2, 0]);
    }

    #[test]
    fn reallocation_inherits_old_block_attributes() {
        let ty = int32_type();
        let mut heap = BlockHeap::new();
        let ptr = heap
            .allocate(8, BlockAttrs::APPENDABLE | BlockAttrs::FINALIZE)
            .unwrap();
        heap.bytes_mut(ptr, 8).unwrap().copy_from_slice(&i32_bytes(&[1, 2]));
        let arr = ArrayDescriptor::from_parts(ptr, 2, ty, Mutability::Mutable);

        let grown = engine().resize(&mut heap, &arr, 10, TailFill::Zero).unwrap();
        let attrs = heap.query_attributes(grown.data().unwrap());
        assert!(attrs.contains(BlockAttrs::FINALIZE));
        assert!(attrs.contains(BlockAttrs::NO_SCAN));
    }

    #[test]
    fn default_fill_runs_hook_for_each_new_slot() {
        let (ty, hooks) = sentinel_default_type(-7);
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(ty, Mutability::Mutable);
        let mut engine = engine();
        let arr = engine.resize(&mut heap, &arr, 2, TailFill::Default).unwrap();
        let arr = engine.resize(&mut heap, &arr, 5, TailFill::Default).unwrap();
        assert_eq!(values(&heap, &arr), vec![-7; 5]);
        assert_eq!(hooks.defaults(), 5);
    }

    #[test]
    fn postblit_runs_for_migrated_elements() {
        let (ty, hooks) = counting_postblit_type();
        let mut alloc = RecordingAllocator::new();
        let arr = array_of(&mut alloc, &ty, &[1, 2, 3], Mutability::Mutable);
        let before = hooks.postblits();
        alloc.refuse_expansion(true);

        let grown = engine().resize(&mut alloc, &arr, 4, TailFill::Zero).unwrap();
        assert_eq!(hooks.postblits() - before, 3);
        assert_eq!(values(&alloc, &grown), vec![1, 2, 3, 0]);
    }

    #[test]
    fn migration_failure_leaves_original_intact() {
        let (ty, hooks) = failing_copy_type();
        let mut alloc = RecordingAllocator::new();
        let arr = array_of(&mut alloc, &ty, &[1, 2, 3], Mutability::Mutable);
        alloc.refuse_expansion(true);
        hooks.arm(2);

        let err = engine().resize(&mut alloc, &arr, 8, TailFill::Zero).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::ElementConstructionFailure { index: 1, .. }
        ));
        assert_eq!(hooks.calls(), 2);
        assert_eq!(values(&alloc, &arr), vec![1, 2, 3]);
    }

    #[test]
    fn migration_failure_trims_new_block_to_built_prefix() {
        let (ty, hooks) = failing_finalized_type();
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &ty, &[1, 2, 3], Mutability::Mutable);
        hooks.arm(3);

        // 24 bytes do not fit the 16-byte class, so the block relocates.
        let err = engine().resize(&mut heap, &arr, 6, TailFill::Zero).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::ElementConstructionFailure { index: 2, .. }
        ));
        let relocated = BlockId(1);
        assert_eq!(heap.used_bytes(BlockPtr::start(relocated), false), Some(8));
        assert_eq!(heap.finalize_block(relocated), 2);
        assert_eq!(hooks.finalized(), 2);
        assert_eq!(values(&heap, &arr), vec![1, 2, 3]);
    }

    #[test]
    fn default_fill_failure_on_fresh_block() {
        let (ty, hooks) = failing_default_type(9);
        let mut heap = BlockHeap::new();
        let empty = ArrayDescriptor::empty(ty, Mutability::Mutable);
        hooks.arm(2);

        let err = engine().resize(&mut heap, &empty, 4, TailFill::Default).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::ElementConstructionFailure { index: 1, .. }
        ));
        assert_eq!(hooks.calls(), 2);
        assert!(empty.is_empty());
        assert_eq!(empty.data(), None);
        assert_eq!(heap.used_bytes(BlockPtr::start(BlockId(0)), false), Some(4));
    }

    #[test]
    fn default_fill_failure_during_in_place_growth() {
        let (ty, hooks) = failing_default_type(9);
        let mut heap = BlockHeap::new();
        let mut engine = engine();
        let empty = ArrayDescriptor::empty(ty, Mutability::Mutable);
        let arr = engine.resize(&mut heap, &empty, 1, TailFill::Default).unwrap();
        hooks.arm(2);

        let err = engine.resize(&mut heap, &arr, 3, TailFill::Default).unwrap_err();
        assert_eq!(engine.last_path(), Some(GrowthPath::InPlaceExpand));
        assert!(matches!(
            err,
            ArrayError::ElementConstructionFailure { index: 2, .. }
        ));
        assert_eq!(hooks.calls(), 2);
        assert_eq!(arr.len(), 1);
        assert_eq!(values(&heap, &arr), vec![9]);
        // The original element plus the one default built before the failure.
        assert_eq!(heap.used_bytes(arr.data().unwrap(), false), Some(8));
    }

    #[test]
    fn truncate_then_grow_relocates_without_safe_append() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1, 2, 3], Mutability::Mutable);
        let mut engine = engine();
        let short = engine.resize(&mut heap, &arr, 1, TailFill::Zero).unwrap();
        let regrown = engine.resize(&mut heap, &short, 2, TailFill::Zero).unwrap();
        assert_eq!(engine.last_path(), Some(GrowthPath::ReallocateAndMigrate));
        assert_eq!(values(&heap, &regrown), vec![1, 0]);
        // The longer view was not stomped.
        assert_eq!(values(&heap, &arr), vec![1, 2, 3]);
    }

    #[test]
    fn safe_append_reuses_block_and_zeroes_stale_bytes() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1, 2, 3], Mutability::Mutable);
        let mut engine = engine();
        let short = engine.resize(&mut heap, &arr, 1, TailFill::Zero).unwrap();
        assert!(engine.assume_safe_append(&mut heap, &short));
        let regrown = engine.resize(&mut heap, &short, 3, TailFill::Zero).unwrap();
        assert_eq!(engine.last_path(), Some(GrowthPath::InPlaceExpand));
        assert_eq!(regrown.data(), arr.data());
        assert_eq!(values(&heap, &regrown), vec![1, 0, 0]);
    }

    #[test]
    fn safe_append_on_empty_array_is_false() {
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        assert!(!engine().assume_safe_append(&mut heap, &arr));
    }

    #[test]
    fn capacity_reflects_size_class() {
        let mut heap = BlockHeap::new();
        let engine = engine();
        let empty = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        assert_eq!(engine.capacity(&heap, &empty), 0);

        let arr = array_of(&mut heap, &int32_type(), &[1, 2, 3, 4, 5], Mutability::Mutable);
        // 20 bytes round up to a 32-byte block.
        assert_eq!(engine.capacity(&heap, &arr), 8);
        // A prefix view cannot grow in place.
        let prefix = arr.slice(0, 2).unwrap();
        assert_eq!(engine.capacity(&heap, &prefix), 2);
        // A suffix view ends at the used end.
        let suffix = arr.slice(3, 5).unwrap();
        assert_eq!(engine.capacity(&heap, &suffix), 5);
    }

    #[test]
    fn reserve_relocates_to_exact_size_and_keeps_length() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1, 2], Mutability::Mutable);
        let mut engine = engine();
        let reserved = engine.reserve(&mut heap, &arr, 100).unwrap();
        assert_eq!(reserved.len(), 2);
        assert!(engine.capacity(&heap, &reserved) >= 100);
        assert_eq!(values(&heap, &reserved), vec![1, 2]);

        let mut grow_engine = GrowthEngine::with_fatal_handler(PanicOnFatal);
        let grown = grow_engine
            .resize(&mut heap, &reserved, 100, TailFill::Zero)
            .unwrap();
        assert_eq!(grow_engine.last_path(), Some(GrowthPath::InPlaceExpand));
        assert_eq!(grown.data(), reserved.data());
    }

    #[test]
    fn reserve_within_capacity_is_noop() {
        let mut alloc = RecordingAllocator::new();
        let arr = array_of(&mut alloc, &int32_type(), &[1, 2], Mutability::Mutable);
        alloc.clear_calls();
        let same = engine().reserve(&mut alloc, &arr, 4).unwrap();
        assert_eq!(same.data(), arr.data());
        assert_eq!(alloc.allocation_count(), 0);
    }

    #[test]
    fn reserve_on_empty_array_allocates_storage() {
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        let mut engine = engine();
        let reserved = engine.reserve(&mut heap, &arr, 6).unwrap();
        assert!(reserved.is_empty());
        assert!(reserved.data().is_some());
        assert_eq!(engine.capacity(&heap, &reserved), 8);
    }

    #[test]
    fn append_copies_source_elements() {
        let (ty, hooks) = counting_postblit_type();
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &ty, &[1], Mutability::Mutable);
        let before = hooks.postblits();
        let tail = i32_bytes(&[2, 3]);
        let mut engine = engine();
        let arr = engine.append(&mut heap, &arr, Source::Slice(&tail)).unwrap();
        let arr = engine
            .append_scalar(&mut heap, &arr, &4i32.to_le_bytes())
            .unwrap();
        assert_eq!(values(&heap, &arr), vec![1, 2, 3, 4]);
        assert_eq!(hooks.postblits() - before, 3);
    }

    #[test]
    fn append_to_itself() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1, 2], Mutability::Mutable);
        let doubled = engine().append(&mut heap, &arr, Source::Array(&arr)).unwrap();
        assert_eq!(values(&heap, &doubled), vec![1, 2, 1, 2]);
    }

    #[test]
    fn append_rejects_other_element_type() {
        let mut heap = BlockHeap::new();
        let arr = array_of(&mut heap, &int32_type(), &[1], Mutability::Mutable);
        let other = ArrayDescriptor::empty(reference_type(), Mutability::Mutable);
        let err = engine()
            .append(&mut heap, &arr, Source::Array(&other))
            .unwrap_err();
        assert!(matches!(err, ArrayError::TypeMismatch { .. }));
    }

    #[test]
    fn shared_array_passes_atomic_flag() {
        let mut alloc = RecordingAllocator::new();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Shared);
        let mut engine = engine();
        let arr = engine.resize(&mut alloc, &arr, 1, TailFill::Zero).unwrap();
        let arr = engine.resize(&mut alloc, &arr, 2, TailFill::Zero).unwrap();
        let arr = engine.resize(&mut alloc, &arr, 3, TailFill::Zero).unwrap();
        assert_eq!(arr.mutability(), Mutability::Shared);
        assert_eq!(alloc.expansion_attempts(), 2);
        assert!(alloc.expansions().iter().all(|e| e.atomic));
    }

    #[test]
    fn shared_reserve_and_safe_append_pass_atomic_flag() {
        let mut alloc = RecordingAllocator::new();
        let arr = array_of(&mut alloc, &int32_type(), &[1, 2], Mutability::Shared);
        alloc.clear_calls();
        let mut engine = engine();

        let reserved = engine.reserve(&mut alloc, &arr, 64).unwrap();
        assert!(engine.capacity(&alloc, &reserved) >= 64);
        let short = engine.resize(&mut alloc, &reserved, 1, TailFill::Zero).unwrap();
        assert!(engine.assume_safe_append(&mut alloc, &short));

        let flags: Vec<bool> = alloc
            .calls()
            .iter()
            .filter_map(|call| match call {
                AllocCall::SetUsed { atomic, .. } => Some(*atomic),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![true, true]);
    }

    #[test]
    fn unshared_array_does_not_pass_atomic_flag() {
        let mut alloc = RecordingAllocator::new();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        let mut engine = engine();
        let arr = engine.resize(&mut alloc, &arr, 1, TailFill::Zero).unwrap();
        engine.resize(&mut alloc, &arr, 2, TailFill::Zero).unwrap();
        assert!(alloc.expansions().iter().all(|e| !e.atomic));
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn overflowing_length_is_fatal() {
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        let _ = engine().resize(&mut heap, &arr, usize::MAX / 2, TailFill::Zero);
    }

    #[test]
    #[should_panic(expected = "allocator exhausted")]
    fn exhausted_heap_is_fatal() {
        let mut heap = BlockHeap::with_config(HeapConfig::new(64)).unwrap();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        let _ = engine().resize(&mut heap, &arr, 100, TailFill::Zero);
    }

    #[test]
    fn stats_count_every_path() {
        let mut heap = BlockHeap::new();
        let arr = ArrayDescriptor::empty(int32_type(), Mutability::Mutable);
        let mut engine = engine();
        let arr = engine.resize(&mut heap, &arr, 1, TailFill::Zero).unwrap();
        let arr = engine.resize(&mut heap, &arr, 2, TailFill::Zero).unwrap();
        let arr = engine.resize(&mut heap, &arr, 64, TailFill::Zero).unwrap();
        engine.resize(&mut heap, &arr, 1, TailFill::Zero).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.fresh_allocations, 1);
        assert_eq!(stats.in_place_expansions, 1);
        assert_eq!(stats.reallocations, 1);
        assert_eq!(stats.truncations, 1);
        assert_eq!(stats.total(), 4);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use sprawl_test_utils::FlakyExpandAllocator;

        proptest! {
            #[test]
            fn resize_preserves_prefix_and_fills_tail(
                initial in proptest::collection::vec(any::<i32>(), 0..40),
                new_len in 0usize..80,
                seed in any::<u64>(),
            ) {
                let ty = int32_type();
                let mut alloc = FlakyExpandAllocator::new(seed, 0.5);
                let arr = array_of(&mut alloc, &ty, &initial, Mutability::Mutable);
                let grown = engine().resize(&mut alloc, &arr, new_len, TailFill::Zero).unwrap();

                let mut expected = initial.clone();
                expected.resize(new_len, 0);
                prop_assert_eq!(values(&alloc, &grown), expected);
            }

            #[test]
            fn in_place_and_relocation_agree(
                initial in proptest::collection::vec(any::<i32>(), 1..20),
                extra in 1usize..20,
                default in any::<i32>(),
            ) {
                let (ty, _) = sentinel_default_type(default);
                let new_len = initial.len() + extra;

                let mut expanding = RecordingAllocator::new();
                let a = array_of(&mut expanding, &ty, &initial, Mutability::Mutable);
                // Make room so the in-place path is available.
                let a = engine().reserve(&mut expanding, &a, new_len).unwrap();
                let mut e1 = engine();
                let grown_in_place = e1.resize(&mut expanding, &a, new_len, TailFill::Default).unwrap();
                prop_assert_eq!(e1.last_path(), Some(GrowthPath::InPlaceExpand));

                let mut refusing = RecordingAllocator::new();
                let b = array_of(&mut refusing, &ty, &initial, Mutability::Mutable);
                refusing.refuse_expansion(true);
                let mut e2 = engine();
                let relocated = e2.resize(&mut refusing, &b, new_len, TailFill::Default).unwrap();
                prop_assert_eq!(e2.last_path(), Some(GrowthPath::ReallocateAndMigrate));

                prop_assert_eq!(values(&expanding, &grown_in_place), values(&refusing, &relocated));
            }
        }
    }
}
