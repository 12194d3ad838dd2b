//! Benchmark workloads for Sprawl array growth and concatenation.
//!
//! Provides ready-made element types and workloads shared by the
//! Criterion benches:
//!
//! - [`element_type`]: a hook-free element of a given size
//! - [`append_one_at_a_time`]: grow an array by repeated single appends
//! - [`raw_sources`]: deterministic byte sources for concatenation

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use sprawl_array::{ArrayDescriptor, GrowthEngine, PanicOnFatal};
use sprawl_core::{ArrayError, BlockAllocator, Mutability, TypeInfo, TypeInfoError};

/// A trivially copied element of `size` bytes.
pub fn element_type(size: usize) -> Result<Arc<TypeInfo>, TypeInfoError> {
    TypeInfo::builder(format!("bench{size}"), size).build()
}

/// Append `count` elements to an empty array, one at a time.
///
/// Element `i` is filled with the byte `i as u8`. Returns the final array
/// and the engine so callers can inspect its growth counters.
pub fn append_one_at_a_time<A: BlockAllocator + ?Sized>(
    alloc: &mut A,
    ty: &Arc<TypeInfo>,
    count: usize,
) -> Result<(ArrayDescriptor, GrowthEngine<PanicOnFatal>), ArrayError> {
    let mut engine = GrowthEngine::with_fatal_handler(PanicOnFatal);
    let mut array = ArrayDescriptor::empty(Arc::clone(ty), Mutability::Mutable);
    let mut element = vec![0u8; ty.size()];
    for i in 0..count {
        element.fill(i as u8);
        array = engine.append_scalar(alloc, &array, &element)?;
    }
    Ok((array, engine))
}

/// `count` raw sources of `len` elements each.
///
/// Source `i` is filled with the byte `i as u8`.
pub fn raw_sources(ty: &TypeInfo, count: usize, len: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| vec![i as u8; ty.size() * len])
        .collect()
}
