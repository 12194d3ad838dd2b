//! Fatal allocation failure handlers.
//!
//! Overflow and exhaustion never surface as `Err`: they go to a
//! [`FatalHandler`], which does not return. [`AbortOnFatal`] is what a
//! runtime without its own out-of-memory machinery wants;
//! [`PanicOnFatal`] lets a test harness observe the failure.

use std::sync::Arc;

use sprawl_core::{AllocFailure, BlockAllocator, BlockAttrs, BlockPtr, FatalHandler, TypeInfo};

use crate::size;

/// Writes a diagnostic to stderr and aborts the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbortOnFatal;

impl FatalHandler for AbortOnFatal {
    fn on_fatal(&self, failure: AllocFailure) -> ! {
        eprintln!("sprawl: fatal allocation failure: {failure}");
        std::process::abort()
    }
}

/// Panics with a diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanicOnFatal;

impl FatalHandler for PanicOnFatal {
    fn on_fatal(&self, failure: AllocFailure) -> ! {
        panic!("fatal allocation failure: {failure}")
    }
}

/// `count × element_size`, or the fatal path on overflow.
pub(crate) fn bytes_or_die<F: FatalHandler>(fatal: &F, element_size: usize, count: usize) -> usize {
    match size::byte_size(element_size, count) {
        Ok(bytes) => bytes,
        Err(failure) => fatal.on_fatal(failure),
    }
}

/// Allocate a block for elements of `ty`, or the fatal path on exhaustion.
///
/// Registers the element type's finalizer when `attrs` carries `FINALIZE`.
pub(crate) fn allocate_or_die<A, F>(
    alloc: &mut A,
    fatal: &F,
    bytes: usize,
    attrs: BlockAttrs,
    ty: &Arc<TypeInfo>,
) -> BlockPtr
where
    A: BlockAllocator + ?Sized,
    F: FatalHandler,
{
    let Some(ptr) = alloc.allocate(bytes, attrs) else {
        fatal.on_fatal(AllocFailure::Exhausted { requested: bytes })
    };
    if attrs.contains(BlockAttrs::FINALIZE) {
        alloc.register_finalizer(ptr, ty);
    }
    ptr
}
