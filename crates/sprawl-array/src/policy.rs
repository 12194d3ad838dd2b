//! Copy-policy-driven element materialization.
//!
//! Every write of elements into a destination block goes through
//! [`materialize`], which dispatches once on the [`CopyPolicy`] and then
//! walks the run element by element. A hook failure stops the walk at the
//! failing element: elements before it stay constructed, elements after
//! it are never touched.

use sprawl_core::{
    ArrayError, BlockAllocator, BlockAttrs, BlockPtr, CopyPolicy, HookError, TypeInfo,
};

/// How newly added slots are initialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TailFill {
    /// Set every new byte to zero.
    Zero,
    /// Default-construct every new element through the type's hook.
    Default,
}

impl TailFill {
    /// The cheapest fill that yields default values for `ty`.
    ///
    /// Picks [`Zero`](Self::Zero) whenever the initializer is all zero
    /// bytes, looking only at the initializer. The default-construct hook
    /// then never runs, so callers whose hook has side effects must pass
    /// [`Default`](Self::Default) explicitly.
    pub fn for_type(ty: &TypeInfo) -> Self {
        if ty.is_zero_init() {
            Self::Zero
        } else {
            Self::Default
        }
    }
}

/// Attributes for a block that will hold elements of `ty`.
pub fn block_attrs(ty: &TypeInfo) -> BlockAttrs {
    ty.block_attrs() | BlockAttrs::APPENDABLE
}

/// Materialize a run of elements into `dst` according to `policy`.
///
/// `src` holds the same number of elements as `dst` and is ignored for
/// [`CopyPolicy::DefaultConstruct`]. `first_index` is the destination
/// index of the run's first element, used to report failures.
pub fn materialize(
    ty: &TypeInfo,
    policy: CopyPolicy,
    dst: &mut [u8],
    src: &[u8],
    first_index: usize,
) -> Result<(), ArrayError> {
    let size = ty.size();
    let hooks = ty.hooks();
    let failed = |i: usize, source: HookError| ArrayError::ElementConstructionFailure {
        index: first_index + i,
        source,
    };

    match policy {
        CopyPolicy::Trivial => {
            debug_assert_eq!(dst.len(), src.len());
            dst.copy_from_slice(src);
        }
        CopyPolicy::Postblit => {
            let pairs = dst.chunks_exact_mut(size).zip(src.chunks_exact(size));
            for (i, (d, s)) in pairs.enumerate() {
                d.copy_from_slice(s);
                hooks.postblit(d).map_err(|e| failed(i, e))?;
            }
        }
        CopyPolicy::CopyConstruct => {
            let pairs = dst.chunks_exact_mut(size).zip(src.chunks_exact(size));
            for (i, (d, s)) in pairs.enumerate() {
                hooks.copy_construct(d, s).map_err(|e| failed(i, e))?;
            }
        }
        CopyPolicy::DefaultConstruct => {
            let init = ty.initializer();
            for (i, d) in dst.chunks_exact_mut(size).enumerate() {
                hooks.default_construct(d, init).map_err(|e| failed(i, e))?;
            }
        }
    }
    Ok(())
}

/// Copy the elements in `src` into `dst` with the type's copy policy.
pub fn copy_elements(
    ty: &TypeInfo,
    dst: &mut [u8],
    src: &[u8],
    first_index: usize,
) -> Result<(), ArrayError> {
    materialize(ty, ty.copy_policy(), dst, src, first_index)
}

/// Initialize previously unoccupied slots in `dst`.
pub fn init_elements(
    ty: &TypeInfo,
    dst: &mut [u8],
    fill: TailFill,
    first_index: usize,
) -> Result<(), ArrayError> {
    match fill {
        TailFill::Zero => {
            dst.fill(0);
            Ok(())
        }
        TailFill::Default => materialize(ty, CopyPolicy::DefaultConstruct, dst, &[], first_index),
    }
}

/// Shrink the used size of the block at `ptr` to the elements built
/// before a hook failure, so its finalizer only sees constructed slots.
///
/// The failure index counts elements from `ptr`. Other errors pass
/// through untouched.
pub(crate) fn retract_used<A>(
    alloc: &mut A,
    ptr: BlockPtr,
    ty: &TypeInfo,
    atomic: bool,
    err: ArrayError,
) -> ArrayError
where
    A: BlockAllocator + ?Sized,
{
    if let ArrayError::ElementConstructionFailure { index, .. } = &err {
        if let Some(built) = index.checked_mul(ty.size()) {
            alloc.set_used_bytes(ptr, built, atomic);
        }
    }
    err
}
