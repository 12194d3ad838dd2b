//! Array views over heap blocks.
//!
//! An [`ArrayDescriptor`] is a data pointer plus a length, tagged with its
//! element type and mutability class. It owns nothing: the bytes belong to
//! the block it points into, and the collector reclaims that block once
//! no view reaches it. Growth and concatenation never edit a descriptor;
//! they hand back a new one.

use std::sync::Arc;

use sprawl_core::{ArrayError, BlockAllocator, BlockPtr, Mutability, TypeInfo};

/// A view of `len` elements starting at `data`.
///
/// `data` is `None` for an array that has never had storage. A view may
/// keep its pointer at length zero (after truncation), so that
/// [`assume_safe_append`](crate::GrowthEngine::assume_safe_append) can
/// hand the block back to it.
#[derive(Clone, Debug)]
pub struct ArrayDescriptor {
    data: Option<BlockPtr>,
    len: usize,
    ty: Arc<TypeInfo>,
    mutability: Mutability,
}

impl ArrayDescriptor {
    /// An array with no storage.
    pub fn empty(ty: Arc<TypeInfo>, mutability: Mutability) -> Self {
        Self {
            data: None,
            len: 0,
            ty,
            mutability,
        }
    }

    /// A view of `len` elements at `data`.
    ///
    /// The caller guarantees `len × element size` bytes at `data` hold
    /// constructed elements of `ty`.
    pub(crate) fn from_parts(
        data: BlockPtr,
        len: usize,
        ty: Arc<TypeInfo>,
        mutability: Mutability,
    ) -> Self {
        Self {
            data: Some(data),
            len,
            ty,
            mutability,
        }
    }

    /// Data pointer, `None` if the array never had storage.
    pub fn data(&self) -> Option<BlockPtr> {
        self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element type.
    pub fn element_type(&self) -> &Arc<TypeInfo> {
        &self.ty
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.ty.size()
    }

    /// Mutability class.
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Length of the view in bytes.
    ///
    /// Cannot overflow: every view with storage was sized through a
    /// checked multiply when its block was allocated.
    pub fn byte_len(&self) -> usize {
        self.len * self.ty.size()
    }

    /// Reinterpret the same elements under another mutability class.
    pub fn with_mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    /// The first `len` elements of this view. `len` must not exceed the
    /// current length.
    pub(crate) fn truncated(&self, len: usize) -> Self {
        debug_assert!(len <= self.len);
        Self {
            data: self.data,
            len,
            ty: Arc::clone(&self.ty),
            mutability: self.mutability,
        }
    }

    /// Address of element `index`. `index == len` yields the end address.
    pub fn element_ptr(&self, index: usize) -> Option<BlockPtr> {
        if index > self.len {
            return None;
        }
        self.data?.add(index * self.ty.size())
    }

    /// The sub-view `[start, end)`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfBounds`] if `start > end` or `end > len`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self, ArrayError> {
        if end > self.len {
            return Err(ArrayError::OutOfBounds {
                index: end,
                len: self.len,
            });
        }
        if start > end {
            return Err(ArrayError::OutOfBounds {
                index: start,
                len: end,
            });
        }
        Ok(Self {
            data: self.element_ptr(start),
            len: end - start,
            ty: Arc::clone(&self.ty),
            mutability: self.mutability,
        })
    }

    /// The view's bytes.
    pub fn bytes<'h, A>(&self, alloc: &'h A) -> Result<&'h [u8], ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        let Some(ptr) = self.data else {
            return Ok(&[]);
        };
        let len = self.byte_len();
        alloc
            .bytes(ptr, len)
            .ok_or(ArrayError::InvalidView { ptr, len })
    }

    /// The bytes of element `index`.
    pub fn element<'h, A>(&self, alloc: &'h A, index: usize) -> Result<&'h [u8], ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        if index >= self.len {
            return Err(ArrayError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let size = self.ty.size();
        let bytes = self.bytes(alloc)?;
        Ok(&bytes[index * size..(index + 1) * size])
    }

    /// Write access to the view's bytes.
    ///
    /// # Errors
    ///
    /// [`ArrayError::NotWritable`] for `Const` and `Immutable` views.
    pub fn bytes_mut<'h, A>(&self, alloc: &'h mut A) -> Result<&'h mut [u8], ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        if !self.mutability.is_writable() {
            return Err(ArrayError::NotWritable {
                mutability: self.mutability,
            });
        }
        let Some(ptr) = self.data else {
            return Ok(&mut []);
        };
        let len = self.byte_len();
        alloc
            .bytes_mut(ptr, len)
            .ok_or(ArrayError::InvalidView { ptr, len })
    }

    /// Overwrite element `index` with the raw bytes `value`.
    ///
    /// This is plain assignment: no hook runs.
    pub fn set_element<A>(&self, alloc: &mut A, index: usize, value: &[u8]) -> Result<(), ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        let size = self.ty.size();
        if value.len() != size {
            return Err(ArrayError::ScalarSize {
                expected: size,
                found: value.len(),
            });
        }
        if index >= self.len {
            return Err(ArrayError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let bytes = self.bytes_mut(alloc)?;
        bytes[index * size..(index + 1) * size].copy_from_slice(value);
        Ok(())
    }
}
