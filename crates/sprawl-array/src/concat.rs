//! Multi-source concatenation.
//!
//! A [`ConcatRequest`] lists sources in output order. The
//! [`ConcatenationAssembler`] sizes the result once, allocates exactly one
//! block, and materializes every source element into it with the element
//! type's copy policy.

use std::sync::Arc;

use smallvec::SmallVec;
use sprawl_core::{ArrayError, BlockAllocator, FatalHandler, Mutability, TypeInfo};

use crate::descriptor::ArrayDescriptor;
use crate::fatal::{allocate_or_die, bytes_or_die, AbortOnFatal};
use crate::policy::{block_attrs, copy_elements, retract_used};
use crate::size::total_count;

/// One input to a concatenation or append.
#[derive(Clone, Copy, Debug)]
pub enum Source<'a> {
    /// Every element of a heap array.
    Array(&'a ArrayDescriptor),
    /// Raw elements outside the heap. Must be a whole number of elements.
    Slice(&'a [u8]),
    /// Exactly one element.
    Scalar(&'a [u8]),
}

impl Source<'_> {
    /// Number of elements this source contributes to an array of `ty`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::TypeMismatch`] for an array of another element type,
    /// [`ArrayError::ScalarSize`] for a scalar that is not one element,
    /// [`ArrayError::Misaligned`] for a slice with a partial element.
    pub fn checked_len(&self, ty: &TypeInfo) -> Result<usize, ArrayError> {
        let size = ty.size();
        match *self {
            Self::Array(array) => {
                if !array.element_type().same_type(ty) {
                    return Err(ArrayError::TypeMismatch {
                        expected: ty.name().to_owned(),
                        found: array.element_type().name().to_owned(),
                    });
                }
                Ok(array.len())
            }
            Self::Slice(bytes) => {
                if bytes.len() % size != 0 {
                    return Err(ArrayError::Misaligned {
                        len: bytes.len(),
                        element_size: size,
                    });
                }
                Ok(bytes.len() / size)
            }
            Self::Scalar(bytes) => {
                if bytes.len() != size {
                    return Err(ArrayError::ScalarSize {
                        expected: size,
                        found: bytes.len(),
                    });
                }
                Ok(1)
            }
        }
    }
}

/// An ordered list of sources and the shape of the array to build.
#[derive(Clone, Debug)]
pub struct ConcatRequest<'a> {
    ty: Arc<TypeInfo>,
    mutability: Mutability,
    sources: SmallVec<[Source<'a>; 4]>,
}

impl<'a> ConcatRequest<'a> {
    /// An empty request producing an array of `ty` with `mutability`.
    pub fn new(ty: Arc<TypeInfo>, mutability: Mutability) -> Self {
        Self {
            ty,
            mutability,
            sources: SmallVec::new(),
        }
    }

    /// Append every element of `array`.
    pub fn array(self, array: &'a ArrayDescriptor) -> Self {
        self.push(Source::Array(array))
    }

    /// Append the raw elements in `bytes`.
    pub fn slice(self, bytes: &'a [u8]) -> Self {
        self.push(Source::Slice(bytes))
    }

    /// Append one element.
    pub fn scalar(self, element: &'a [u8]) -> Self {
        self.push(Source::Scalar(element))
    }

    /// Append any source.
    pub fn push(mut self, source: Source<'a>) -> Self {
        self.sources.push(source);
        self
    }

    /// Sources in output order.
    pub fn sources(&self) -> &[Source<'a>] {
        &self.sources
    }

    /// Element type of the result.
    pub fn element_type(&self) -> &Arc<TypeInfo> {
        &self.ty
    }

    /// Mutability class of the result.
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }
}

impl<'a> Extend<Source<'a>> for ConcatRequest<'a> {
    fn extend<I: IntoIterator<Item = Source<'a>>>(&mut self, iter: I) {
        self.sources.extend(iter);
    }
}

/// Builds one array from many sources.
#[derive(Debug, Default)]
pub struct ConcatenationAssembler<F = AbortOnFatal> {
    fatal: F,
}

impl ConcatenationAssembler {
    /// An assembler that aborts the process on fatal allocation failure.
    pub fn new() -> Self {
        Self::with_fatal_handler(AbortOnFatal)
    }
}

impl<F: FatalHandler> ConcatenationAssembler<F> {
    /// An assembler that reports overflow and exhaustion to `fatal`.
    pub fn with_fatal_handler(fatal: F) -> Self {
        Self { fatal }
    }

    /// Concatenate the request's sources into a freshly allocated array.
    ///
    /// The result's length is the sum of the source lengths, a scalar
    /// counting as one. A zero total yields an array without storage and
    /// no allocation happens.
    ///
    /// # Errors
    ///
    /// Source validation errors ([`ArrayError::TypeMismatch`],
    /// [`ArrayError::ScalarSize`], [`ArrayError::Misaligned`]) are returned
    /// before anything is allocated. A hook failure returns
    /// [`ArrayError::ElementConstructionFailure`] at once; elements already
    /// written stay written and the block's used size shrinks to them.
    pub fn assemble<A>(
        &self,
        alloc: &mut A,
        request: &ConcatRequest<'_>,
    ) -> Result<ArrayDescriptor, ArrayError>
    where
        A: BlockAllocator + ?Sized,
    {
        let ty = request.element_type();
        let lengths = request
            .sources()
            .iter()
            .map(|s| s.checked_len(ty))
            .collect::<Result<SmallVec<[usize; 8]>, _>>()?;
        let total = match total_count(lengths.iter().copied()) {
            Ok(total) => total,
            Err(failure) => self.fatal.on_fatal(failure),
        };
        if total == 0 {
            return Ok(ArrayDescriptor::empty(Arc::clone(ty), request.mutability()));
        }

        let bytes = bytes_or_die(&self.fatal, ty.size(), total);
        let atomic = request.mutability().is_atomic();
        let ptr = allocate_or_die(alloc, &self.fatal, bytes, block_attrs(ty), ty);
        // Const and immutable results are written through a mutable view
        // of the same block.
        let staging = ArrayDescriptor::from_parts(ptr, total, Arc::clone(ty), Mutability::Mutable);

        let mut cursor = 0;
        for (source, &len) in request.sources().iter().zip(&lengths) {
            if len == 0 {
                continue;
            }
            let span = len * ty.size();
            let dst_ptr = staging
                .element_ptr(cursor)
                .ok_or(ArrayError::OutOfBounds {
                    index: cursor,
                    len: total,
                })?;
            let written = match *source {
                Source::Array(array) => {
                    let src_ptr = array.data().ok_or(ArrayError::InvalidView {
                        ptr: dst_ptr,
                        len: span,
                    })?;
                    let (src, dst) = alloc
                        .split_regions(src_ptr, span, dst_ptr, span)
                        .ok_or(ArrayError::InvalidView { ptr: src_ptr, len: span })?;
                    copy_elements(ty, dst, src, cursor)
                }
                Source::Slice(src) | Source::Scalar(src) => {
                    let dst = staging.bytes_mut(&mut *alloc)?;
                    let start = cursor * ty.size();
                    copy_elements(ty, &mut dst[start..start + span], src, cursor)
                }
            };
            written.map_err(|err| retract_used(&mut *alloc, ptr, ty, atomic, err))?;
            cursor += len;
        }
        Ok(staging.with_mutability(request.mutability()))
    }
}
