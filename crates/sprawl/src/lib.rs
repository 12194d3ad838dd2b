//! Sprawl: growable arrays for garbage-collected language runtimes.
//!
//! This is the facade crate that re-exports the public API from all
//! Sprawl sub-crates. Most runtimes only need `sprawl` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use sprawl::prelude::*;
//!
//! let mut heap = BlockHeap::new();
//! let int = TypeInfo::builder("int", 4).build().unwrap();
//! let mut engine = GrowthEngine::new();
//!
//! let empty = ArrayDescriptor::empty(int.clone(), Mutability::Mutable);
//! let three = engine.resize(&mut heap, &empty, 3, TailFill::Zero).unwrap();
//! assert_eq!(three.len(), 3);
//! assert!(three.bytes(&heap).unwrap().iter().all(|&b| b == 0));
//!
//! let seven = 7i32.to_le_bytes();
//! let four = engine.append_scalar(&mut heap, &three, &seven).unwrap();
//! assert_eq!(four.element(&heap, 3).unwrap(), &seven);
//! assert_eq!(engine.last_path(), Some(GrowthPath::InPlaceExpand));
//!
//! let request = ConcatRequest::new(int, Mutability::Immutable)
//!     .array(&four)
//!     .scalar(&seven);
//! let joined = ConcatenationAssembler::new()
//!     .assemble(&mut heap, &request)
//!     .unwrap();
//! assert_eq!(joined.len(), 5);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sprawl-core` | Block addresses, attributes, element types, collaborator traits, errors |
//! | [`heap`] | `sprawl-heap` | Reference block heap and its configuration |
//! | [`array`] | `sprawl-array` | Growth engine, concatenation, array views |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`sprawl-core`).
///
/// Implement [`types::BlockAllocator`] to plug a collector's heap in and
/// [`types::FatalHandler`] to route out-of-memory conditions.
pub use sprawl_core as types;

/// Reference block heap (`sprawl-heap`).
pub use sprawl_heap as heap;

/// Array growth and concatenation (`sprawl-array`).
///
/// [`array::GrowthEngine`] resizes and appends,
/// [`array::ConcatenationAssembler`] builds one array from many sources.
pub use sprawl_array as array;

/// Common imports for typical Sprawl usage.
///
/// ```rust
/// use sprawl::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use sprawl_core::{
        BlockAllocator, BlockAttrs, BlockPtr, CopyPolicy, ElementHooks, FatalHandler, Mutability,
        TypeInfo,
    };

    // Errors
    pub use sprawl_core::{AllocFailure, ArrayError, HookError};

    // Heap
    pub use sprawl_heap::{BlockHeap, HeapConfig};

    // Arrays
    pub use sprawl_array::{
        AbortOnFatal, ArrayDescriptor, ConcatRequest, ConcatenationAssembler, GrowthEngine,
        GrowthPath, Source, TailFill,
    };
}
