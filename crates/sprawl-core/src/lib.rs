//! Core types and traits for Sprawl growable GC arrays.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the heap and the array machinery: block
//! addresses and attributes, mutability classes, per-type element
//! descriptions with their copy policy, the allocator and fatal-failure
//! collaborator traits, and the error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attrs;
pub mod error;
pub mod id;
pub mod mutability;
pub mod policy;
pub mod traits;
pub mod types;

pub use attrs::BlockAttrs;
pub use error::{AllocFailure, ArrayError, HookError, TypeInfoError};
pub use id::{BlockId, BlockPtr};
pub use mutability::Mutability;
pub use policy::CopyPolicy;
pub use traits::{BlockAllocator, FatalHandler};
pub use types::{ElementHooks, PlainHooks, TypeInfo, TypeInfoBuilder};
