//! Growable GC arrays for Sprawl.
//!
//! The array layer sits between a language runtime and its collector's
//! block allocator. It resizes arrays (in place when the allocator can
//! grow the block, by relocation otherwise) and assembles concatenations
//! into a single exactly sized block. Element copies honour each type's
//! copy policy.
//!
//! # Architecture
//!
//! ```text
//! caller ──► GrowthEngine ──────────┐
//!        └─► ConcatenationAssembler ┤
//!                                   ├─► size (checked byte/length math)
//!                                   ├─► policy (materialize by CopyPolicy)
//!                                   ├─► BlockAllocator (injected)
//!                                   └─► FatalHandler (overflow, exhaustion)
//! ```
//!
//! Arrays are [`ArrayDescriptor`] values. They own nothing; every
//! operation returns a new descriptor and leaves its inputs valid.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod concat;
pub mod descriptor;
pub mod fatal;
pub mod growth;
pub mod policy;
pub mod size;
pub mod stats;

pub use concat::{ConcatRequest, ConcatenationAssembler, Source};
pub use descriptor::ArrayDescriptor;
pub use fatal::{AbortOnFatal, PanicOnFatal};
pub use growth::GrowthEngine;
pub use policy::TailFill;
pub use stats::{GrowthPath, GrowthStats};
