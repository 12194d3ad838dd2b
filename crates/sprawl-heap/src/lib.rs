//! Reference block heap for Sprawl arrays.
//!
//! [`BlockHeap`] implements [`BlockAllocator`](sprawl_core::BlockAllocator)
//! over plain `Vec<u8>` blocks. It is the allocator the array machinery is
//! tested and benchmarked against, and a working stand-in for a runtime
//! that has not wired its collector's heap in yet.
//!
//! # Architecture
//!
//! ```text
//! BlockHeap
//! ├── Block[] (indexed by BlockId, zeroed Vec<u8> rounded to a size class)
//! │   └── used size (grows in place only from the exact used end)
//! ├── finalizer table (BlockId → TypeInfo, allocation order)
//! └── HeapStats (allocation and expansion counters)
//! ```
//!
//! Blocks are never freed here. Reclamation belongs to the collector,
//! which calls [`BlockHeap::finalize_block`] for blocks carrying the
//! `FINALIZE` attribute.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod config;
pub mod error;
pub mod heap;
pub mod stats;

pub use config::HeapConfig;
pub use error::HeapError;
pub use heap::BlockHeap;
pub use stats::HeapStats;
