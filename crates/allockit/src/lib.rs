//! # allockit
//!
//! Special-purpose memory management primitives.
//!
//! - [`BlockPool`](pool::BlockPool): fixed-size blocks for one element type,
//!   recycled through an intrusive free list and grown chunk by chunk
//! - [`ArenaAllocator`](arena::ArenaAllocator): bump allocation through one
//!   fixed buffer, with optional LIFO rollback, markers and bulk reset
//! - [`LockFreeStack`](lockfree::LockFreeStack): a Treiber stack with
//!   epoch-based node reclamation
//!
//! ## Quick Start
//!
//! ```rust
//! use allockit::prelude::*;
//!
//! // Fixed-size blocks, recycled on release
//! let mut pool = BlockPool::<u64>::with_chunk_size(64)?;
//! let value = pool.construct(42)?;
//! // SAFETY: `value` came from this pool and is destroyed once.
//! unsafe { pool.destroy(value.as_ptr()) };
//!
//! // Bulk allocation, released all at once
//! let mut arena = ArenaAllocator::new(4 * KB)?;
//! let numbers = arena.alloc_slice_copy(&[1_u32, 2, 3])?;
//! assert_eq!(numbers.len(), 3);
//! arena.reset();
//!
//! // Shared between threads without locks
//! let stack = LockFreeStack::new();
//! stack.push("job");
//! assert_eq!(stack.pop(), Some("job"));
//! # Ok::<(), MemoryError>(())
//! ```
//!
//! ## Features
//!
//! - `pool` (default): [`BlockPool`](pool::BlockPool)
//! - `arena` (default): [`ArenaAllocator`](arena::ArenaAllocator)
//! - `lockfree` (default): [`LockFreeStack`](lockfree::LockFreeStack)
//! - `logging` (default): Structured events through `tracing`
//! - `full`: Enable all features
//!
//! ## Architecture
//!
//! - Standalone error handling via the [`error`] module
//! - Optional structured logging via `tracing` (feature: `logging`)
//! - Shared [`MemoryUsage`](core::MemoryUsage),
//!   [`Resettable`](core::Resettable) and
//!   [`StatisticsProvider`](core::StatisticsProvider) traits

#![cfg_attr(docsrs, feature(doc_cfg))]
// Allocators manage raw memory; every unsafe block carries a SAFETY comment.
#![allow(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Precision loss in usize -> f64 casts is acceptable for stats
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)]
#![allow(clippy::return_self_not_must_use)]

// Error types
pub mod error;

// Core modules
pub mod core;
pub mod stats;
pub mod utils;

#[cfg(feature = "arena")]
#[cfg_attr(docsrs, doc(cfg(feature = "arena")))]
pub mod arena;
#[cfg(feature = "lockfree")]
#[cfg_attr(docsrs, doc(cfg(feature = "lockfree")))]
pub mod lockfree;
#[cfg(feature = "pool")]
#[cfg_attr(docsrs, doc(cfg(feature = "pool")))]
pub mod pool;

pub use crate::error::{MemoryError, MemoryResult, Result};
pub use crate::stats::AllocatorStats;

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    #[cfg(feature = "arena")]
    pub use crate::arena::{ArenaAllocator, ArenaConfig, ArenaMarker, ArenaScope, Discipline};
    pub use crate::core::size::{KB, MB};
    pub use crate::core::{MemoryUsage, Resettable, StatisticsProvider};
    pub use crate::error::{MemoryError, MemoryResult};
    #[cfg(feature = "lockfree")]
    pub use crate::lockfree::{LockFreeStack, StackStats};
    #[cfg(feature = "pool")]
    pub use crate::pool::{BlockPool, BlockPoolConfig, DropPolicy};
    pub use crate::stats::AllocatorStats;
}
