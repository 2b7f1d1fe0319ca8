//! Core functionality for allockit
//!
//! Shared building blocks used by every allocator in the crate:
//! - Base traits for memory usage, reset and statistics
//! - Common size and alignment constants

pub mod traits;
pub mod types;

pub use traits::{MemoryUsage, Resettable, StatisticsProvider};
pub use types::*;
