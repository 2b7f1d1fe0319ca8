//! Fixed-capacity arena allocator
//!
//! ## Modules
//! - `allocator` - Main `ArenaAllocator` with stack or linear discipline
//! - `buffer` - Owned or borrowed backing storage
//! - `config` - Configuration variants and the deallocation `Discipline`
//! - `marker` - Cursor markers and the RAII `ArenaScope`

pub mod allocator;
mod buffer;
pub mod config;
pub mod marker;

pub use allocator::ArenaAllocator;
pub use config::{ArenaConfig, Discipline};
pub use marker::{ArenaMarker, ArenaScope};
