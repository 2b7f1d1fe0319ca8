//! Fixed-size block pool
//!
//! ## Modules
//! - `block_pool` - Main `BlockPool` implementation with a chunked free list
//! - `block` - Block / chunk storage shared by the free list and live elements
//! - `config` - Configuration variants (production, debug, performance, bounded)
//! - `drop_policy` - What happens to live blocks when the pool is dropped

mod block;
pub mod block_pool;
pub mod config;
pub mod drop_policy;

pub use block_pool::BlockPool;
pub use config::BlockPoolConfig;
pub use drop_policy::DropPolicy;
