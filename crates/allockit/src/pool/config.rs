//! Block pool configuration

use super::DropPolicy;
use crate::error::{MemoryError, MemoryResult};

/// Number of blocks per chunk when nothing else is configured
pub const DEFAULT_BLOCKS_PER_CHUNK: usize = 1024;

/// Configuration for [`BlockPool`](super::BlockPool)
#[derive(Debug, Clone)]
pub struct BlockPoolConfig {
    /// Blocks allocated together each time the pool grows
    pub blocks_per_chunk: usize,

    /// Upper bound on the number of chunks; `None` grows without limit
    pub max_chunks: Option<usize>,

    /// Allocate the first chunk at construction instead of on first use
    pub preallocate: bool,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte for newly allocated blocks (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for released blocks (for debugging)
    pub dealloc_pattern: Option<u8>,

    /// Behaviour for blocks still allocated when the pool is dropped
    pub drop_policy: DropPolicy,
}

impl Default for BlockPoolConfig {
    fn default() -> Self {
        Self {
            blocks_per_chunk: DEFAULT_BLOCKS_PER_CHUNK,
            max_chunks: None,
            preallocate: false,
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
            drop_policy: DropPolicy::default(),
        }
    }
}

impl BlockPoolConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            blocks_per_chunk: DEFAULT_BLOCKS_PER_CHUNK,
            max_chunks: None,
            preallocate: true,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            drop_policy: DropPolicy::LeakLiveBlocks,
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            blocks_per_chunk: 64,
            max_chunks: None,
            preallocate: false,
            track_stats: true,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
            drop_policy: DropPolicy::MustBeEmpty,
        }
    }

    /// Performance configuration - minimal overhead
    #[must_use]
    pub fn performance() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            ..Self::production()
        }
    }

    /// Pool that refuses to grow past `max_chunks` chunks
    #[must_use]
    pub fn bounded(max_chunks: usize) -> Self {
        Self {
            max_chunks: Some(max_chunks),
            ..Self::default()
        }
    }

    /// Same configuration with a different chunk size
    #[must_use]
    pub fn with_blocks_per_chunk(mut self, blocks_per_chunk: usize) -> Self {
        self.blocks_per_chunk = blocks_per_chunk;
        self
    }

    /// Checks the configuration for values the pool cannot work with
    pub fn validate(&self) -> MemoryResult<()> {
        if self.blocks_per_chunk == 0 {
            return Err(MemoryError::invalid_config(
                "blocks_per_chunk must be greater than zero",
            ));
        }
        if self.max_chunks == Some(0) {
            return Err(MemoryError::invalid_config(
                "max_chunks must allow at least one chunk",
            ));
        }
        Ok(())
    }
}
