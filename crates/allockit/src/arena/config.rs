//! Arena allocator configuration

use crate::core::types::alignment::{CACHE_LINE, DEFAULT_BUFFER_ALIGN};
use crate::error::{MemoryError, MemoryResult};
use crate::utils::is_power_of_two;

/// How an arena treats `deallocate`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Discipline {
    /// Releasing the most recent allocation rolls the cursor back
    #[default]
    Stack,
    /// Memory comes back only through `reset` or a marker
    Linear,
}

/// Configuration for [`ArenaAllocator`](super::ArenaAllocator)
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Deallocation discipline
    pub discipline: Discipline,

    /// Alignment of an owned buffer's first byte
    pub base_align: usize,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill patterns for debugging
    pub alloc_pattern: Option<u8>,
    pub dealloc_pattern: Option<u8>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            discipline: Discipline::default(),
            base_align: DEFAULT_BUFFER_ALIGN,
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xCC)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
        }
    }
}

impl ArenaConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            discipline: Discipline::Stack,
            base_align: DEFAULT_BUFFER_ALIGN,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            discipline: Discipline::Stack,
            base_align: DEFAULT_BUFFER_ALIGN,
            track_stats: true,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Performance configuration - minimal overhead, cache-line aligned buffer
    #[must_use]
    pub fn performance() -> Self {
        Self {
            base_align: CACHE_LINE,
            ..Self::production()
        }
    }

    /// Default configuration with linear discipline
    #[must_use]
    pub fn linear() -> Self {
        Self {
            discipline: Discipline::Linear,
            ..Self::default()
        }
    }

    /// Default configuration with stack discipline
    #[must_use]
    pub fn stack() -> Self {
        Self {
            discipline: Discipline::Stack,
            ..Self::default()
        }
    }

    /// Checks the configuration for values the arena cannot work with
    pub fn validate(&self) -> MemoryResult<()> {
        if !is_power_of_two(self.base_align) {
            return Err(MemoryError::invalid_alignment(self.base_align));
        }
        Ok(())
    }
}
