//! Standalone error types for allockit
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use core::alloc::Layout;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{debug, error, warn};

// ============================================================================
// Main Error Types
// ============================================================================

/// Memory management errors
///
/// Misuse of the raw pointer APIs (deallocating a foreign pointer, destroying
/// twice, touching memory after an arena reset) is undefined behaviour and is
/// never reported through this type.
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation Errors ---
    /// The underlying system allocator could not provide storage.
    #[error("Memory allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed {
        /// Requested size in bytes
        size: usize,
        /// Requested alignment in bytes
        align: usize,
    },

    /// A size computation overflowed `usize`.
    #[error("Size overflow during operation: {operation}")]
    SizeOverflow {
        /// Operation that overflowed
        operation: &'static str,
    },

    /// An alignment that is not a power of two.
    #[error("Invalid alignment: {alignment}")]
    InvalidAlignment {
        /// Offending alignment
        alignment: usize,
    },

    // --- Arena Errors ---
    /// An arena request does not fit in the remaining capacity.
    #[error(
        "Arena capacity exceeded: requested {requested} bytes, {available} of {capacity} bytes available"
    )]
    CapacityExceeded {
        /// Requested size in bytes (`usize::MAX` if the size overflowed)
        requested: usize,
        /// Bytes left behind the cursor
        available: usize,
        /// Total arena capacity
        capacity: usize,
    },

    // --- Pool Errors ---
    /// A bounded block pool reached its chunk limit.
    #[error("Block pool exhausted: {chunks} chunks of {blocks_per_chunk} blocks all in use")]
    PoolExhausted {
        /// Chunks currently owned by the pool
        chunks: usize,
        /// Blocks in each chunk
        blocks_per_chunk: usize,
    },

    // --- Configuration / State Errors ---
    /// A configuration value was rejected.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration is invalid
        reason: String,
    },

    /// An operation was attempted in a state that does not allow it.
    #[error("Invalid state: {reason}")]
    InvalidState {
        /// What went wrong
        reason: String,
    },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Capacity and exhaustion errors go away once the caller releases memory
    /// (arena reset, returning pool blocks). Everything else is permanent.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::PoolExhausted { .. }
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "MEM:ALLOC:FAILED",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::CapacityExceeded { .. } => "MEM:ARENA:CAPACITY",
            Self::PoolExhausted { .. } => "MEM:POOL:EXHAUSTED",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::InvalidState { .. } => "MEM:SYSTEM:STATE",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "memory allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create allocation failed error from layout
    pub fn allocation_failed_with_layout(layout: Layout) -> Self {
        Self::allocation_failed(layout.size(), layout.align())
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &'static str) -> Self {
        Self::SizeOverflow { operation }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create arena capacity exceeded error
    pub fn capacity_exceeded(requested: usize, available: usize, capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(requested, available, capacity, "arena capacity exceeded");

        Self::CapacityExceeded {
            requested,
            available,
            capacity,
        }
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(chunks: usize, blocks_per_chunk: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(chunks, blocks_per_chunk, "block pool exhausted");

        Self::PoolExhausted {
            chunks,
            blocks_per_chunk,
        }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create invalid state error
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================
