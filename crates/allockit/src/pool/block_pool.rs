//! Main block pool implementation
//!
//! # Safety
//!
//! This module implements a single-threaded fixed-block allocator:
//! - Blocks live in chunks that are allocated on demand and never moved
//! - Free blocks form an intrusive singly-linked list through their storage
//! - Allocated blocks hold exactly one element owned by the caller
//!
//! ## Invariants
//!
//! - Every block is either reachable from `free_head` or allocated, never both
//! - `used_blocks + free_list_len() == total_blocks`
//! - `total_blocks == chunks.len() * blocks_per_chunk`, and only ever grows
//! - A pointer returned by `allocate` stays valid until it is deallocated
//!
//! ## Thread Safety
//!
//! None. Every mutating operation takes `&mut self`, and the pool is `Send`
//! (when `T: Send`) but never `Sync`.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

use super::block::{Block, Chunk};
use super::{BlockPoolConfig, DropPolicy};
use crate::core::{MemoryUsage, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::stats::{AllocatorStats, Counters};

/// Pool allocator for values of a single type
///
/// Hands out storage for one `T` at a time from chunks of
/// `blocks_per_chunk` blocks. When every block is in use the pool grows by
/// one more chunk; chunks are released only when the pool is dropped, so
/// previously returned pointers survive growth.
///
/// # Memory Layout
/// ```text
/// chunk 1: [B4][B5][B6][B7]        free_head → B6 → B7 → B2 → null
/// chunk 0: [B0][B1][B2][B3]        allocated: B0 B1 B3 B4 B5
/// ```
///
/// # Example
/// ```
/// use allockit::pool::BlockPool;
///
/// let mut pool = BlockPool::<i32>::with_chunk_size(4)?;
/// let ptrs = (0..5).map(|i| pool.construct(i)).collect::<Result<Vec<_>, _>>()?;
///
/// assert_eq!(pool.chunk_count(), 2);
/// assert_eq!(pool.total_blocks(), 8);
/// assert_eq!(pool.utilization(), 0.625);
///
/// for ptr in ptrs {
///     // SAFETY: every pointer came from `construct` and is destroyed once.
///     unsafe { pool.destroy(ptr.as_ptr()) };
/// }
/// # Ok::<(), allockit::MemoryError>(())
/// ```
pub struct BlockPool<T> {
    /// Owned chunk storage, oldest first
    chunks: Vec<Chunk<T>>,

    /// Head of the free list, null when every block is allocated
    free_head: *mut Block<T>,

    /// Blocks across all chunks
    total_blocks: usize,

    /// Blocks currently handed out
    used_blocks: usize,

    /// Configuration
    config: BlockPoolConfig,

    /// Statistics (only updated if enabled)
    counters: Counters,

    _owns: PhantomData<T>,
}

impl<T> BlockPool<T> {
    /// Creates an empty pool with default configuration
    ///
    /// No memory is acquired until the first allocation.
    pub fn new() -> Self {
        Self::from_valid_config(BlockPoolConfig::default())
    }

    /// Creates an empty pool that grows `blocks_per_chunk` blocks at a time
    pub fn with_chunk_size(blocks_per_chunk: usize) -> MemoryResult<Self> {
        Self::with_config(BlockPoolConfig::default().with_blocks_per_chunk(blocks_per_chunk))
    }

    /// Creates a new pool with custom configuration
    pub fn with_config(config: BlockPoolConfig) -> MemoryResult<Self> {
        config.validate()?;

        let preallocate = config.preallocate;
        let mut pool = Self::from_valid_config(config);
        if preallocate {
            pool.grow()?;
        }
        Ok(pool)
    }

    /// Creates a production-optimized pool
    pub fn production() -> MemoryResult<Self> {
        Self::with_config(BlockPoolConfig::production())
    }

    /// Creates a debug-optimized pool
    pub fn debug() -> MemoryResult<Self> {
        Self::with_config(BlockPoolConfig::debug())
    }

    /// Creates a performance-optimized pool
    pub fn performance() -> MemoryResult<Self> {
        Self::with_config(BlockPoolConfig::performance())
    }

    fn from_valid_config(config: BlockPoolConfig) -> Self {
        Self {
            chunks: Vec::new(),
            free_head: ptr::null_mut(),
            total_blocks: 0,
            used_blocks: 0,
            config,
            counters: Counters::default(),
            _owns: PhantomData,
        }
    }

    /// Adds one chunk worth of blocks to the front of the free list
    fn grow(&mut self) -> MemoryResult<()> {
        let blocks_per_chunk = self.config.blocks_per_chunk;
        if let Some(max_chunks) = self.config.max_chunks {
            if self.chunks.len() >= max_chunks {
                return Err(MemoryError::pool_exhausted(
                    self.chunks.len(),
                    blocks_per_chunk,
                ));
            }
        }

        let chunk = Chunk::allocate(blocks_per_chunk)?;

        // Reserve the slot first so nothing can fail once the free list points
        // into the new chunk.
        self.chunks.try_reserve(1).map_err(|_| {
            MemoryError::allocation_failed(
                size_of::<Chunk<T>>(),
                align_of::<Chunk<T>>(),
            )
        })?;

        // SAFETY: The chunk was just allocated, so none of its blocks has been
        // handed out. The old head (possibly null) becomes the tail.
        let head = unsafe { chunk.link(self.free_head) };
        self.free_head = head.as_ptr();
        self.total_blocks += chunk.len();
        self.chunks.push(chunk);

        #[cfg(feature = "logging")]
        debug!(
            chunk = self.chunks.len() - 1,
            blocks_per_chunk,
            total_blocks = self.total_blocks,
            "block pool grew"
        );

        Ok(())
    }

    /// Returns uninitialized storage for one `T`
    ///
    /// Grows the pool by one chunk if no block is free. The returned pointer
    /// is properly aligned and stays valid until passed to
    /// [`deallocate`](Self::deallocate) or [`destroy`](Self::destroy).
    pub fn allocate(&mut self) -> MemoryResult<NonNull<T>> {
        if self.free_head.is_null() {
            if let Err(err) = self.grow() {
                if self.config.track_stats {
                    self.counters.record_failure();
                }
                return Err(err);
            }
        }

        // SAFETY: `grow` succeeded or the list was already non-empty, so the
        // head is a non-null free block whose `next` view is initialized.
        let block = unsafe { NonNull::new_unchecked(self.free_head) };
        // SAFETY: Free blocks are only ever written through `next`.
        self.free_head = unsafe { (*block.as_ptr()).next };
        self.used_blocks += 1;

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: The block was just unlinked and belongs to nobody else.
            unsafe { Chunk::fill(block, pattern) };
        }

        if self.config.track_stats {
            self.counters.record_allocation(self.used_memory());
        }

        Ok(Block::value_ptr(block))
    }

    /// Returns a block to the free list without dropping its contents
    ///
    /// A null pointer is ignored.
    ///
    /// # Safety
    /// - `ptr` must be null or a pointer obtained from this pool's
    ///   [`allocate`](Self::allocate) / [`construct`](Self::construct) that
    ///   has not been released since
    /// - The caller must not use `ptr` afterwards
    pub unsafe fn deallocate(&mut self, ptr: *mut T) {
        let Some(value) = NonNull::new(ptr) else {
            return;
        };
        debug_assert!(self.owns(ptr), "pointer was not allocated by this pool");
        debug_assert!(self.used_blocks > 0, "deallocate on a pool with no live blocks");

        let block = value.cast::<Block<T>>();
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: Caller hands the block back, so we have exclusive access.
            unsafe { Chunk::fill(block, pattern) };
        }
        // SAFETY: The block is ours again; switching it to the `next` view.
        unsafe { (*block.as_ptr()).next = self.free_head };
        self.free_head = block.as_ptr();
        self.used_blocks -= 1;

        if self.config.track_stats {
            self.counters.record_deallocation();
        }
    }

    /// Allocates a block and moves `value` into it
    pub fn construct(&mut self, value: T) -> MemoryResult<NonNull<T>> {
        let ptr = self.allocate()?;
        // SAFETY: `ptr` is fresh, aligned storage for exactly one `T`.
        unsafe { ptr.as_ptr().write(value) };
        Ok(ptr)
    }

    /// Builds a value with `init` and moves it into a new block
    ///
    /// `init` runs before any block is taken, so a panicking initializer
    /// leaves the pool untouched.
    pub fn construct_with<F>(&mut self, init: F) -> MemoryResult<NonNull<T>>
    where
        F: FnOnce() -> T,
    {
        let value = init();
        self.construct(value)
    }

    /// Drops the element in place and returns its block to the free list
    ///
    /// A null pointer is ignored.
    ///
    /// # Safety
    /// - `ptr` must be null or a pointer to a live element obtained from this
    ///   pool that has not been destroyed or deallocated since
    /// - The caller must not use `ptr` afterwards
    pub unsafe fn destroy(&mut self, ptr: *mut T) {
        if ptr.is_null() {
            return;
        }
        // SAFETY: Caller guarantees `ptr` holds a live `T` owned by this pool,
        // and the block is released right after the drop.
        unsafe {
            ptr::drop_in_place(ptr);
            self.deallocate(ptr);
        }
    }

    /// Number of blocks currently handed out
    pub fn used_blocks(&self) -> usize {
        self.used_blocks
    }

    /// Number of blocks across all chunks
    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    /// Number of blocks available without growing
    pub fn free_blocks(&self) -> usize {
        self.total_blocks - self.used_blocks
    }

    /// Number of chunks owned by the pool
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Blocks added by each growth step
    pub fn blocks_per_chunk(&self) -> usize {
        self.config.blocks_per_chunk
    }

    /// Size in bytes of one block
    pub fn block_size(&self) -> usize {
        Block::<T>::LAYOUT.size()
    }

    /// Fraction of blocks in use, `0.0` for a pool without chunks
    pub fn utilization(&self) -> f64 {
        if self.total_blocks == 0 {
            0.0
        } else {
            self.used_blocks as f64 / self.total_blocks as f64
        }
    }

    /// Returns true if no block is handed out
    pub fn is_empty(&self) -> bool {
        self.used_blocks == 0
    }

    /// Walks the free list and counts its blocks
    ///
    /// O(free blocks). Always equals [`free_blocks`](Self::free_blocks) unless
    /// a caller broke the deallocation contract.
    pub fn free_list_len(&self) -> usize {
        let mut len = 0;
        let mut cursor = self.free_head;
        while !cursor.is_null() {
            len += 1;
            // SAFETY: Every block reachable from the head is free and linked
            // through `next`.
            cursor = unsafe { (*cursor).next };
        }
        len
    }

    /// Whether `ptr` is the start of a block inside one of this pool's chunks
    ///
    /// Says nothing about whether the block is currently allocated.
    pub fn owns(&self, ptr: *const T) -> bool {
        let block = Block::from_value_ptr(ptr.cast_mut());
        self.chunks.iter().any(|chunk| chunk.contains(block))
    }

    /// Current configuration
    pub fn config(&self) -> &BlockPoolConfig {
        &self.config
    }
}

impl<T> Default for BlockPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for BlockPool<T> {
    fn drop(&mut self) {
        if self.used_blocks == 0 {
            return;
        }

        match self.config.drop_policy {
            DropPolicy::LeakLiveBlocks => {
                #[cfg(feature = "logging")]
                warn!(
                    live_blocks = self.used_blocks,
                    element = core::any::type_name::<T>(),
                    "block pool dropped with live blocks; their destructors will not run"
                );
            }
            DropPolicy::MustBeEmpty => {
                if !std::thread::panicking() {
                    panic!(
                        "BlockPool<{}> dropped with {} live blocks",
                        core::any::type_name::<T>(),
                        self.used_blocks
                    );
                }
            }
        }
    }
}

impl<T> fmt::Debug for BlockPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockPool")
            .field("element", &core::any::type_name::<T>())
            .field("used_blocks", &self.used_blocks)
            .field("total_blocks", &self.total_blocks)
            .field("chunks", &self.chunks.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T> MemoryUsage for BlockPool<T> {
    fn used_memory(&self) -> usize {
        self.used_blocks * self.block_size()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.free_blocks() * self.block_size())
    }
}

impl<T> StatisticsProvider for BlockPool<T> {
    fn statistics(&self) -> AllocatorStats {
        self.counters.snapshot(self.used_memory())
    }

    fn reset_statistics(&mut self) {
        self.counters = Counters::default();
    }

    fn statistics_enabled(&self) -> bool {
        self.config.track_stats
    }
}

// SAFETY: BlockPool can be sent between threads when its elements can.
// - Chunks are owned heap allocations with no thread affinity
// - The raw free-list pointers only point into those chunks
// - All mutation requires `&mut self`; the pool is deliberately not `Sync`
unsafe impl<T: Send> Send for BlockPool<T> {}
