//! Main arena allocator implementation
//!
//! # Safety
//!
//! This module implements a single-threaded bump allocator over one buffer:
//! - The cursor lives in a `Cell`, so allocation only needs `&self`
//! - Every allocation claims a disjoint byte range `[aligned, aligned + size)`
//! - Anything that moves the cursor backwards over live data (`reset`,
//!   `restore`) takes `&mut self`, so no safe borrow can outlive it
//! - `deallocate` is `unsafe` because it may release memory that a raw
//!   pointer still refers to
//!
//! ## Invariants
//!
//! - `0 <= offset <= capacity`
//! - Every returned pointer lies in `[start, start + capacity)`
//! - The cursor only grows on allocation; it drops to zero on `reset`, to a
//!   marker on `restore`, and (stack discipline only) back over the most
//!   recent allocation on `deallocate`

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::trace;

use super::buffer::Buffer;
use super::{ArenaConfig, ArenaMarker, ArenaScope, Discipline};
use crate::core::{MemoryUsage, Resettable, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::stats::{AllocatorStats, Counters};
use crate::utils::checked_align_up;

/// Arena allocator with an optional LIFO rollback
///
/// Hands out memory by bumping a cursor through a fixed buffer. It never
/// grows: a request that does not fit fails with
/// [`MemoryError::CapacityExceeded`] and leaves the arena untouched.
///
/// Under [`Discipline::Stack`] (the default) releasing the most recent
/// allocation rewinds the cursor; under [`Discipline::Linear`] memory comes
/// back only through [`reset`](Self::reset) or a marker.
///
/// Values placed with [`alloc`](Self::alloc) are never dropped by the arena.
///
/// # Memory Layout
/// ```text
/// [start]----[alloc1]--[pad]--[alloc2]----[offset]--------[capacity]
///             <-------- allocated -------->  <--- available --->
/// ```
///
/// # Example
/// ```
/// use allockit::arena::ArenaAllocator;
/// use allockit::MemoryError;
///
/// let arena = ArenaAllocator::new(16)?;
/// arena.allocate::<i32>(1)?;
/// assert_eq!(arena.bytes_used(), 4);
/// arena.allocate::<i64>(1)?;
/// assert_eq!(arena.bytes_used(), 16);
///
/// assert!(matches!(
///     arena.allocate::<u8>(1),
///     Err(MemoryError::CapacityExceeded { .. })
/// ));
/// # Ok::<(), MemoryError>(())
/// ```
pub struct ArenaAllocator<'buf> {
    /// Backing memory
    buffer: Buffer,

    /// Bytes from the start of the buffer to the first free byte
    offset: Cell<usize>,

    /// Configuration
    config: ArenaConfig,

    /// Statistics (only updated if enabled)
    counters: Cell<Counters>,

    _buf: PhantomData<&'buf mut [u8]>,
}

impl ArenaAllocator<'static> {
    /// Creates an arena owning `capacity` bytes, with default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, ArenaConfig::default())
    }

    /// Creates an arena owning `capacity` bytes
    pub fn with_config(capacity: usize, config: ArenaConfig) -> MemoryResult<Self> {
        config.validate()?;
        let buffer = Buffer::allocate(capacity, config.base_align)?;
        Ok(Self::from_parts(buffer, config))
    }

    /// Creates an owning arena that only releases memory on reset
    pub fn linear(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, ArenaConfig::linear())
    }

    /// Creates an owning arena with LIFO rollback
    pub fn stack(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, ArenaConfig::stack())
    }

    /// Creates a production-optimized arena
    pub fn production(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, ArenaConfig::production())
    }

    /// Creates a debug-optimized arena
    pub fn debug(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, ArenaConfig::debug())
    }

    /// Creates a performance-optimized arena
    pub fn performance(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, ArenaConfig::performance())
    }
}

impl<'buf> ArenaAllocator<'buf> {
    /// Creates an arena over caller-supplied memory
    ///
    /// The arena never frees `buffer`. Allocations are aligned by address, so
    /// the usable space depends on where the slice starts.
    pub fn from_buffer(buffer: &'buf mut [u8]) -> Self {
        let capacity = buffer.len();
        Self::from_parts(
            Buffer::borrowed(NonNull::from(buffer).cast::<u8>(), capacity),
            ArenaConfig::default(),
        )
    }

    /// Creates an arena over caller-supplied memory with custom configuration
    ///
    /// `base_align` is validated but has no effect on borrowed memory.
    pub fn from_buffer_with_config(
        buffer: &'buf mut [u8],
        config: ArenaConfig,
    ) -> MemoryResult<Self> {
        config.validate()?;
        let capacity = buffer.len();
        Ok(Self::from_parts(
            Buffer::borrowed(NonNull::from(buffer).cast::<u8>(), capacity),
            config,
        ))
    }

    /// Creates an arena over raw external memory
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of `capacity` bytes for the
    ///   whole of `'buf`
    /// - Nothing else may access that memory while the arena is alive
    /// - If the arena is sent to another thread, the memory must be usable
    ///   from there
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, capacity: usize) -> Self {
        Self::from_parts(Buffer::borrowed(ptr, capacity), ArenaConfig::default())
    }

    fn from_parts(buffer: Buffer, config: ArenaConfig) -> Self {
        Self {
            buffer,
            offset: Cell::new(0),
            config,
            counters: Cell::new(Counters::default()),
            _buf: PhantomData,
        }
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Reserves space for `count` values of `T`
    ///
    /// The memory is uninitialized. A request of zero bytes returns a
    /// dangling, well-aligned pointer and does not move the cursor.
    pub fn allocate<T>(&self, count: usize) -> MemoryResult<NonNull<T>> {
        let Ok(layout) = Layout::array::<T>(count) else {
            return Err(self.reject(usize::MAX));
        };
        self.allocate_layout(layout).map(NonNull::cast)
    }

    /// Reserves `layout.size()` bytes aligned to `layout.align()`
    pub fn allocate_layout(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        let size = layout.size();
        let align = layout.align();

        if size == 0 {
            // SAFETY: Alignments are non-zero, so the address is non-null.
            return Ok(unsafe { NonNull::new_unchecked(ptr::without_provenance_mut(align)) });
        }

        let start = self.buffer.start();
        let offset = self.offset.get();

        let Some(aligned_offset) =
            checked_align_up(start + offset, align).map(|aligned| aligned - start)
        else {
            return Err(self.reject(size));
        };
        let end = match aligned_offset.checked_add(size) {
            Some(end) if end <= self.buffer.capacity() => end,
            _ => return Err(self.reject(size)),
        };

        self.offset.set(end);
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: `[aligned_offset, end)` is in bounds and was unclaimed.
            unsafe { self.buffer.fill(aligned_offset, size, pattern) };
        }
        if self.config.track_stats {
            let mut counters = self.counters.get();
            counters.record_allocation(end);
            self.counters.set(counters);
        }

        // SAFETY: `aligned_offset < end <= capacity`, so the pointer is inside
        // the buffer and therefore non-null.
        Ok(unsafe { NonNull::new_unchecked(self.buffer.as_ptr().add(aligned_offset)) })
    }

    /// Moves `value` into the arena
    ///
    /// The value's destructor never runs.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T>(&self, value: T) -> MemoryResult<&mut T> {
        let ptr = self.allocate::<T>(1)?;
        // SAFETY: `ptr` is fresh, aligned storage for one `T` that no other
        // reference covers; it stays valid until `&mut self` is taken.
        unsafe {
            ptr.as_ptr().write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Copies a slice into the arena
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> MemoryResult<&mut [T]> {
        let ptr = self.allocate::<T>(src.len())?;
        // SAFETY: `ptr` is fresh storage for `src.len()` values and cannot
        // overlap `src`, which lives outside the unclaimed region.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            Ok(core::slice::from_raw_parts_mut(ptr.as_ptr(), src.len()))
        }
    }

    /// Copies a string into the arena
    pub fn alloc_str(&self, src: &str) -> MemoryResult<&str> {
        let bytes = self.alloc_slice_copy(src.as_bytes())?;
        // SAFETY: The bytes were copied from a valid `str`.
        Ok(unsafe { core::str::from_utf8_unchecked(bytes) })
    }

    /// Releases an allocation if it is the most recent one
    ///
    /// Only arenas with [`Discipline::Stack`] roll back. Returns `true` if the
    /// cursor moved; any other pointer (or a null pointer) is ignored.
    ///
    /// # Safety
    /// - `ptr` must be null or come from this arena's
    ///   [`allocate::<T>(count)`](Self::allocate) with the same `count`
    /// - Nothing may use the released memory afterwards, including references
    ///   handed out by [`alloc`](Self::alloc)
    pub unsafe fn deallocate<T>(&self, ptr: *mut T, count: usize) -> bool {
        if ptr.is_null() || self.config.discipline != Discipline::Stack {
            return false;
        }
        let Some(bytes) = count.checked_mul(size_of::<T>()) else {
            return false;
        };
        if bytes == 0 {
            return false;
        }

        let offset = self.offset.get();
        let top = self.buffer.start() + offset;
        if (ptr as usize).checked_add(bytes) != Some(top) {
            return false;
        }

        let new_offset = offset - bytes;
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: Caller releases the range, which is inside the buffer.
            unsafe { self.buffer.fill(new_offset, bytes, pattern) };
        }
        self.offset.set(new_offset);
        if self.config.track_stats {
            let mut counters = self.counters.get();
            counters.record_deallocation();
            self.counters.set(counters);
        }
        true
    }

    // ------------------------------------------------------------------
    // Reset and markers
    // ------------------------------------------------------------------

    /// Releases every allocation
    pub fn reset(&mut self) {
        self.rewind_to(0);

        #[cfg(feature = "logging")]
        trace!(capacity = self.capacity(), "arena reset");
    }

    /// Records the current cursor position
    pub fn mark(&self) -> ArenaMarker {
        ArenaMarker {
            offset: self.offset.get(),
            base: self.buffer.start(),
        }
    }

    /// Releases every allocation made after `marker`
    ///
    /// Fails with [`MemoryError::InvalidState`] if the marker belongs to
    /// another arena or lies beyond the current cursor.
    pub fn restore(&mut self, marker: ArenaMarker) -> MemoryResult<()> {
        if marker.base != self.buffer.start() {
            return Err(MemoryError::invalid_state(
                "marker belongs to a different arena",
            ));
        }
        if marker.offset > self.offset.get() {
            return Err(MemoryError::invalid_state(format!(
                "marker offset {} is beyond the cursor at {}",
                marker.offset,
                self.offset.get()
            )));
        }

        self.rewind_to(marker.offset);

        #[cfg(feature = "logging")]
        trace!(offset = marker.offset, "arena restored to marker");

        Ok(())
    }

    /// Opens a scope that restores the current position when dropped
    pub fn scope(&mut self) -> ArenaScope<'_, 'buf> {
        ArenaScope::new(self)
    }

    fn rewind_to(&mut self, offset: usize) {
        let current = self.offset.get();
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: `offset <= current <= capacity`, and `&mut self` rules
            // out live borrows of the released range.
            unsafe { self.buffer.fill(offset, current - offset, pattern) };
        }
        self.offset.set(offset);
    }

    fn reject(&self, requested: usize) -> MemoryError {
        if self.config.track_stats {
            let mut counters = self.counters.get();
            counters.record_failure();
            self.counters.set(counters);
        }
        MemoryError::capacity_exceeded(requested, self.bytes_remaining(), self.capacity())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Bytes between the start of the buffer and the cursor
    pub fn bytes_used(&self) -> usize {
        self.offset.get()
    }

    /// Bytes after the cursor
    pub fn bytes_remaining(&self) -> usize {
        self.buffer.capacity() - self.offset.get()
    }

    /// Size of the buffer in bytes
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Whether the arena frees its buffer on drop
    pub fn is_owned(&self) -> bool {
        self.buffer.is_owned()
    }

    /// Deallocation discipline
    pub fn discipline(&self) -> Discipline {
        self.config.discipline
    }

    /// Whether `ptr` points into the buffer
    pub fn contains<T>(&self, ptr: *const T) -> bool {
        let addr = ptr as usize;
        let start = self.buffer.start();
        addr >= start && addr < start + self.buffer.capacity()
    }

    /// Current configuration
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }
}

impl fmt::Debug for ArenaAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("capacity", &self.capacity())
            .field("bytes_used", &self.bytes_used())
            .field("owned", &self.is_owned())
            .field("discipline", &self.config.discipline)
            .finish_non_exhaustive()
    }
}

impl MemoryUsage for ArenaAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.bytes_used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.bytes_remaining())
    }
}

impl Resettable for ArenaAllocator<'_> {
    fn reset(&mut self) {
        ArenaAllocator::reset(self);
    }
}

impl StatisticsProvider for ArenaAllocator<'_> {
    fn statistics(&self) -> AllocatorStats {
        self.counters.get().snapshot(self.bytes_used())
    }

    fn reset_statistics(&mut self) {
        self.counters.set(Counters::default());
    }

    fn statistics_enabled(&self) -> bool {
        self.config.track_stats
    }
}

// SAFETY: ArenaAllocator can be sent between threads.
// - Owned buffers are plain heap memory with no thread affinity
// - Borrowed buffers come from `&mut [u8]` (which is Send) or from
//   `from_raw_parts`, whose contract covers cross-thread use
// - The `Cell` cursor keeps the arena `!Sync`
unsafe impl Send for ArenaAllocator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(discipline: Discipline) -> ArenaConfig {
        ArenaConfig {
            discipline,
            track_stats: true,
            alloc_pattern: None,
            dealloc_pattern: None,
            ..ArenaConfig::default()
        }
    }

    #[test]
    fn test_alignment_padding() {
        let arena = ArenaAllocator::with_config(16, quiet(Discipline::Stack)).unwrap();
        let a = arena.allocate::<i32>(1).unwrap();
        assert_eq!(arena.bytes_used(), 4);
        let b = arena.allocate::<i64>(1).unwrap();
        assert_eq!(b.as_ptr() as usize % 8, 0);
        assert_eq!(arena.bytes_used(), 16);
        assert!(arena.contains(a.as_ptr()));
        assert!(arena.contains(b.as_ptr()));
    }

    #[test]
    fn test_failure_leaves_cursor() {
        let arena = ArenaAllocator::with_config(8, quiet(Discipline::Stack)).unwrap();
        arena.allocate::<u8>(3).unwrap();

        let err = arena.allocate::<u32>(2).unwrap_err();
        assert_eq!(
            err,
            MemoryError::CapacityExceeded {
                requested: 8,
                available: 5,
                capacity: 8
            }
        );
        assert_eq!(arena.bytes_used(), 3);
        assert_eq!(arena.statistics().failed_allocations, 1);
    }

    #[test]
    fn test_overflowing_count() {
        let arena = ArenaAllocator::with_config(8, quiet(Discipline::Stack)).unwrap();
        let err = arena.allocate::<u64>(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::CapacityExceeded {
                requested: usize::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_sized_requests() {
        let arena = ArenaAllocator::with_config(8, quiet(Discipline::Stack)).unwrap();
        let empty = arena.allocate::<u64>(0).unwrap();
        assert_eq!(empty.as_ptr() as usize % 8, 0);
        arena.alloc(()).unwrap();
        assert_eq!(arena.bytes_used(), 0);
    }

    #[test]
    fn test_stack_rollback_only_for_top() {
        let arena = ArenaAllocator::with_config(64, quiet(Discipline::Stack)).unwrap();
        let first = arena.allocate::<u32>(2).unwrap();
        let second = arena.allocate::<u32>(2).unwrap();

        // SAFETY: pointers come from this arena with matching counts.
        unsafe {
            assert!(!arena.deallocate(first.as_ptr(), 2));
            assert_eq!(arena.bytes_used(), 16);
            assert!(arena.deallocate(second.as_ptr(), 2));
            assert_eq!(arena.bytes_used(), 8);
            assert!(arena.deallocate(first.as_ptr(), 2));
            assert!(!arena.deallocate(ptr::null_mut::<u32>(), 1));
        }
        assert_eq!(arena.bytes_used(), 0);
    }

    #[test]
    fn test_linear_never_rolls_back() {
        let arena = ArenaAllocator::with_config(64, quiet(Discipline::Linear)).unwrap();
        let ptr = arena.allocate::<u64>(1).unwrap();
        // SAFETY: pointer from this arena.
        assert!(!unsafe { arena.deallocate(ptr.as_ptr(), 1) });
        assert_eq!(arena.bytes_used(), 8);
    }

    #[test]
    fn test_reset_reclaims_everything() {
        let mut arena = ArenaAllocator::with_config(32, quiet(Discipline::Linear)).unwrap();
        arena.allocate::<u8>(20).unwrap();
        arena.reset();
        assert_eq!(arena.bytes_used(), 0);
        assert!(arena.allocate::<u8>(32).is_ok());
    }

    #[test]
    fn test_typed_helpers() {
        let arena = ArenaAllocator::with_config(128, quiet(Discipline::Stack)).unwrap();
        let number = arena.alloc(41_u32).unwrap();
        *number += 1;
        let slice = arena.alloc_slice_copy(&[1_u16, 2, 3]).unwrap();
        let text = arena.alloc_str("arena").unwrap();

        assert_eq!(*number, 42);
        assert_eq!(slice, &[1, 2, 3]);
        assert_eq!(text, "arena");
    }

    #[test]
    fn test_markers() {
        let mut arena = ArenaAllocator::with_config(64, quiet(Discipline::Linear)).unwrap();
        arena.allocate::<u8>(4).unwrap();
        let marker = arena.mark();
        arena.allocate::<u8>(12).unwrap();

        arena.restore(marker).unwrap();
        assert_eq!(arena.bytes_used(), 4);

        arena.reset();
        assert!(matches!(
            arena.restore(marker),
            Err(MemoryError::InvalidState { .. })
        ));

        let other = ArenaAllocator::with_config(64, quiet(Discipline::Linear)).unwrap();
        assert!(arena.restore(other.mark()).is_err());
    }

    #[test]
    fn test_nested_scopes() {
        let mut arena = ArenaAllocator::with_config(64, quiet(Discipline::Linear)).unwrap();
        {
            let mut outer = arena.scope();
            outer.allocate::<u8>(8).unwrap();
            {
                let inner = outer.scope();
                inner.allocate::<u8>(8).unwrap();
                assert_eq!(inner.bytes_used(), 16);
            }
            assert_eq!(outer.bytes_used(), 8);
        }
        assert_eq!(arena.bytes_used(), 0);
    }

    #[test]
    fn test_fill_patterns() {
        let config = ArenaConfig {
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
            ..quiet(Discipline::Stack)
        };
        let mut backing = [0_u8; 16];
        {
            let arena = ArenaAllocator::from_buffer_with_config(&mut backing, config).unwrap();
            let ptr = arena.allocate::<u8>(4).unwrap();
            // SAFETY: four freshly filled bytes.
            let bytes = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), 4) };
            assert_eq!(bytes, &[0xCC; 4]);
            // SAFETY: most recent allocation, released once.
            assert!(unsafe { arena.deallocate(ptr.as_ptr(), 4) });
        }
        assert_eq!(&backing[..4], &[0xDD; 4]);
        assert_eq!(&backing[4..], &[0; 12]);
    }

    #[test]
    fn test_borrowed_buffer() {
        let mut backing = [0_u64; 4];
        let bytes = size_of_val(&backing);
        // SAFETY: `backing` outlives the arena and is not touched meanwhile.
        let arena =
            unsafe { ArenaAllocator::from_raw_parts(NonNull::from(&mut backing).cast(), bytes) };
        assert!(!arena.is_owned());
        assert_eq!(arena.capacity(), 32);
        arena.allocate::<u64>(4).unwrap();
        assert_eq!(arena.bytes_remaining(), 0);
    }

    #[test]
    fn test_memory_usage_and_stats() {
        let arena = ArenaAllocator::with_config(100, quiet(Discipline::Stack)).unwrap();
        arena.allocate::<u8>(25).unwrap();
        assert_eq!(arena.used_memory(), 25);
        assert_eq!(arena.total_memory(), Some(100));
        assert_eq!(arena.memory_usage_percent(), Some(25.0));

        let stats = arena.statistics();
        assert_eq!(stats.allocation_count, 1);
        assert_eq!(stats.peak_allocated_bytes, 25);
    }
}
