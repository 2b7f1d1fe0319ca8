//! Backing storage for arenas
//!
//! A buffer is either allocated by the arena itself (and released when the
//! arena drops) or borrowed from the caller (and never released here).

use core::alloc::Layout;
use core::ptr::{self, NonNull};
use std::alloc;

use crate::error::{MemoryError, MemoryResult};

enum Storage {
    /// Allocated from the global allocator with this layout
    Owned { layout: Layout },
    /// Caller-supplied memory
    Borrowed,
}

pub(super) struct Buffer {
    ptr: NonNull<u8>,
    capacity: usize,
    storage: Storage,
}

impl Buffer {
    /// Allocates `capacity` bytes aligned to `align`
    pub(super) fn allocate(capacity: usize, align: usize) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_config("capacity cannot be zero"));
        }

        let layout = Layout::from_size_align(capacity, align)
            .map_err(|_| MemoryError::size_overflow("arena buffer layout"))?;

        // SAFETY: `layout` has non-zero size (checked above).
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| MemoryError::allocation_failed_with_layout(layout))?;

        Ok(Self {
            ptr,
            capacity,
            storage: Storage::Owned { layout },
        })
    }

    /// Wraps memory the arena does not own
    pub(super) fn borrowed(ptr: NonNull<u8>, capacity: usize) -> Self {
        Self {
            ptr,
            capacity,
            storage: Storage::Borrowed,
        }
    }

    #[inline]
    pub(super) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(super) fn start(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    #[inline]
    pub(super) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(super) fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned { .. })
    }

    /// Overwrites `len` bytes starting at `offset`
    ///
    /// # Safety
    /// `offset + len <= capacity` and no live reference may cover the range.
    pub(super) unsafe fn fill(&self, offset: usize, len: usize, pattern: u8) {
        debug_assert!(offset + len <= self.capacity);
        // SAFETY: Caller guarantees the range is in bounds and unaliased.
        unsafe { ptr::write_bytes(self.as_ptr().add(offset), pattern, len) };
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Storage::Owned { layout } = self.storage {
            // SAFETY: Owned buffers come from `Buffer::allocate` with exactly
            // this layout and are released only here.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}
