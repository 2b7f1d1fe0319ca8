//! Block and chunk storage
//!
//! # Safety
//!
//! A [`Block`] is one slot of storage that is read through exactly one of its
//! two views at a time:
//! - while free, `next` links it into the pool's free list
//! - while allocated, `value` holds the caller's element
//!
//! A [`Chunk`] owns a contiguous array of blocks obtained straight from the
//! global allocator. The array is never reallocated or moved, so block
//! addresses stay valid for as long as the chunk lives.

use core::alloc::Layout;
use core::mem::{ManuallyDrop, MaybeUninit};
use core::ptr::{self, NonNull};
use std::alloc;

use crate::error::{MemoryError, MemoryResult};

/// One fixed-size storage slot
///
/// `repr(C)` puts both views at offset zero, so a pointer to the block is
/// also a pointer to the element.
#[repr(C)]
pub(super) union Block<T> {
    pub(super) next: *mut Block<T>,
    pub(super) value: ManuallyDrop<MaybeUninit<T>>,
}

impl<T> Block<T> {
    /// Layout of a single block: large enough for `T` and for the free link
    pub(super) const LAYOUT: Layout = Layout::new::<Self>();

    /// Reinterprets an element pointer as the block that holds it
    #[inline]
    pub(super) fn from_value_ptr(ptr: *mut T) -> *mut Self {
        ptr.cast::<Self>()
    }

    /// Element view of a block pointer
    #[inline]
    pub(super) fn value_ptr(block: NonNull<Self>) -> NonNull<T> {
        // SAFETY: Projecting to a field of a non-null block pointer yields a
        // non-null pointer. `ManuallyDrop` and `MaybeUninit` are both
        // `repr(transparent)`, so the field pointer is a valid `*mut T`.
        unsafe { NonNull::new_unchecked((&raw mut (*block.as_ptr()).value).cast::<T>()) }
    }
}

/// A contiguously allocated array of blocks
pub(super) struct Chunk<T> {
    blocks: NonNull<Block<T>>,
    len: usize,
    layout: Layout,
}

impl<T> Chunk<T> {
    /// Acquires storage for `len` blocks from the global allocator
    ///
    /// The blocks are uninitialized; call [`Chunk::link`] before handing any
    /// of them out.
    pub(super) fn allocate(len: usize) -> MemoryResult<Self> {
        debug_assert!(len > 0, "chunk must hold at least one block");

        let layout =
            Layout::array::<Block<T>>(len).map_err(|_| MemoryError::size_overflow("chunk layout"))?;

        // SAFETY: `layout` has non-zero size: `len > 0` and a block is at least
        // one pointer wide.
        let raw = unsafe { alloc::alloc(layout) };
        let blocks = NonNull::new(raw.cast::<Block<T>>())
            .ok_or_else(|| MemoryError::allocation_failed_with_layout(layout))?;

        Ok(Self {
            blocks,
            len,
            layout,
        })
    }

    /// Threads every block of the chunk into a list that ends at `tail`
    ///
    /// Returns the first block, which becomes the new free-list head.
    ///
    /// # Safety
    /// No block of this chunk may be allocated to a caller.
    pub(super) unsafe fn link(&self, tail: *mut Block<T>) -> NonNull<Block<T>> {
        let first = self.blocks.as_ptr();
        for i in 0..self.len {
            // SAFETY: `i < len`, so both the block and its successor (when
            // `i + 1 < len`) are inside this chunk's allocation.
            unsafe {
                let block = first.add(i);
                let next = if i + 1 < self.len { block.add(1) } else { tail };
                (*block).next = next;
            }
        }
        self.blocks
    }

    /// Number of blocks in the chunk
    #[inline]
    pub(super) fn len(&self) -> usize {
        self.len
    }

    /// Whether `block` points at the start of one of this chunk's blocks
    pub(super) fn contains(&self, block: *const Block<T>) -> bool {
        let start = self.blocks.as_ptr() as usize;
        let end = start + self.layout.size();
        let addr = block as usize;
        addr >= start && addr < end && (addr - start) % Block::<T>::LAYOUT.size() == 0
    }

    /// Overwrites the bytes of one block with `pattern`
    ///
    /// # Safety
    /// `block` must be a block of a live chunk that nobody else is reading.
    pub(super) unsafe fn fill(block: NonNull<Block<T>>, pattern: u8) {
        // SAFETY: Caller guarantees exclusive access to a whole block.
        unsafe {
            ptr::write_bytes(
                block.as_ptr().cast::<u8>(),
                pattern,
                Block::<T>::LAYOUT.size(),
            );
        }
    }
}

impl<T> Drop for Chunk<T> {
    fn drop(&mut self) {
        // SAFETY: `blocks` was allocated in `Chunk::allocate` with exactly
        // `self.layout` and is released only here.
        unsafe { alloc::dealloc(self.blocks.as_ptr().cast::<u8>(), self.layout) };
    }
}
