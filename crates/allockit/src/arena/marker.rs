//! Cursor markers and scoped restoration

use core::ops::{Deref, DerefMut};

use super::ArenaAllocator;

/// Marker representing a cursor position in an arena
///
/// Restoring a marker releases every allocation made after it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaMarker {
    pub(super) offset: usize,
    pub(super) base: usize,
}

impl ArenaMarker {
    /// Cursor offset recorded by this marker
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// RAII guard that rewinds the arena when dropped
///
/// Dereferences to the arena, so allocations go through the scope. Anything
/// allocated through it is released at the end of the scope.
///
/// ```
/// use allockit::arena::ArenaAllocator;
///
/// let mut arena = ArenaAllocator::new(256)?;
/// arena.alloc(1_u64)?;
/// {
///     let scope = arena.scope();
///     scope.alloc_slice_copy(&[0_u8; 64])?;
///     assert_eq!(scope.bytes_used(), 72);
/// }
/// assert_eq!(arena.bytes_used(), 8);
/// # Ok::<(), allockit::MemoryError>(())
/// ```
pub struct ArenaScope<'a, 'buf> {
    arena: &'a mut ArenaAllocator<'buf>,
    marker: ArenaMarker,
}

impl<'a, 'buf> ArenaScope<'a, 'buf> {
    pub(super) fn new(arena: &'a mut ArenaAllocator<'buf>) -> Self {
        let marker = arena.mark();
        Self { arena, marker }
    }

    /// Marker the scope will restore to
    pub fn marker(&self) -> ArenaMarker {
        self.marker
    }
}

impl<'buf> Deref for ArenaScope<'_, 'buf> {
    type Target = ArenaAllocator<'buf>;

    fn deref(&self) -> &Self::Target {
        self.arena
    }
}

impl DerefMut for ArenaScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.arena
    }
}

impl Drop for ArenaScope<'_, '_> {
    fn drop(&mut self) {
        // Fails only if the arena was reset below the marker inside the scope,
        // in which case there is nothing left to release.
        let _ = self.arena.restore(self.marker);
    }
}
