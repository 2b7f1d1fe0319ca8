//! Treiber stack with epoch-based reclamation
//!
//! # Safety
//!
//! - Every node is heap-allocated on push and reachable from `head` until a
//!   successful CAS unlinks it
//! - A popped node is retired through `Guard::defer_destroy`, so it is freed
//!   only after every thread that could have loaded it has unpinned
//! - The value is moved out of a node exactly once, by the thread whose CAS
//!   unlinked it; the node itself never drops the value
//!
//! ## Memory Ordering
//!
//! - Release on a successful push CAS publishes the node's contents
//! - Acquire on loads of `head` makes those contents visible to poppers
//! - Relaxed for counters; they are diagnostics, not synchronization

use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::epoch::{self, Atomic, Owned};

use crate::utils::Backoff;

struct Node<T> {
    value: ManuallyDrop<T>,
    next: Atomic<Node<T>>,
}

/// Counters describing the traffic a stack has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackStats {
    /// Successful pushes
    pub pushes: usize,
    /// Successful pops
    pub pops: usize,
    /// Pops that found the stack empty
    pub empty_pops: usize,
    /// Failed CAS attempts across pushes and pops
    pub cas_retries: usize,
}

/// Lock-free LIFO stack
///
/// Any number of threads may push and pop concurrently through `&self`.
/// Operations are lock-free (some thread always makes progress) but not
/// wait-free.
///
/// # Example
/// ```
/// use std::thread;
///
/// use allockit::lockfree::LockFreeStack;
///
/// let stack = LockFreeStack::new();
/// thread::scope(|s| {
///     for t in 0..4 {
///         let stack = &stack;
///         s.spawn(move || {
///             for i in 0..100 {
///                 stack.push(t * 100 + i);
///             }
///         });
///     }
/// });
///
/// assert_eq!(stack.len(), 400);
/// let mut drained: Vec<_> = std::iter::from_fn(|| stack.pop()).collect();
/// drained.sort_unstable();
/// assert_eq!(drained, (0..400).collect::<Vec<_>>());
/// ```
pub struct LockFreeStack<T> {
    head: Atomic<Node<T>>,
    len: AtomicUsize,
    pushes: AtomicUsize,
    pops: AtomicUsize,
    empty_pops: AtomicUsize,
    cas_retries: AtomicUsize,
}

impl<T> LockFreeStack<T> {
    /// Creates an empty stack
    pub fn new() -> Self {
        Self {
            head: Atomic::null(),
            len: AtomicUsize::new(0),
            pushes: AtomicUsize::new(0),
            pops: AtomicUsize::new(0),
            empty_pops: AtomicUsize::new(0),
            cas_retries: AtomicUsize::new(0),
        }
    }

    /// Pushes a value onto the top of the stack
    pub fn push(&self, value: T) {
        let mut node = Owned::new(Node {
            value: ManuallyDrop::new(value),
            next: Atomic::null(),
        });
        // Counted before publishing so a racing pop never drives it below zero.
        self.len.fetch_add(1, Ordering::Relaxed);

        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Acquire, &guard);
            node.next.store(head, Ordering::Relaxed);

            match self
                .head
                .compare_exchange(head, node, Ordering::Release, Ordering::Relaxed, &guard)
            {
                Ok(_) => break,
                Err(err) => {
                    node = err.new;
                    self.cas_retries.fetch_add(1, Ordering::Relaxed);
                    backoff.spin();
                }
            }
        }

        self.pushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes the value on top of the stack
    ///
    /// Returns `None` immediately if the stack is empty.
    pub fn pop(&self) -> Option<T> {
        let guard = epoch::pin();
        let mut backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Acquire, &guard);
            // SAFETY: The guard keeps any node loaded from `head` alive.
            let Some(node) = (unsafe { head.as_ref() }) else {
                self.empty_pops.fetch_add(1, Ordering::Relaxed);
                return None;
            };

            let next = node.next.load(Ordering::Relaxed, &guard);
            if self
                .head
                .compare_exchange(head, next, Ordering::Acquire, Ordering::Relaxed, &guard)
                .is_ok()
            {
                self.len.fetch_sub(1, Ordering::Relaxed);
                self.pops.fetch_add(1, Ordering::Relaxed);
                // SAFETY: Our CAS unlinked the node, so no other thread can
                // take its value, and no new reference to it can be created.
                // Threads still holding one are pinned and delay the free.
                unsafe {
                    let value = ptr::read(&*node.value);
                    guard.defer_destroy(head);
                    return Some(value);
                }
            }

            self.cas_retries.fetch_add(1, Ordering::Relaxed);
            backoff.spin();
        }
    }

    /// Number of values on the stack
    ///
    /// Exact when no other thread is pushing or popping; otherwise a snapshot
    /// that may be off by the number of operations in flight.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns true if the stack has no values
    pub fn is_empty(&self) -> bool {
        let guard = epoch::pin();
        self.head.load(Ordering::Acquire, &guard).is_null()
    }

    /// Snapshot of the traffic counters
    pub fn stats(&self) -> StackStats {
        StackStats {
            pushes: self.pushes.load(Ordering::Relaxed),
            pops: self.pops.load(Ordering::Relaxed),
            empty_pops: self.empty_pops.load(Ordering::Relaxed),
            cas_retries: self.cas_retries.load(Ordering::Relaxed),
        }
    }
}

impl<T> Default for LockFreeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeStack<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can reach the nodes, so
        // they can be freed immediately without pinning.
        unsafe {
            let guard = epoch::unprotected();
            let mut current = self.head.load(Ordering::Relaxed, guard);
            while !current.is_null() {
                let mut node = current.into_owned();
                current = node.next.load(Ordering::Relaxed, guard);
                ManuallyDrop::drop(&mut node.value);
            }
        }
    }
}

impl<T> Extend<T> for LockFreeStack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for LockFreeStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut stack = Self::new();
        stack.extend(iter);
        stack
    }
}

impl<T> fmt::Debug for LockFreeStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeStack")
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

// SAFETY: Values move between threads but are never shared: each one is
// written by its pusher and read by exactly one popper. `T: Send` is
// therefore enough for both impls.
unsafe impl<T: Send> Send for LockFreeStack<T> {}
unsafe impl<T: Send> Sync for LockFreeStack<T> {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_lifo_order() {
        let stack = LockFreeStack::new();
        stack.push(1);
        stack.push(2);
        stack.push(3);

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_empty_pop_is_counted() {
        let stack = LockFreeStack::<u8>::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.pop(), None);

        let stats = stack.stats();
        assert_eq!(stats.empty_pops, 2);
        assert_eq!(stats.pops, 0);
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn test_drop_releases_remaining_values() {
        struct Tracked(Arc<AtomicUsize>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let stack = LockFreeStack::new();
        for _ in 0..5 {
            stack.push(Tracked(Arc::clone(&drops)));
        }
        drop(stack.pop());
        assert_eq!(drops.load(Ordering::Relaxed), 1);

        drop(stack);
        assert_eq!(drops.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_from_iterator_and_extend() {
        let mut stack: LockFreeStack<_> = (0..3).collect();
        stack.extend([10, 11]);
        assert_eq!(stack.len(), 5);
        assert_eq!(stack.pop(), Some(11));
        assert_eq!(stack.stats().pushes, 5);
    }

    #[test]
    fn test_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<LockFreeStack<String>>();
        assert_send_sync::<LockFreeStack<std::cell::Cell<u8>>>();
    }
}
