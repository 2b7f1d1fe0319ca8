//! Core traits shared by the allocators

use crate::stats::AllocatorStats;

/// Trait for types that can report memory usage
pub trait MemoryUsage {
    /// Bytes currently handed out to callers
    fn used_memory(&self) -> usize;

    /// Bytes that can still be handed out without growing, if known
    fn available_memory(&self) -> Option<usize>;

    /// Total bytes under management, if known
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| available + self.used_memory())
    }

    /// Percentage of managed memory in use
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }
}

/// Trait for allocators that can release all of their allocations at once
pub trait Resettable {
    /// Returns the allocator to its freshly constructed state
    ///
    /// Taking `&mut self` guarantees no safe borrow of allocator memory is
    /// still alive. Raw pointers obtained earlier must not be used afterwards.
    fn reset(&mut self);
}

/// Trait for allocators that track statistics
pub trait StatisticsProvider {
    /// Snapshot of the current statistics
    fn statistics(&self) -> AllocatorStats;

    /// Clears the cumulative counters
    fn reset_statistics(&mut self);

    /// Whether cumulative counters are being collected
    fn statistics_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        used: usize,
        free: usize,
    }

    impl MemoryUsage for Fixed {
        fn used_memory(&self) -> usize {
            self.used
        }

        fn available_memory(&self) -> Option<usize> {
            Some(self.free)
        }
    }

    #[test]
    fn test_default_usage_methods() {
        let usage = Fixed { used: 25, free: 75 };
        assert_eq!(usage.total_memory(), Some(100));
        assert_eq!(usage.memory_usage_percent(), Some(25.0));

        let empty = Fixed { used: 0, free: 0 };
        assert_eq!(empty.memory_usage_percent(), Some(0.0));
    }
}
