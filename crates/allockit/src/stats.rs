//! Allocator statistics
//!
//! Snapshot type returned by [`StatisticsProvider`](crate::core::StatisticsProvider).

/// Statistics for memory allocators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Total bytes currently allocated
    pub allocated_bytes: usize,
    /// Peak bytes allocated
    pub peak_allocated_bytes: usize,
    /// Total number of allocations
    pub allocation_count: usize,
    /// Total number of deallocations
    pub deallocation_count: usize,
    /// Number of failed allocations
    pub failed_allocations: usize,
}

impl AllocatorStats {
    /// Fraction of allocation attempts that failed
    pub fn failure_rate(&self) -> f64 {
        let attempts = self.allocation_count + self.failed_allocations;
        if attempts == 0 {
            0.0
        } else {
            self.failed_allocations as f64 / attempts as f64
        }
    }
}

/// Plain counters backing [`AllocatorStats`] for single-threaded allocators
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub(crate) allocations: usize,
    pub(crate) deallocations: usize,
    pub(crate) failures: usize,
    pub(crate) peak: usize,
}

impl Counters {
    pub(crate) fn record_allocation(&mut self, current: usize) {
        self.allocations += 1;
        self.peak = self.peak.max(current);
    }

    pub(crate) fn record_deallocation(&mut self) {
        self.deallocations += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub(crate) fn snapshot(&self, allocated_bytes: usize) -> AllocatorStats {
        AllocatorStats {
            allocated_bytes,
            peak_allocated_bytes: self.peak,
            allocation_count: self.allocations,
            deallocation_count: self.deallocations,
            failed_allocations: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let mut counters = Counters::default();
        counters.record_allocation(8);
        counters.record_allocation(16);
        counters.record_deallocation();
        counters.record_failure();

        let stats = counters.snapshot(8);
        assert_eq!(stats.allocated_bytes, 8);
        assert_eq!(stats.peak_allocated_bytes, 16);
        assert_eq!(stats.allocation_count - stats.deallocation_count, 1);
        assert!((stats.failure_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats() {
        let stats = Counters::default().snapshot(0);
        assert_eq!(stats, AllocatorStats::default());
        assert_eq!(stats.failure_rate(), 0.0);
    }
}
