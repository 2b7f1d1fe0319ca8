//! Utility functions and helpers for allockit
//!
//! - Memory alignment helpers
//! - Spin backoff for CAS retry loops

/// Aligns a value up, returning `None` instead of wrapping on overflow
///
/// # Examples
/// ```
/// use allockit::utils::checked_align_up;
///
/// assert_eq!(checked_align_up(13, 4), Some(16));
/// assert_eq!(checked_align_up(usize::MAX, 8), None);
/// ```
#[inline(always)]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    match value.checked_add(alignment - 1) {
        Some(bumped) => Some(bumped & !(alignment - 1)),
        None => None,
    }
}

/// Checks whether `value` is a non-zero power of two
#[inline(always)]
pub const fn is_power_of_two(value: usize) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

/// Backoff utility for spin loops
///
/// Doubles the number of spin-loop hints on every call, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: u32,
    max: u32,
}

impl Backoff {
    /// Create new backoff with default parameters
    #[inline]
    pub fn new() -> Self {
        Self { current: 1, max: 64 }
    }

    /// Perform backoff
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..self.current {
            core::hint::spin_loop();
        }
        if self.current < self.max {
            self.current *= 2;
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_helpers() {
        assert_eq!(checked_align_up(0, 16), Some(0));
        assert_eq!(checked_align_up(1, 16), Some(16));
        assert_eq!(checked_align_up(usize::MAX - 2, 4), None);
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(4096));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(12));
    }

    #[test]
    fn test_backoff_doubles_up_to_max() {
        let mut backoff = Backoff::default();
        assert_eq!(backoff.current, 1);
        backoff.spin();
        assert_eq!(backoff.current, 2);
        for _ in 0..10 {
            backoff.spin();
        }
        assert_eq!(backoff.current, backoff.max);
    }
}
