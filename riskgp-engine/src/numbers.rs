//! Numeric conversion helpers centralizing lossy casts.

use num_traits::cast::cast;

/// Convert a collection length to f64. Precision loss is acceptable for
/// rate and mean computations; lengths never approach 2^53 here.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a u32 counter (window sizes, seat counts) to f64.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Convert u64 nanosecond/millisecond counters to f64 for timing stats.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_counts_convert_exactly() {
        assert!((usize_to_f64(5) - 5.0).abs() < f64::EPSILON);
        assert!((u32_to_f64(0)).abs() < f64::EPSILON);
        assert!((u64_to_f64(1_000) - 1000.0).abs() < f64::EPSILON);
    }
}
