//! Sliding-window throughput estimation

/// Default number of samples held by the window
pub const DEFAULT_WINDOW_CAPACITY: usize = 5;

/// Means smaller than this are reported as exactly zero
const MEAN_EPSILON: f64 = 1e-9;

/// Fixed-capacity ring buffer of recent bytes-per-second samples.
///
/// Once full, each push overwrites the oldest sample.
#[derive(Debug, Clone)]
pub struct SlidingRateEstimator {
    samples: Box<[f64]>,
    // Slot the next sample is written to
    head: usize,
    len: usize,
}

impl SlidingRateEstimator {
    /// Create an estimator holding at most `capacity` samples (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Record a sample, evicting the oldest one if the window is full
    pub fn push(&mut self, sample: f64) {
        let capacity = self.capacity();
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    /// Arithmetic mean of the held samples.
    ///
    /// Returns 0 for an empty window, a NaN result, or a mean within
    /// floating-point noise of zero.
    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }

        let mean = self.iter().sum::<f64>() / self.len as f64;
        if mean.is_nan() || mean.abs() < MEAN_EPSILON {
            0.0
        } else {
            mean
        }
    }

    /// The last pushed sample, unsmoothed
    pub fn most_recent(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        let capacity = self.capacity();
        Some(self.samples[(self.head + capacity - 1) % capacity])
    }

    /// Drop every held sample
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Held samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let capacity = self.capacity();
        let oldest = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |offset| self.samples[(oldest + offset) % capacity])
    }
}

impl Default for SlidingRateEstimator {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window() {
        let estimator = SlidingRateEstimator::default();
        assert_eq!(estimator.mean(), 0.0);
        assert_eq!(estimator.most_recent(), None);
        assert!(estimator.is_empty());
        assert_eq!(estimator.capacity(), 5);
    }

    #[test]
    fn test_mean_of_partial_window() {
        let mut estimator = SlidingRateEstimator::default();
        estimator.push(100.0);
        estimator.push(300.0);
        assert_eq!(estimator.mean(), 200.0);
        assert_eq!(estimator.most_recent(), Some(300.0));
        assert_eq!(estimator.len(), 2);
    }

    #[test]
    fn test_oldest_sample_evicted_first() {
        let mut estimator = SlidingRateEstimator::with_capacity(3);
        for sample in [1.0, 2.0, 3.0, 4.0, 5.0] {
            estimator.push(sample);
        }
        assert_eq!(estimator.iter().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
        assert_eq!(estimator.mean(), 4.0);
        assert_eq!(estimator.most_recent(), Some(5.0));
    }

    #[test]
    fn test_stall_converges_to_zero_within_capacity() {
        let mut estimator = SlidingRateEstimator::default();
        for _ in 0..5 {
            estimator.push(1000.0 / 3.0);
        }
        for pushed in 1..=5 {
            estimator.push(0.0);
            if pushed < 5 {
                assert!(estimator.mean() > 0.0);
            }
        }
        assert_eq!(estimator.mean(), 0.0);
    }

    #[test]
    fn test_near_zero_mean_normalized() {
        let mut estimator = SlidingRateEstimator::with_capacity(2);
        estimator.push(0.1 + 0.2);
        estimator.push(-0.3);
        assert_eq!(estimator.mean(), 0.0);
    }

    #[test]
    fn test_negative_samples_accepted() {
        let mut estimator = SlidingRateEstimator::with_capacity(2);
        estimator.push(-400.0);
        estimator.push(-200.0);
        assert_eq!(estimator.mean(), -300.0);
        assert_eq!(estimator.most_recent(), Some(-200.0));
    }

    #[test]
    fn test_nan_mean_reported_as_zero() {
        let mut estimator = SlidingRateEstimator::with_capacity(2);
        estimator.push(f64::INFINITY);
        estimator.push(f64::NEG_INFINITY);
        assert_eq!(estimator.mean(), 0.0);
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut estimator = SlidingRateEstimator::with_capacity(0);
        assert_eq!(estimator.capacity(), 1);
        estimator.push(10.0);
        estimator.push(20.0);
        assert_eq!(estimator.iter().collect::<Vec<_>>(), vec![20.0]);

        estimator.clear();
        assert!(estimator.is_empty());
        assert_eq!(estimator.most_recent(), None);
    }
}
