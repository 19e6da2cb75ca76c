//! Unbounded running mean.
use super::{Average, AverageError};

/// Running mean of every value added since construction or the last [`Mean::reset`].
#[derive(Debug, Default, Clone)]
pub struct Mean {
    count: u64,
    sum: f64,
}

impl Mean {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` copies of `value` in one step.
    ///
    /// Used to fold pre-binned histogram data in without re-adding each sample.
    pub fn add_multiple(&mut self, value: f64, count: u64) {
        self.sum += value * count as f64;
        self.count += count;
    }

    /// Discard all accumulated values.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

impl Average for Mean {
    fn add(&mut self, value: f64) -> Result<(), AverageError> {
        self.sum += value;
        self.count += 1;
        Ok(())
    }

    fn average(&mut self) -> Result<f64, AverageError> {
        if self.count == 0 {
            return Err(AverageError::Empty);
        }
        Ok(self.sum / self.count as f64)
    }

    fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_mean_is_an_error() {
        let mut mean = Mean::new();
        assert_eq!(mean.average(), Err(AverageError::Empty));
    }

    #[test]
    fn test_mean_of_values() {
        let mut mean = Mean::new();
        for v in [1.0, 2.0, 3.0, 4.0] {
            mean.add(v).unwrap();
        }
        assert_eq!(mean.count(), 4);
        assert!((mean.average().unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_reset_reuses_accumulator() {
        let mut mean = Mean::new();
        mean.add(10.0).unwrap();
        mean.reset();
        assert_eq!(mean.count(), 0);
        assert!(mean.average().is_err());

        mean.add(3.0).unwrap();
        assert_eq!(mean.average().unwrap(), 3.0);
    }

    #[test]
    fn test_histogram_mean() {
        // Two seconds with 100 and 102 samples.
        let mut mean = Mean::new();
        mean.add_multiple(100.0, 1);
        mean.add_multiple(102.0, 1);
        assert_eq!(mean.average().unwrap(), 101.0);
    }

    proptest! {
        #[test]
        fn add_multiple_matches_repeated_add(value in -1.0e3f64..1.0e3, n in 1u64..500) {
            let mut repeated = Mean::new();
            for _ in 0..n {
                repeated.add(value).unwrap();
            }
            let mut bulk = Mean::new();
            bulk.add_multiple(value, n);

            prop_assert_eq!(repeated.count(), bulk.count());
            let a = repeated.average().unwrap();
            let b = bulk.average().unwrap();
            prop_assert!((a - b).abs() <= 1e-9 * value.abs().max(1.0));
        }
    }
}
