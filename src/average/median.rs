//! Median filter over a fixed-size window.
use super::{Average, AverageError};
use std::collections::VecDeque;

/// Median of the last `window` admitted values.
///
/// Two views of the same values are kept: `by_age` in admission order, used to find the
/// value to evict, and `values` in no particular order, which the selection step is free
/// to reorder in place. The median is cached until the window changes.
#[derive(Debug, Clone)]
pub struct Median {
    window: usize,
    by_age: VecDeque<f64>,
    values: Vec<f64>,
    cached: Option<f64>,
}

impl Median {
    /// Create a median filter over `window` values.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            by_age: VecDeque::with_capacity(window),
            values: Vec::with_capacity(window),
            cached: None,
        }
    }

    fn select(&mut self, k: usize) -> f64 {
        let (_, nth, _) = self.values.select_nth_unstable_by(k, f64::total_cmp);
        *nth
    }
}

impl Average for Median {
    fn add(&mut self, value: f64) -> Result<(), AverageError> {
        if value.is_nan() {
            return Err(AverageError::NotANumber);
        }

        if self.values.len() < self.window {
            self.values.push(value);
            self.by_age.push_back(value);
            self.cached = None;
            return Ok(());
        }

        let Some(&eldest) = self.by_age.front() else {
            // Zero-sized window: nothing is ever held.
            return Ok(());
        };
        if value == eldest {
            // Same multiset, so the cached median stands; only the age order moves on.
            self.by_age.rotate_left(1);
            return Ok(());
        }

        let slot = self
            .values
            .iter_mut()
            .find(|v| **v == eldest)
            .ok_or_else(|| {
                AverageError::Inconsistent(format!("value {eldest} missing from median buffer"))
            })?;
        *slot = value;
        self.by_age.pop_front();
        self.by_age.push_back(value);
        self.cached = None;
        Ok(())
    }

    fn average(&mut self) -> Result<f64, AverageError> {
        if self.values.is_empty() {
            return Err(AverageError::Empty);
        }
        if let Some(median) = self.cached {
            return Ok(median);
        }

        let half = self.values.len() / 2;
        let median = if self.values.len() % 2 == 0 {
            // e.g. 10 values: elements [4] and [5]
            let left = self.select(half - 1);
            let right = self.select(half);
            (left + right) / 2.0
        } else {
            self.select(half)
        };
        self.cached = Some(median);
        Ok(median)
    }

    fn count(&self) -> u64 {
        self.values.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn oracle(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        }
    }

    #[test]
    fn test_empty_median_is_an_error() {
        let mut median = Median::new(5);
        assert_eq!(median.average(), Err(AverageError::Empty));
    }

    #[test]
    fn test_nan_rejected() {
        let mut median = Median::new(3);
        assert_eq!(median.add(f64::NAN), Err(AverageError::NotANumber));
        assert_eq!(median.count(), 0);
    }

    #[test]
    fn test_odd_and_even_counts() {
        let mut median = Median::new(10);
        for v in [5.0, 1.0, 3.0] {
            median.add(v).unwrap();
        }
        assert_eq!(median.average().unwrap(), 3.0);

        median.add(4.0).unwrap();
        assert_eq!(median.average().unwrap(), 3.5);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut median = Median::new(3);
        for v in [1.0, 2.0, 3.0] {
            median.add(v).unwrap();
        }
        // Evicts 1.0, window is [2, 3, 100]
        median.add(100.0).unwrap();
        assert_eq!(median.average().unwrap(), 3.0);
        // Evicts 2.0, window is [3, 100, 100]
        median.add(100.0).unwrap();
        assert_eq!(median.average().unwrap(), 100.0);
        assert_eq!(median.count(), 3);
    }

    #[test]
    fn test_value_equal_to_eldest_keeps_median() {
        let mut median = Median::new(3);
        for v in [7.0, 1.0, 2.0] {
            median.add(v).unwrap();
        }
        let before = median.average().unwrap();
        median.add(7.0).unwrap();
        assert_eq!(median.average().unwrap(), before);
    }

    proptest! {
        #[test]
        fn median_matches_sorted_oracle_below_capacity(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)
        ) {
            let mut median = Median::new(64);
            for &v in &values {
                median.add(v).unwrap();
            }
            prop_assert_eq!(median.average().unwrap(), oracle(&values));
        }

        #[test]
        fn median_tracks_last_window_values(
            values in prop::collection::vec(0i32..8, 1..200),
            window in 1usize..16,
        ) {
            // Small integer range forces plenty of repeated values.
            let mut median = Median::new(window);
            for (i, &v) in values.iter().enumerate() {
                median.add(f64::from(v)).unwrap();
                let start = (i + 1).saturating_sub(window);
                let expected: Vec<f64> = values[start..=i].iter().map(|&x| f64::from(x)).collect();
                prop_assert_eq!(median.average().unwrap(), oracle(&expected));
            }
        }
    }
}
