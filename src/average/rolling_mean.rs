//! Moving average over a fixed-size window.
use super::{Average, AverageError};
use std::collections::VecDeque;

/// Every this many calls to [`RollingMean::average`] the running sum is recomputed
/// from the window contents.
pub const DRIFT_CHECK_INTERVAL: u64 = 10_000;

/// Mean of the last `window` values, kept up to date with a running sum.
///
/// Adding and subtracting values from the running sum over millions of updates
/// accumulates rounding error, so the sum is periodically rebuilt from the buffer.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    buffer: VecDeque<f64>,
    sum: f64,
    calls: u64,
}

impl RollingMean {
    /// Create a moving average over `window` values.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buffer: VecDeque::with_capacity(window + 1),
            sum: 0.0,
            calls: 0,
        }
    }

    fn recompute_sum(&self) -> f64 {
        self.buffer.iter().sum()
    }
}

impl Average for RollingMean {
    fn add(&mut self, value: f64) -> Result<(), AverageError> {
        self.buffer.push_back(value);

        if self.buffer.len() > self.window {
            if let Some(eldest) = self.buffer.pop_front() {
                if eldest != value {
                    self.sum = self.sum - eldest + value;
                }
            }
        } else {
            self.sum += value;
        }
        Ok(())
    }

    fn average(&mut self) -> Result<f64, AverageError> {
        if self.buffer.is_empty() {
            return Err(AverageError::Empty);
        }

        self.calls += 1;
        let len = self.buffer.len() as f64;
        let mut mean = self.sum / len;

        if self.calls % DRIFT_CHECK_INTERVAL == 0 {
            let sum = self.recompute_sum();
            let recomputed = sum / len;
            if recomputed != mean {
                tracing::warn!(
                    iteration = self.calls,
                    running = mean,
                    recalculated = recomputed,
                    "Using recalculated mean"
                );
                mean = recomputed;
            }
            self.sum = sum;
        }
        Ok(mean)
    }

    fn count(&self) -> u64 {
        self.buffer.len() as u64
    }
}
