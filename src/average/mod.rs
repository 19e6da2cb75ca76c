//! Running statistics over unbounded or fixed-size windows of samples.
//!
//! Every accumulator implements [`Average`]: values are fed in one at a time with
//! [`Average::add`] and the current statistic is read back with [`Average::average`].
//!
//! - [`Mean`]: unbounded running mean, reusable across windows via [`Mean::reset`].
//! - [`Median`]: median filter over the last `W` values.
//! - [`RollingMean`]: mean over the last `W` values, with periodic drift correction.
pub mod mean;
pub mod median;
pub mod rolling_mean;

pub use mean::Mean;
pub use median::Median;
pub use rolling_mean::RollingMean;

use thiserror::Error;

/// Precondition violations raised by an accumulator.
///
/// These signal a logic error in the caller, not bad input data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AverageError {
    /// An average was requested before any value had been added.
    #[error("Average required when there isn't one yet")]
    Empty,

    /// A NaN was offered to an accumulator that cannot order it.
    #[error("Not a number")]
    NotANumber,

    /// Internal bookkeeping disagrees with itself.
    #[error("Accumulator state inconsistent: {0}")]
    Inconsistent(String),
}

/// A running statistic over a stream of `f64` values.
pub trait Average {
    /// Admit a value into the window.
    fn add(&mut self, value: f64) -> Result<(), AverageError>;

    /// Current value of the statistic.
    ///
    /// Takes `&mut self` because implementations cache or periodically refresh state.
    fn average(&mut self) -> Result<f64, AverageError>;

    /// Number of values the statistic is currently computed over.
    fn count(&self) -> u64;
}
