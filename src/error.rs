//! Custom error types for the crate.
//!
//! This module defines the primary error type, `CleanError`, used by every stage of the
//! cleaning pipeline. Using the `thiserror` crate, it provides a centralized and consistent
//! way to handle the different kinds of errors that can occur, from I/O and configuration
//! issues to accumulator precondition violations.
//!
//! ## Error Hierarchy
//!
//! `CleanError` consolidates the following sources:
//!
//! - **`Config`**: Wraps errors from `figment`, typically file parsing or type mismatches
//!   in the configuration sources.
//! - **`Configuration`**: Semantic errors in a configuration that parsed correctly, such as
//!   a negative cutoff frequency. Caught during the validation step.
//! - **`Io`** / **`Csv`**: File access and delimited-text reader/writer failures.
//! - **`Average`**: A precondition violation inside an accumulator (see
//!   [`crate::average::AverageError`]). These indicate a logic error in the caller rather
//!   than bad input data and abort processing of the current file.
//! - **`Timestamp`**: A stored timestamp that cannot be parsed into an epoch value.
//! - **`IndexOutOfRange`** / **`ColumnOutOfRange`**: Positional access outside the
//!   bounds of a [`crate::data::store::RowStore`].
//! - **`Filter`**: Invalid baseline filter parameters (cutoff above Nyquist, unknown
//!   sample rate, ...).
//!
//! By using `#[from]`, `CleanError` can be created from the underlying error types,
//! simplifying error handling throughout the crate with the `?` operator.

use crate::average::AverageError;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, CleanError>;

/// Errors produced while cleaning a sensor data file.
#[derive(Error, Debug)]
pub enum CleanError {
    /// The configuration sources could not be read or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The configuration parsed but holds invalid values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The delimited-text reader or writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An accumulator precondition was violated.
    #[error("Accumulator error: {0}")]
    Average(#[from] AverageError),

    /// A stored timestamp could not be parsed.
    #[error("Invalid timestamp '{0}'")]
    Timestamp(String),

    /// A row index was at or beyond the number of stored rows.
    #[error("Row index {index} out of range for store of {len} rows")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of rows in the store.
        len: usize,
    },

    /// A column or axis index was outside the row layout.
    #[error("Column {0} out of range")]
    ColumnOutOfRange(usize),

    /// The baseline filter could not be designed with the given parameters.
    #[error("Filter error: {0}")]
    Filter(String),

    /// An unknown sensor type name was supplied.
    #[error("Unsupported sensor type '{name}'. Known sensors are {known}")]
    UnknownSensor {
        /// Name that was supplied.
        name: String,
        /// Comma-separated list of supported names.
        known: String,
    },
}

impl From<figment::Error> for CleanError {
    fn from(value: figment::Error) -> Self {
        CleanError::Config(Box::new(value))
    }
}
