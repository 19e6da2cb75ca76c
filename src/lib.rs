//! # sensor_clean
//!
//! Cleans accelerometer, gyroscope and location CSV files recorded by AX3 loggers and
//! phones. Kinematic data is reduced to one row per second holding the mean of every
//! sample in that second; AX3 data additionally has its baseline removed by a high-pass
//! filter before reduction. Location data is passed through unchanged apart from the
//! added epoch column.
//!
//! Files are held in a disk-backed row store while they are processed, so inputs larger
//! than memory are fine.
//!
//! ## Crate Structure
//!
//! - **`average`**: running `Mean`, windowed `Median` and `RollingMean` accumulators.
//! - **`config`**: `CleanerConfig`, loaded from TOML and environment variables with
//!   `figment`.
//! - **`data`**: the row type, the row store, and the passes over it: ingestion,
//!   sample-rate estimation, baseline filtering, reduction and output.
//! - **`error`**: the crate-wide `CleanError` enum.
//! - **`logging`**: `tracing-subscriber` initialisation.
//! - **`pipeline`**: per-file processing and the batch driver.
//! - **`sensor`**: supported sensor types and their output layouts.

pub mod average;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod sensor;
