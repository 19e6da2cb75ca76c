//! Configuration loading using Figment
//!
//! Configuration is loaded from:
//! 1. `config/cleaner.toml` (base configuration)
//! 2. Environment variables prefixed with `SENSOR_CLEAN_`, with `__` separating nested keys
//!
//! # Example
//! ```no_run
//! use sensor_clean::config::CleanerConfig;
//!
//! let config = CleanerConfig::load()?;
//! config.validate()?;
//! println!("Sensor: {}", config.processing.sensor);
//! # Ok::<(), sensor_clean::error::CleanError>(())
//! ```

use crate::data::baseline::BaselineConfig;
use crate::data::output::default_output_path;
use crate::data::row::EpochResolution;
use crate::error::{AppResult, CleanError};
use crate::pipeline::FileJob;
use crate::sensor::SensorType;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/cleaner.toml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "SENSOR_CLEAN_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Settings shared by every file in the batch
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Files to clean
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format (pretty, compact, json)
    #[serde(default = "default_format")]
    pub format: String,
}

/// Settings applied to each file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Sensor type of the inputs, unless a file overrides it
    #[serde(default = "default_sensor")]
    pub sensor: SensorType,
    /// Sample rate of AX3 data; estimated from the data when absent
    #[serde(default)]
    pub sample_rate_hz: Option<f64>,
    /// High-pass cutoff in Hz
    #[serde(default = "default_cutoff")]
    pub cutoff_hz: f64,
    /// Butterworth filter order
    #[serde(default = "default_poles")]
    pub filter_poles: usize,
    /// Filter forwards and backwards
    #[serde(default = "default_true")]
    pub zero_phase: bool,
    /// Write epoch values in milliseconds instead of rounded seconds
    #[serde(default)]
    pub millisecond_epoch: bool,
    /// Directory for row store spill files; the system temporary directory when absent
    #[serde(default)]
    pub spill_dir: Option<PathBuf>,
    /// Write the samples-per-second histogram when the sample rate is estimated
    #[serde(default = "default_true")]
    pub write_rate_report: bool,
    /// Replace existing outputs; when false, files whose output exists are skipped
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

/// One file to clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Input path
    pub input: PathBuf,
    /// Output path; `<stem>_clean<ext>` beside the input when absent
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Sensor type for this file only
    #[serde(default)]
    pub sensor: Option<SensorType>,
}

// Default value functions
fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "compact".to_string()
}

fn default_sensor() -> SensorType {
    SensorType::Ax3Accelerometer
}

fn default_cutoff() -> f64 {
    0.05
}

fn default_poles() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            sensor: default_sensor(),
            sample_rate_hz: None,
            cutoff_hz: default_cutoff(),
            filter_poles: default_poles(),
            zero_phase: true,
            millisecond_epoch: false,
            spill_dir: None,
            write_rate_report: true,
            overwrite: true,
        }
    }
}

impl ProcessingConfig {
    /// Epoch resolution for output rows.
    pub fn epoch_resolution(&self) -> EpochResolution {
        if self.millisecond_epoch {
            EpochResolution::Milliseconds
        } else {
            EpochResolution::Seconds
        }
    }

    /// Baseline filter parameters for data sampled at `sample_rate_hz`.
    pub fn baseline(&self, sample_rate_hz: f64) -> BaselineConfig {
        BaselineConfig {
            cutoff_hz: self.cutoff_hz,
            sample_rate_hz,
            poles: self.filter_poles,
            zero_phase: self.zero_phase,
        }
    }
}

impl CleanerConfig {
    /// Load configuration from `config/cleaner.toml` and environment variables
    ///
    /// Example override: `SENSOR_CLEAN_PROCESSING__CUTOFF_HZ=0.1`
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment variables still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config = Self::figment(path.as_ref()).extract()?;
        Ok(config)
    }

    /// Configuration sources in merge order.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(CleanerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            )));
        }

        let processing = &self.processing;
        if !(processing.cutoff_hz > 0.0) {
            return Err(invalid(format!(
                "Invalid cutoff_hz {}. Must be positive",
                processing.cutoff_hz
            )));
        }
        if let Some(rate) = processing.sample_rate_hz {
            if !(rate > 0.0) {
                return Err(invalid(format!(
                    "Invalid sample_rate_hz {rate}. Must be positive"
                )));
            }
            if processing.cutoff_hz >= rate / 2.0 {
                return Err(invalid(format!(
                    "cutoff_hz {} must be below the Nyquist frequency {} Hz",
                    processing.cutoff_hz,
                    rate / 2.0
                )));
            }
        }
        if processing.filter_poles == 0 || processing.filter_poles % 2 != 0 {
            return Err(invalid(format!(
                "Invalid filter_poles {}. Must be a positive even number",
                processing.filter_poles
            )));
        }

        if self.files.is_empty() {
            return Err(invalid("No input files configured".to_string()));
        }
        Ok(())
    }

    /// One job per configured file, with defaults filled in.
    pub fn jobs(&self) -> Vec<FileJob> {
        self.files
            .iter()
            .map(|file| FileJob {
                output: file
                    .output
                    .clone()
                    .unwrap_or_else(|| default_output_path(&file.input)),
                input: file.input.clone(),
                sensor: file.sensor.unwrap_or(self.processing.sensor),
            })
            .collect()
    }
}

fn invalid(message: String) -> CleanError {
    CleanError::Configuration(message)
}
