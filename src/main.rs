//! CLI entry point for sensor-clean
//!
//! Cleans one file named on the command line, or every `[[files]]` entry of the
//! configuration file when no input is given.
//!
//! # Usage
//!
//! ```bash
//! sensor-clean data.csv data-out.csv ax3
//! sensor-clean --samplerate 100 --cutoff 0.1 data.csv
//! sensor-clean --config config/cleaner.toml
//! ```

// Global allocator (Microsoft Rust Guidelines: M-MIMALLOC-APPS)
#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use sensor_clean::config::{CleanerConfig, FileConfig, DEFAULT_CONFIG_PATH};
use sensor_clean::logging;
use sensor_clean::pipeline::Cleaner;
use sensor_clean::sensor::SensorType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sensor-clean")]
#[command(about = "Clean AX3 and phone sensor CSV files", long_about = None)]
#[command(after_help = "<TYPE> is one of: accelerometer, ax3, gpslocation, gyroscope, location")]
struct Cli {
    /// Input file; when omitted the files listed in the configuration are cleaned
    input: Option<PathBuf>,

    /// Output file; defaults to <stem>_clean<ext> beside the input
    output: Option<PathBuf>,

    /// Sensor type of the input
    #[arg(value_name = "TYPE")]
    sensor: Option<SensorType>,

    /// Configuration file (TOML format)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// High-pass cutoff frequency in Hz
    #[arg(short, long)]
    cutoff: Option<f64>,

    /// Sample rate in samples per second; inferred from the data when omitted
    #[arg(short = 's', long = "samplerate")]
    sample_rate: Option<f64>,

    /// Regenerate outputs that already exist
    #[arg(short, long)]
    force: bool,

    /// Skip files whose output already exists
    #[arg(short, long, conflicts_with = "force")]
    lazy: bool,

    /// Write epoch values in milliseconds
    #[arg(long)]
    millisecond_epoch: bool,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    fn apply(self, config: &mut CleanerConfig) {
        let processing = &mut config.processing;
        if let Some(cutoff) = self.cutoff {
            processing.cutoff_hz = cutoff;
        }
        if self.sample_rate.is_some() {
            processing.sample_rate_hz = self.sample_rate;
        }
        if self.force {
            processing.overwrite = true;
        }
        if self.lazy {
            processing.overwrite = false;
        }
        if self.millisecond_epoch {
            processing.millisecond_epoch = true;
        }

        match self.input {
            Some(input) => {
                config.files = vec![FileConfig {
                    input,
                    output: self.output,
                    sensor: self.sensor,
                }];
            }
            None => {
                if let Some(sensor) = self.sensor {
                    processing.sensor = sensor;
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CleanerConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply(&mut config);
    config.validate()?;
    logging::init_from_config(&config)?;

    let jobs = config.jobs();
    for job in &jobs {
        tracing::info!(
            input = %job.input.display(),
            output = %job.output.display(),
            sensor = %job.sensor,
            heading = job.sensor.heading(),
            "Queued"
        );
    }

    let report = Cleaner::from_config(&config).run_batch(&jobs);
    for summary in &report.completed {
        tracing::info!(
            input = %summary.input.display(),
            lines_read = summary.lines_read,
            rows_written = summary.rows_written,
            "Done"
        );
    }

    if !report.is_success() {
        for (job, error) in &report.failed {
            tracing::error!(input = %job.input.display(), %error, "Failed");
        }
        bail!("{} of {} files failed", report.failed.len(), jobs.len());
    }
    Ok(())
}
