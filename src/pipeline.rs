//! Per-file processing and the batch driver.
//!
//! Each file goes through the same sequence of passes over one [`RowStore`]:
//!
//! 1. count the input lines to size the store,
//! 2. ingest every record,
//! 3. estimate the sample rate when none is configured,
//! 4. remove the baseline from AX3 data,
//! 5. reduce to one row per second (kinematic) or pass rows through (location).
//!
//! A failure aborts the file it occurred in; [`Cleaner::run_batch`] records it and moves on.

use crate::config::{CleanerConfig, ProcessingConfig};
use crate::data::baseline::BaselineFilter;
use crate::data::ingest::{count_lines, ingest_file};
use crate::data::output::{rate_report_path, CsvRowWriter};
use crate::data::reduce::{reduce, ReduceMode};
use crate::data::row::DataType;
use crate::data::sample_rate::estimate_sample_rate;
use crate::data::store::RowStore;
use crate::error::{AppResult, CleanError};
use crate::sensor::SensorType;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One input file and where its cleaned output goes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileJob {
    /// Input path
    pub input: PathBuf,
    /// Output path
    pub output: PathBuf,
    /// How to interpret the input
    pub sensor: SensorType,
}

/// Counters and timing for one processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    /// Input path
    pub input: PathBuf,
    /// Output path
    pub output: PathBuf,
    /// Sensor type the file was read as
    pub sensor: SensorType,
    /// Records read, header and skipped records included
    pub lines_read: u64,
    /// Records stored
    pub rows_stored: u64,
    /// Records skipped as malformed
    pub rows_skipped: u64,
    /// Rows written to the output
    pub rows_written: u64,
    /// Sample rate used or estimated, when one was needed
    pub sample_rate_hz: Option<f64>,
    /// Wall-clock processing time
    pub elapsed: Duration,
}

impl FileSummary {
    /// Input records processed per second of wall-clock time.
    pub fn lines_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.lines_read as f64 / secs
        } else {
            0.0
        }
    }
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files cleaned
    pub completed: Vec<FileSummary>,
    /// Files left alone because their output already existed
    pub skipped: Vec<FileJob>,
    /// Files abandoned, with the error that stopped them
    pub failed: Vec<(FileJob, CleanError)>,
}

impl BatchReport {
    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cleans files with one set of processing parameters.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    processing: ProcessingConfig,
}

impl Cleaner {
    /// Create a cleaner.
    pub fn new(processing: ProcessingConfig) -> Self {
        Self { processing }
    }

    /// Create a cleaner from the `[processing]` table.
    pub fn from_config(config: &CleanerConfig) -> Self {
        Self::new(config.processing.clone())
    }

    /// Clean every job in order, continuing past failures.
    pub fn run_batch(&self, jobs: &[FileJob]) -> BatchReport {
        let mut report = BatchReport::default();
        for job in jobs {
            if !self.processing.overwrite && job.output.exists() {
                tracing::info!(output = %job.output.display(), "Output already exists, skipping");
                report.skipped.push(job.clone());
                continue;
            }
            match self.process_file(&job.input, &job.output, job.sensor) {
                Ok(summary) => report.completed.push(summary),
                Err(e) => {
                    tracing::error!(input = %job.input.display(), error = %e, "File abandoned");
                    report.failed.push((job.clone(), e));
                }
            }
        }
        tracing::info!(
            completed = report.completed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Batch finished"
        );
        report
    }

    /// Clean `input` into `output`.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        sensor: SensorType,
    ) -> AppResult<FileSummary> {
        let span = tracing::info_span!("clean_file", input = %input.display(), %sensor);
        let _enter = span.enter();
        let start = Instant::now();

        let lines = count_lines(input)?;
        tracing::info!(entries = lines, "Counted entries in the file");

        let mut rows = match &self.processing.spill_dir {
            Some(dir) => RowStore::create_in(dir, lines)?,
            None => RowStore::with_capacity(lines)?,
        };
        let ingest = ingest_file(input, sensor, &mut rows)?;

        let sample_rate_hz = self.sample_rate(&rows, output)?;
        if sensor.has_baseline() {
            self.remove_baseline(&mut rows, sample_rate_hz)?;
        }

        let mut writer =
            CsvRowWriter::create(output, sensor, self.processing.epoch_resolution())?;
        let mode = if sensor.is_aggregated() {
            ReduceMode::Aggregate
        } else {
            ReduceMode::PassThrough
        };
        let rows_written = reduce(&rows, mode, &mut writer)?;

        let summary = FileSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            sensor,
            lines_read: ingest.records_read,
            rows_stored: ingest.rows_stored,
            rows_skipped: ingest.skipped,
            rows_written,
            sample_rate_hz: Some(sample_rate_hz),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            lines_read = summary.lines_read,
            rows_written = summary.rows_written,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            lines_per_second = summary.lines_per_second(),
            "File cleaned"
        );
        Ok(summary)
    }

    fn sample_rate(&self, rows: &RowStore, output: &Path) -> AppResult<f64> {
        if let Some(rate) = self.processing.sample_rate_hz {
            return Ok(rate);
        }
        let estimate = estimate_sample_rate(rows)?;
        if self.processing.write_rate_report {
            estimate.write_report(&rate_report_path(output))?;
        }
        Ok(estimate.samples_per_second)
    }

    fn remove_baseline(&self, rows: &mut RowStore, sample_rate_hz: f64) -> AppResult<()> {
        // Too little data to estimate a rate also means no second boundary to emit at.
        if sample_rate_hz <= 0.0 {
            tracing::warn!("No sample rate available, baseline not removed");
            return Ok(());
        }
        let filter = BaselineFilter::new(self.processing.baseline(sample_rate_hz))?;
        filter.apply(rows, DataType::Raw, DataType::Cooked)
    }
}
