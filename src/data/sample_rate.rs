//! Estimate the sample rate of a file from the number of samples in each second.
use crate::average::{Average, Mean};
use crate::data::store::RowStore;
use crate::error::AppResult;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Histogram of samples per completed second, and its mean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleRateEstimate {
    /// Samples in a second → number of seconds with that many samples.
    pub histogram: BTreeMap<u64, u64>,
    /// Mean samples per second; 0 when no second was completed.
    pub samples_per_second: f64,
}

impl SampleRateEstimate {
    /// Number of completed seconds the estimate is based on.
    pub fn seconds(&self) -> u64 {
        self.histogram.values().sum()
    }

    /// One line per histogram bucket, in ascending sample count.
    pub fn report_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.histogram
            .iter()
            .map(|(samples, seconds)| format!("Seconds with {samples} samples in them = {seconds}"))
    }

    /// Write the histogram as a text report.
    pub fn write_report(&self, path: &Path) -> AppResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for line in self.report_lines() {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        tracing::info!(path = %path.display(), "Sample rate report written");
        Ok(())
    }
}

/// Walk the store once, counting the samples in every second that is followed by a later
/// one. The trailing second is incomplete and is not counted.
pub fn estimate_sample_rate(rows: &RowStore) -> AppResult<SampleRateEstimate> {
    let mut histogram = BTreeMap::new();
    let mut current: Option<i64> = None;
    let mut samples_in_second = 0u64;

    for index in 0..rows.len() {
        let second = rows.epoch_second(index)?;
        if current != Some(second) {
            if current.is_some() {
                *histogram.entry(samples_in_second).or_insert(0) += 1;
            }
            current = Some(second);
            samples_in_second = 0;
        }
        samples_in_second += 1;
    }

    let mut mean = Mean::new();
    for (&samples, &seconds) in &histogram {
        tracing::debug!(samples, seconds, "Samples per second bucket");
        mean.add_multiple(samples as f64, seconds);
    }

    let samples_per_second = if mean.count() == 0 {
        tracing::info!("No sample rate because no complete seconds");
        0.0
    } else {
        mean.average()?
    };
    tracing::info!(samples_per_second, "Mean sample rate");

    Ok(SampleRateEstimate {
        histogram,
        samples_per_second,
    })
}
