//! High-pass baseline removal for constant-rate kinematic data.
use crate::data::row::DataType;
use crate::data::store::RowStore;
use crate::error::{AppResult, CleanError};
use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};
use serde::Deserialize;

/// Configuration for the `BaselineFilter`.
///
/// This struct is typically deserialized from the `[processing]` table of the
/// configuration file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BaselineConfig {
    /// The cutoff frequency of the filter in Hz.
    pub cutoff_hz: f64,
    /// The sample rate of the data in Hz.
    pub sample_rate_hz: f64,
    /// Filter order; must be even, each pair of poles is one biquad section.
    pub poles: usize,
    /// Run the filter forwards and then backwards so the output has no phase shift.
    pub zero_phase: bool,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 0.05,
            sample_rate_hz: 100.0,
            poles: 4,
            zero_phase: true,
        }
    }
}

/// A Butterworth high-pass filter that removes slow drift and DC offset from each axis.
///
/// The filter is a cascade of second-order sections from the `biquad` crate with the Q
/// values of an even-order Butterworth response.
///
/// # Example Configuration (`.toml`)
///
/// ```toml
/// [processing]
/// cutoff_hz = 0.05       # Cutoff frequency in Hz
/// sample_rate_hz = 100.0 # Omit to estimate from the data
/// filter_poles = 4
/// zero_phase = true
/// ```
#[derive(Debug, Clone)]
pub struct BaselineFilter {
    config: BaselineConfig,
    sections: Vec<Coefficients<f64>>,
}

impl BaselineFilter {
    /// Design the filter.
    pub fn new(config: BaselineConfig) -> AppResult<Self> {
        let sections = Self::design_filter(&config)?;
        Ok(Self { config, sections })
    }

    fn design_filter(config: &BaselineConfig) -> AppResult<Vec<Coefficients<f64>>> {
        if !(config.sample_rate_hz > 0.0) {
            return Err(CleanError::Filter(format!(
                "sample rate must be positive, got {}",
                config.sample_rate_hz
            )));
        }
        if !(config.cutoff_hz > 0.0) || config.cutoff_hz >= config.sample_rate_hz / 2.0 {
            return Err(CleanError::Filter(format!(
                "cutoff {} Hz must lie between 0 and the Nyquist frequency {} Hz",
                config.cutoff_hz,
                config.sample_rate_hz / 2.0
            )));
        }
        if config.poles == 0 || config.poles % 2 != 0 {
            return Err(CleanError::Filter(format!(
                "filter order must be a positive even number, got {}",
                config.poles
            )));
        }

        let fs = config.sample_rate_hz.hz();
        let f0 = config.cutoff_hz.hz();
        butterworth_q(config.poles)
            .into_iter()
            .map(|q| {
                Coefficients::<f64>::from_params(Type::HighPass, fs, f0, q).map_err(|e| {
                    CleanError::Filter(format!("Failed to create filter coefficients: {e:?}"))
                })
            })
            .collect()
    }

    /// Filter a complete series, returning one output sample per input sample.
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let mut output = self.run_cascade(input.iter().copied());
        if self.config.zero_phase {
            output = self.run_cascade(output.into_iter().rev());
            output.reverse();
        }
        output
    }

    fn run_cascade(&self, input: impl Iterator<Item = f64>) -> Vec<f64> {
        let mut stages: Vec<DirectForm2Transposed<f64>> = self
            .sections
            .iter()
            .map(|c| DirectForm2Transposed::<f64>::new(*c))
            .collect();

        // Start from the first sample's level so a DC offset does not ring through as a step.
        let mut offset = None;
        input
            .map(|x| {
                let level = *offset.get_or_insert(x);
                stages
                    .iter_mut()
                    .fold(x - level, |acc, stage| stage.run(acc))
            })
            .collect()
    }

    /// Filter the three `from` axes of every row into the `to` axes, index for index.
    pub fn apply(&self, rows: &mut RowStore, from: DataType, to: DataType) -> AppResult<()> {
        tracing::info!(
            cutoff_hz = self.config.cutoff_hz,
            sample_rate_hz = self.config.sample_rate_hz,
            poles = self.config.poles,
            zero_phase = self.config.zero_phase,
            "High pass filter to remove baseline and slow drift"
        );
        for (axis, name) in ["x", "y", "z"].iter().enumerate() {
            let input = rows.column(from.column(axis)?)?;
            let output = self.filter(&input);
            rows.write_column(to.column(axis)?, &output)?;
            tracing::debug!(axis = name, rows = output.len(), "Axis filter completed");
        }
        Ok(())
    }
}

/// Q of each second-order section of an even-order Butterworth filter.
fn butterworth_q(order: usize) -> Vec<f64> {
    (1..=order / 2)
        .map(|k| {
            let angle = (2 * k - 1) as f64 * std::f64::consts::PI / (2 * order) as f64;
            1.0 / (2.0 * angle.cos())
        })
        .collect()
}
