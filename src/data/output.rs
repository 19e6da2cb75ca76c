//! Destinations for reduced rows.
use crate::data::row::{EpochResolution, Row};
use crate::error::AppResult;
use crate::sensor::SensorType;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Something the reducer can hand output rows to.
pub trait RowSink {
    /// Accept one output row.
    fn write_row(&mut self, row: &Row) -> AppResult<()>;

    /// Flush anything buffered. Called once after the last row.
    fn finish(&mut self) -> AppResult<()> {
        Ok(())
    }
}

impl RowSink for Vec<Row> {
    fn write_row(&mut self, row: &Row) -> AppResult<()> {
        self.push(row.clone());
        Ok(())
    }
}

/// A writer for the cleaned text format.
///
/// One heading line for the sensor type, then one comma-separated line per row; every
/// line ends in `\r\n` to match the AX3 reference files.
pub struct CsvRowWriter<W: Write> {
    writer: csv::Writer<W>,
    sensor: SensorType,
    resolution: EpochResolution,
    rows_written: u64,
}

impl CsvRowWriter<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: &Path, sensor: SensorType, resolution: EpochResolution) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        tracing::info!(path = %path.display(), heading = sensor.heading(), "Writing output");
        Self::new(BufWriter::new(file), sensor, resolution)
    }
}

impl<W: Write> CsvRowWriter<W> {
    /// Wrap `inner` and write the heading line.
    pub fn new(mut inner: W, sensor: SensorType, resolution: EpochResolution) -> AppResult<Self> {
        inner.write_all(sensor.heading().as_bytes())?;
        inner.write_all(b"\r\n")?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(inner);
        Ok(Self {
            writer,
            sensor,
            resolution,
            rows_written: 0,
        })
    }

    /// Number of data lines written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> AppResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
    }
}

impl<W: Write> RowSink for CsvRowWriter<W> {
    fn write_row(&mut self, row: &Row) -> AppResult<()> {
        let record = row.to_record(self.sensor, self.resolution)?;
        self.writer.write_record(&record)?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> AppResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Default output path: `<stem>_clean<.ext>` beside the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_clean.{}", ext.to_string_lossy()),
        None => format!("{stem}_clean"),
    };
    input.with_file_name(name)
}

/// Path of the samples-per-second report written beside `output`.
pub fn rate_report_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_rate.txt"))
}
