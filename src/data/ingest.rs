//! Read delimited sensor text into a [`RowStore`].
use crate::data::row::parse_epoch_seconds;
use crate::data::store::RowStore;
use crate::error::AppResult;
use crate::sensor::SensorType;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

const PROGRESS_INTERVAL: u64 = 100_000;

/// What happened while reading one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records seen, including a header and skipped records.
    pub records_read: u64,
    /// Records appended to the store.
    pub rows_stored: u64,
    /// Records skipped because they could not be parsed.
    pub skipped: u64,
    /// Header line, when the input started with one.
    pub header: Option<String>,
}

/// Number of lines in `path`, used to size the row store before ingesting.
pub fn count_lines(path: &Path) -> AppResult<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0usize;
    for line in reader.split(b'\n') {
        line?;
        lines += 1;
    }
    tracing::debug!(path = %path.display(), lines, "Counted input lines");
    Ok(lines)
}

/// Read every record of `path` into `rows`.
pub fn ingest_file(path: &Path, sensor: SensorType, rows: &mut RowStore) -> AppResult<IngestSummary> {
    let file = File::open(path)?;
    tracing::info!(path = %path.display(), %sensor, "Reading input");
    ingest_reader(BufReader::new(file), sensor, rows)
}

/// Read comma-separated records from `reader` into `rows`.
///
/// The first record is treated as a header when its first field does not start with a
/// digit. Records with too few fields, non-numeric values, or an unparseable timestamp are
/// logged and skipped; extra fields are ignored.
pub fn ingest_reader<R: Read>(
    reader: R,
    sensor: SensorType,
    rows: &mut RowStore,
) -> AppResult<IngestSummary> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let fields = sensor.input_fields();
    let mut summary = IngestSummary::default();
    let mut record = csv::StringRecord::new();

    loop {
        match csv_reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                summary.records_read += 1;
                summary.skipped += 1;
                tracing::warn!(error = %e, "Skipping unreadable record");
                continue;
            }
        }
        summary.records_read += 1;

        let first = record.get(0).unwrap_or_default();
        if summary.records_read == 1 && !first.starts_with(|c: char| c.is_ascii_digit()) {
            let header = record.iter().collect::<Vec<_>>().join(",");
            tracing::info!(%header, "Skipping header");
            summary.header = Some(header);
            continue;
        }

        match parse_record(&record, fields) {
            Some(values) => {
                let datetime = first;
                if sensor.is_location() {
                    rows.push_location(
                        datetime, values[0], values[1], values[2], values[3], values[4],
                    )?;
                } else {
                    rows.push_kinematic(datetime, values[0], values[1], values[2])?;
                }
                summary.rows_stored += 1;
            }
            None => {
                summary.skipped += 1;
                tracing::warn!(
                    line = summary.records_read,
                    record = ?record,
                    "Skipping malformed record"
                );
            }
        }

        if summary.records_read % PROGRESS_INTERVAL == 0 {
            tracing::debug!(lines = summary.records_read, "Lines read");
        }
    }

    tracing::info!(
        records = summary.records_read,
        stored = summary.rows_stored,
        skipped = summary.skipped,
        "Input read"
    );
    Ok(summary)
}

fn parse_record(record: &csv::StringRecord, fields: usize) -> Option<[f64; 5]> {
    if record.len() < 1 + fields {
        return None;
    }
    let datetime = record.get(0)?;
    parse_epoch_seconds(datetime).ok()?;

    let mut values = [0.0; 5];
    for (slot, field) in values.iter_mut().zip(record.iter().skip(1).take(fields)) {
        *slot = field.parse().ok()?;
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::row::DataType;

    #[test]
    fn test_kinematic_with_header() {
        let input = "Time, X, Y, Z\r\n\
                     2019-07-22 15:00:04.120, 0.1, -0.2, 0.98\r\n\
                     2019-07-22 15:00:04.130,0.2,-0.1,1.0\r\n";
        let mut store = RowStore::with_capacity(4).unwrap();
        let summary = ingest_reader(input.as_bytes(), SensorType::Ax3Accelerometer, &mut store).unwrap();

        assert_eq!(summary.rows_stored, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.header.as_deref(), Some("Time,X,Y,Z"));
        assert_eq!(store.datetime(0).unwrap(), "2019-07-22 15:00:04.120");
        assert_eq!(store.get_value(0, DataType::Raw, 2).unwrap(), 0.98);
        assert_eq!(store.get_value(1, DataType::Cooked, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_headerless_location() {
        let input = "2020-03-01 12:00:00,51.5,-0.12,35.0,4.0,1.5\n\
                     2020-03-01 12:00:01,51.6,-0.13,36.0,5.0,1.0\n";
        let mut store = RowStore::with_capacity(2).unwrap();
        let summary = ingest_reader(input.as_bytes(), SensorType::Location, &mut store).unwrap();

        assert_eq!(summary.header, None);
        assert_eq!(summary.rows_stored, 2);
        let row = store.get(1).unwrap();
        assert_eq!(row.values(), &[51.6, -0.13, 36.0, 5.0, 1.0, 0.0]);
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_malformed_records_are_skipped() {
        let input = "2020-01-01 00:00:00,1,2,3\n\
                     2020-01-01 00:00:00,1,2\n\
                     2020-01-01 00:00:00,1,two,3\n\
                     not a date,1,2,3\n\
                     2020-01-01 00:00:01,4,5,6,extra\n";
        let mut store = RowStore::with_capacity(8).unwrap();
        let summary = ingest_reader(input.as_bytes(), SensorType::PhoneGyroscope, &mut store).unwrap();

        assert_eq!(summary.records_read, 5);
        assert_eq!(summary.rows_stored, 2);
        assert_eq!(summary.skipped, 3);
        assert_eq!(store.value(1, 2).unwrap(), 6.0);
        assert!(logs_contain("Skipping malformed record"));
    }

    #[test]
    fn test_count_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "a\nb\nc\n").unwrap();
        assert_eq!(count_lines(&path).unwrap(), 3);

        let mut store = RowStore::with_capacity(3).unwrap();
        let summary = ingest_file(&path, SensorType::PhoneAccelerometer, &mut store).unwrap();
        // "a" is the header, "b" and "c" lack values.
        assert_eq!(summary.rows_stored, 0);
        assert_eq!(summary.skipped, 2);
    }
}
