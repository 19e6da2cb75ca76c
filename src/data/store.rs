//! Disk-backed, positionally addressed store of rows.
//!
//! The store holds every row of an input file so that later passes (sample-rate
//! estimation, baseline filtering, reduction) can walk it in order and rewrite columns in
//! place, without the whole dataset having to fit in memory. Records live in an unlinked
//! spill file that is memory-mapped, so the operating system pages them in and out as the
//! passes move through the file.
//!
//! # Record Layout
//! ```text
//! offset  size  field
//!      0    30  datetime (UTF-8, zero-terminated, truncated to 29 bytes)
//!     30     2  padding
//!     32    48  six f64 values, little-endian
//! ```
//!
//! Indices are assigned in append order and never change; there are no keys.

use crate::data::row::{parse_epoch_seconds, DataType, Row, COLUMNS, SECOND_RESOLUTION_LEN};
use crate::error::{AppResult, CleanError};
use memmap2::{MmapMut, MmapOptions};
use std::fs::File;
use std::path::Path;

/// Bytes reserved for the timestamp, including the terminating zero.
pub const DATETIME_SIZE: usize = 30;

const VALUES_OFFSET: usize = 32;

/// Size of one packed record in bytes.
pub const RECORD_SIZE: usize = VALUES_OFFSET + COLUMNS * 8;

/// Smallest number of records reserved, whatever the size hint.
pub const MIN_CAPACITY: usize = 1024;

/// Append-only row store backed by a memory-mapped spill file.
///
/// The spill file is created with [`tempfile`] and is removed by the operating system
/// once the store is dropped.
pub struct RowStore {
    file: File,
    mmap: MmapMut,
    len: usize,
    capacity: usize,
}

impl RowStore {
    /// Create a store in the system temporary directory with room for `size_hint` rows.
    ///
    /// The hint only sizes the initial allocation; appending past it grows the store.
    pub fn with_capacity(size_hint: usize) -> AppResult<Self> {
        let file = tempfile::tempfile()?;
        Self::from_file(file, size_hint)
    }

    /// Create a store whose spill file lives in `dir`.
    pub fn create_in(dir: &Path, size_hint: usize) -> AppResult<Self> {
        let file = tempfile::tempfile_in(dir)?;
        Self::from_file(file, size_hint)
    }

    fn from_file(file: File, size_hint: usize) -> AppResult<Self> {
        let capacity = size_hint.max(MIN_CAPACITY);
        let mmap = map(&file, capacity)?;
        tracing::debug!(capacity, bytes = capacity * RECORD_SIZE, "Row store allocated");
        Ok(Self {
            file,
            mmap,
            len: 0,
            capacity,
        })
    }

    /// Number of rows appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no rows have been appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of rows that fit before the spill file has to grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a row.
    pub fn push(&mut self, row: &Row) -> AppResult<()> {
        self.push_raw(row.datetime(), row.values())
    }

    /// Append a kinematic sample; the cooked columns start at zero.
    pub fn push_kinematic(&mut self, datetime: &str, x: f64, y: f64, z: f64) -> AppResult<()> {
        self.push_raw(datetime, &[x, y, z, 0.0, 0.0, 0.0])
    }

    /// Append a location fix.
    pub fn push_location(
        &mut self,
        datetime: &str,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        accuracy: f64,
        speed: f64,
    ) -> AppResult<()> {
        self.push_raw(
            datetime,
            &[latitude, longitude, altitude, accuracy, speed, 0.0],
        )
    }

    fn push_raw(&mut self, datetime: &str, values: &[f64; COLUMNS]) -> AppResult<()> {
        if self.len == self.capacity {
            self.grow()?;
        }
        let record = self.record_mut(self.len);
        encode_datetime(&mut record[..DATETIME_SIZE], datetime);
        record[DATETIME_SIZE..VALUES_OFFSET].fill(0);
        for (column, value) in values.iter().enumerate() {
            write_f64(record, column, *value);
        }
        self.len += 1;
        Ok(())
    }

    fn grow(&mut self) -> AppResult<()> {
        let capacity = self.capacity * 2;
        self.mmap.flush()?;
        self.mmap = map(&self.file, capacity)?;
        tracing::debug!(from = self.capacity, to = capacity, "Row store grown");
        self.capacity = capacity;
        Ok(())
    }

    /// Row at `index`, with its full stored timestamp.
    pub fn get(&self, index: usize) -> AppResult<Row> {
        Ok(decode_row(self.record(index)?))
    }

    /// Stored timestamp of the row at `index`.
    pub fn datetime(&self, index: usize) -> AppResult<String> {
        Ok(decode_datetime(self.record(index)?))
    }

    /// Whole seconds since the epoch of the row at `index`.
    ///
    /// Only used to detect second boundaries; never stored.
    pub fn epoch_second(&self, index: usize) -> AppResult<i64> {
        let record = self.record(index)?;
        // Only the whole-second prefix matters; anything after it may be cut short.
        let end = datetime_len(record).min(SECOND_RESOLUTION_LEN);
        let datetime = std::str::from_utf8(&record[..end])
            .map_err(|_| CleanError::Timestamp(decode_datetime(record)))?;
        parse_epoch_seconds(datetime)
    }

    /// Value of `column` (0–5) in the row at `index`.
    pub fn value(&self, index: usize, column: usize) -> AppResult<f64> {
        check_column(column)?;
        Ok(read_f64(self.record(index)?, column))
    }

    /// Value of `axis` in the raw or cooked half of the row at `index`.
    pub fn get_value(&self, index: usize, data_type: DataType, axis: usize) -> AppResult<f64> {
        self.value(index, data_type.column(axis)?)
    }

    /// Overwrite `column` (0–5) of the row at `index`.
    pub fn set_value(&mut self, index: usize, column: usize, value: f64) -> AppResult<()> {
        check_column(column)?;
        self.check_index(index)?;
        write_f64(self.record_mut(index), column, value);
        Ok(())
    }

    /// Overwrite `axis` in the raw or cooked half of the row at `index`.
    pub fn put_value(
        &mut self,
        index: usize,
        data_type: DataType,
        axis: usize,
        value: f64,
    ) -> AppResult<()> {
        self.set_value(index, data_type.column(axis)?, value)
    }

    /// Copy one column out into a contiguous buffer.
    pub fn column(&self, column: usize) -> AppResult<Vec<f64>> {
        check_column(column)?;
        Ok((0..self.len)
            .map(|index| read_f64(self.record_at(index), column))
            .collect())
    }

    /// Overwrite one column from a buffer holding exactly one value per row.
    pub fn write_column(&mut self, column: usize, values: &[f64]) -> AppResult<()> {
        check_column(column)?;
        if values.len() != self.len {
            return Err(CleanError::IndexOutOfRange {
                index: values.len(),
                len: self.len,
            });
        }
        for (index, value) in values.iter().enumerate() {
            write_f64(self.record_mut(index), column, *value);
        }
        Ok(())
    }

    /// Rows in index order.
    pub fn iter(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.len).map(move |index| decode_row(self.record_at(index)))
    }

    /// Write dirty pages back to the spill file.
    pub fn flush(&self) -> AppResult<()> {
        self.mmap.flush()?;
        Ok(())
    }

    fn check_index(&self, index: usize) -> AppResult<()> {
        if index >= self.len {
            return Err(CleanError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn record(&self, index: usize) -> AppResult<&[u8]> {
        self.check_index(index)?;
        Ok(self.record_at(index))
    }

    fn record_at(&self, index: usize) -> &[u8] {
        let start = index * RECORD_SIZE;
        &self.mmap[start..start + RECORD_SIZE]
    }

    fn record_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * RECORD_SIZE;
        &mut self.mmap[start..start + RECORD_SIZE]
    }
}

fn map(file: &File, capacity: usize) -> AppResult<MmapMut> {
    file.set_len((capacity * RECORD_SIZE) as u64)?;
    // SAFETY: the file is an unlinked temporary owned by the store, so no other process
    // can truncate or modify it while mapped.
    #[allow(unsafe_code)]
    let mmap = unsafe { MmapOptions::new().map_mut(file)? };
    Ok(mmap)
}

fn check_column(column: usize) -> AppResult<()> {
    if column >= COLUMNS {
        return Err(CleanError::ColumnOutOfRange(column));
    }
    Ok(())
}

fn encode_datetime(dest: &mut [u8], datetime: &str) {
    let mut n = datetime.len().min(DATETIME_SIZE - 1);
    while !datetime.is_char_boundary(n) {
        n -= 1;
    }
    dest[..n].copy_from_slice(&datetime.as_bytes()[..n]);
    dest[n..].fill(0);
}

fn datetime_len(record: &[u8]) -> usize {
    record[..DATETIME_SIZE]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(DATETIME_SIZE)
}

fn decode_datetime(record: &[u8]) -> String {
    String::from_utf8_lossy(&record[..datetime_len(record)]).into_owned()
}

fn decode_row(record: &[u8]) -> Row {
    let mut values = [0.0; COLUMNS];
    for (column, value) in values.iter_mut().enumerate() {
        *value = read_f64(record, column);
    }
    Row::new(decode_datetime(record), values)
}

fn read_f64(record: &[u8], column: usize) -> f64 {
    let start = VALUES_OFFSET + column * 8;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&record[start..start + 8]);
    f64::from_le_bytes(bytes)
}

fn write_f64(record: &mut [u8], column: usize, value: f64) {
    let start = VALUES_OFFSET + column * 8;
    record[start..start + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get_round_trip() {
        let mut store = RowStore::with_capacity(4).unwrap();
        let row = Row::new("2019-07-22 15:00:04.125", [1.0, -2.5, 3.25, 4.0, 5.0, 6.0]);
        store.push(&row).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap(), row);
        assert_eq!(store.datetime(0).unwrap(), "2019-07-22 15:00:04.125");
    }

    #[test]
    fn test_zero_hint_grows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RowStore::create_in(dir.path(), 0).unwrap();
        let initial = store.capacity();

        for i in 0..(initial * 2 + 3) {
            store
                .push_kinematic("2019-07-22 15:00:04", i as f64, 0.0, 0.0)
                .unwrap();
        }

        assert_eq!(store.len(), initial * 2 + 3);
        assert!(store.capacity() >= store.len());
        assert_eq!(store.value(0, 0).unwrap(), 0.0);
        assert_eq!(store.value(initial * 2 + 2, 0).unwrap(), (initial * 2 + 2) as f64);
    }

    #[test]
    fn test_long_timestamp_truncated() {
        let mut store = RowStore::with_capacity(1).unwrap();
        let long = "2019-07-22 15:00:04.123456789012345";
        store.push_kinematic(long, 0.0, 0.0, 0.0).unwrap();

        let stored = store.datetime(0).unwrap();
        assert_eq!(stored.len(), DATETIME_SIZE - 1);
        assert!(long.starts_with(&stored));
        assert_eq!(store.epoch_second(0).unwrap(), 1_563_807_604);
    }

    #[test]
    fn test_truncation_keeps_whole_characters() {
        let mut store = RowStore::with_capacity(2).unwrap();
        // The 29-byte cut would land inside the two-byte 'é'.
        let accented = "2019-07-22 15:00:04.12345678\u{e9}";
        assert_eq!(accented.len(), DATETIME_SIZE);
        store.push_kinematic(accented, 1.0, 2.0, 3.0).unwrap();
        store.push_kinematic("2019-07-22 15:00:05", 1.0, 2.0, 3.0).unwrap();

        assert_eq!(store.datetime(0).unwrap(), "2019-07-22 15:00:04.12345678");
        assert_eq!(store.epoch_second(0).unwrap(), 1_563_807_604);
        assert_eq!(
            store.epoch_second(0).unwrap(),
            store.get(0).unwrap().epoch_seconds().unwrap()
        );
        let estimate = crate::data::sample_rate::estimate_sample_rate(&store).unwrap();
        assert_eq!(estimate.samples_per_second, 1.0);
    }

    #[test]
    fn test_out_of_range() {
        let mut store = RowStore::with_capacity(2).unwrap();
        store.push_kinematic("2019-07-22 15:00:04", 1.0, 2.0, 3.0).unwrap();

        assert!(matches!(
            store.get(1),
            Err(CleanError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            store.value(0, 6),
            Err(CleanError::ColumnOutOfRange(6))
        ));
        assert!(store.set_value(5, 0, 1.0).is_err());
        assert!(store.put_value(0, DataType::Cooked, 3, 1.0).is_err());
    }

    #[test]
    fn test_put_value_targets_cooked_half() {
        let mut store = RowStore::with_capacity(2).unwrap();
        store.push_kinematic("2019-07-22 15:00:04", 1.0, 2.0, 3.0).unwrap();
        store.put_value(0, DataType::Cooked, 2, 9.5).unwrap();

        assert_eq!(store.get_value(0, DataType::Raw, 2).unwrap(), 3.0);
        assert_eq!(store.get_value(0, DataType::Cooked, 2).unwrap(), 9.5);
        assert_eq!(store.value(0, 5).unwrap(), 9.5);
    }

    #[test]
    fn test_column_copy_and_write_back() {
        let mut store = RowStore::with_capacity(3).unwrap();
        for i in 0..3 {
            store
                .push_location("2019-07-22 15:00:04", 51.0 + i as f64, -0.1, 10.0, 3.0, 0.0)
                .unwrap();
        }
        assert_eq!(store.column(0).unwrap(), vec![51.0, 52.0, 53.0]);

        store.write_column(3, &[7.0, 8.0, 9.0]).unwrap();
        assert_eq!(store.column(3).unwrap(), vec![7.0, 8.0, 9.0]);
        assert!(store.write_column(3, &[1.0]).is_err());
    }

    #[test]
    fn test_iter_in_append_order() {
        let mut store = RowStore::with_capacity(0).unwrap();
        let rows: Vec<Row> = (0..5)
            .map(|i| Row::kinematic(format!("2019-07-22 15:00:0{i}"), i as f64, 0.0, 0.0))
            .collect();
        for row in &rows {
            store.push(row).unwrap();
        }
        store.flush().unwrap();
        assert_eq!(store.iter().collect::<Vec<_>>(), rows);
    }
}
