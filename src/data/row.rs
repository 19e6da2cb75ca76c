//! A single sample or aggregate: a timestamp and six numeric columns.
//!
//! Columns 0–2 hold the raw x, y, z readings of kinematic data and columns 3–5 the
//! processed ("cooked") versions of the same axes. Location data reuses the same layout
//! for latitude, longitude, altitude, accuracy and speed. The row does not know which
//! interpretation applies; a [`SensorType`] is supplied when it is formatted.
use crate::error::{AppResult, CleanError};
use crate::sensor::SensorType;
use chrono::NaiveDateTime;
use nalgebra::{Rotation3, Vector3};

/// Number of numeric columns in a row.
pub const COLUMNS: usize = 6;

/// Number of characters in a timestamp at whole-second resolution.
pub const SECOND_RESOLUTION_LEN: usize = 19;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Significant digits used for accelerometer and gyroscope values.
pub const KINEMATIC_PRECISION: usize = 6;

/// Significant digits used for location values.
pub const LOCATION_PRECISION: usize = 12;

/// Which half of a row's columns an axis index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Columns 0–2: values as read from the input file.
    Raw = 0,
    /// Columns 3–5: values derived from the raw columns.
    Cooked = 1,
}

impl DataType {
    /// Column index for `axis` (0, 1 or 2) within this half of the row.
    pub fn column(self, axis: usize) -> AppResult<usize> {
        if axis >= 3 {
            return Err(CleanError::ColumnOutOfRange(axis));
        }
        Ok(3 * self as usize + axis)
    }
}

/// Resolution of the epoch value written alongside each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpochResolution {
    /// Whole seconds, rounded half-up on the millisecond suffix.
    #[default]
    Seconds,
    /// Milliseconds since the epoch.
    Milliseconds,
}

/// One record: timestamp string plus six `f64` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    datetime: String,
    values: [f64; COLUMNS],
}

impl Default for Row {
    fn default() -> Self {
        Self {
            datetime: String::new(),
            values: [0.0; COLUMNS],
        }
    }
}

impl Row {
    /// Build a row from a timestamp and all six columns.
    pub fn new(datetime: impl Into<String>, values: [f64; COLUMNS]) -> Self {
        Self {
            datetime: datetime.into(),
            values,
        }
    }

    /// Build a kinematic row; the cooked columns start at zero.
    pub fn kinematic(datetime: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self::new(datetime, [x, y, z, 0.0, 0.0, 0.0])
    }

    /// Build a location row; the sixth column is unused and zero.
    pub fn location(
        datetime: impl Into<String>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        accuracy: f64,
        speed: f64,
    ) -> Self {
        Self::new(datetime, [latitude, longitude, altitude, accuracy, speed, 0.0])
    }

    /// Timestamp as stored.
    pub fn datetime(&self) -> &str {
        &self.datetime
    }

    /// All six columns.
    pub fn values(&self) -> &[f64; COLUMNS] {
        &self.values
    }

    /// The three axes of one half of the row.
    pub fn axes(&self, data_type: DataType) -> [f64; 3] {
        let base = 3 * data_type as usize;
        [self.values[base], self.values[base + 1], self.values[base + 2]]
    }

    /// Replace one axis value in one half of the row.
    pub fn put_value(&mut self, data_type: DataType, axis: usize, value: f64) -> AppResult<()> {
        let column = data_type.column(axis)?;
        self.values[column] = value;
        Ok(())
    }

    /// Whole seconds since the Unix epoch, ignoring any sub-second suffix.
    ///
    /// Timestamps are interpreted as UTC.
    pub fn epoch_seconds(&self) -> AppResult<i64> {
        parse_epoch_seconds(&self.datetime)
    }

    /// Millisecond component of the timestamp, 0 when there is none.
    ///
    /// One or two fractional digits are scaled up, so `.5` is 500 ms.
    pub fn millis(&self) -> u32 {
        let Some(fraction) = self.datetime.get(SECOND_RESOLUTION_LEN + 1..) else {
            return 0;
        };
        let digits: String = fraction.chars().take(3).collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return 0;
        }
        let mut millis: u32 = digits.parse().unwrap_or(0);
        for _ in digits.len()..3 {
            millis *= 10;
        }
        millis
    }

    /// Epoch value written to output files.
    ///
    /// At second resolution a sub-second part of 500 ms or more rounds up.
    pub fn epoch(&self, resolution: EpochResolution) -> AppResult<i64> {
        let seconds = self.epoch_seconds()?;
        let millis = i64::from(self.millis());
        Ok(match resolution {
            EpochResolution::Milliseconds => seconds * 1000 + millis,
            EpochResolution::Seconds if millis >= 500 => seconds + 1,
            EpochResolution::Seconds => seconds,
        })
    }

    /// Text fields for one output line: timestamp, epoch, then the sensor's columns.
    pub fn to_record(
        &self,
        sensor: SensorType,
        resolution: EpochResolution,
    ) -> AppResult<Vec<String>> {
        let mut fields = Vec::with_capacity(2 + 2 * 4);
        fields.push(self.datetime.clone());
        fields.push(self.epoch(resolution)?.to_string());

        if sensor.is_location() {
            // RAW and COOKED have no meaning here; the row is just five fields.
            fields.extend(
                self.values[..5]
                    .iter()
                    .map(|&v| format_significant(v, LOCATION_PRECISION)),
            );
        } else {
            self.push_axes(&mut fields, sensor, DataType::Raw);
            if sensor.has_baseline() {
                self.push_axes(&mut fields, sensor, DataType::Cooked);
            }
        }
        Ok(fields)
    }

    fn push_axes(&self, fields: &mut Vec<String>, sensor: SensorType, data_type: DataType) {
        let [x, y, z] = self.axes(data_type);
        fields.extend(
            [x, y, z]
                .iter()
                .map(|&v| format_significant(v, KINEMATIC_PRECISION)),
        );
        let total = if sensor.is_gyro() {
            total_rotation(x, y, z)
        } else {
            total_acceleration(x, y, z)
        };
        fields.push(format_significant(total, KINEMATIC_PRECISION));
    }
}

/// Parse the first 19 characters of a timestamp into whole seconds since the epoch.
pub fn parse_epoch_seconds(datetime: &str) -> AppResult<i64> {
    let head = datetime
        .get(..SECOND_RESOLUTION_LEN)
        .ok_or_else(|| CleanError::Timestamp(datetime.to_string()))?;
    NaiveDateTime::parse_from_str(head, DATETIME_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| CleanError::Timestamp(datetime.to_string()))
}

/// Timestamp truncated to whole-second resolution.
pub fn truncate_to_second(datetime: &str) -> &str {
    datetime.get(..SECOND_RESOLUTION_LEN).unwrap_or(datetime)
}

/// Magnitude of a three-axis acceleration.
pub fn total_acceleration(x: f64, y: f64, z: f64) -> f64 {
    Vector3::new(x, y, z).norm()
}

/// Total rotation angle in degrees of rotating by `x`, `y`, `z` radians about the
/// respective axes, applied in the order X, then Y, then Z.
pub fn total_rotation(x: f64, y: f64, z: f64) -> f64 {
    Rotation3::from_euler_angles(x, y, z).angle().to_degrees()
}

/// Render `value` with `precision` significant digits in the shortest general form:
/// fixed notation unless the exponent is below -4 or at least `precision`, trailing
/// zeros removed.
pub fn format_significant(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa = strip_trailing_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn strip_trailing_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
