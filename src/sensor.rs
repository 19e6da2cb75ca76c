//! Sensor types and how their rows are interpreted.
use crate::error::CleanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of data held in an input file.
///
/// The same six-column row layout is used for all of them; the sensor type decides how the
/// columns are labelled and formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    /// OpenMovement AX3 accelerometer: constant sample rate, baseline filtered.
    #[serde(rename = "ax3")]
    Ax3Accelerometer,
    /// Phone accelerometer: variable sample rate.
    #[serde(rename = "accelerometer")]
    PhoneAccelerometer,
    /// Phone gyroscope: variable sample rate, angles in radians.
    #[serde(rename = "gyroscope")]
    PhoneGyroscope,
    /// Phone location fixes.
    #[serde(rename = "location")]
    Location,
    /// GPS location fixes.
    #[serde(rename = "gpslocation")]
    GpsLocation,
}

const NAMES: [(&str, SensorType); 5] = [
    ("accelerometer", SensorType::PhoneAccelerometer),
    ("ax3", SensorType::Ax3Accelerometer),
    ("gpslocation", SensorType::GpsLocation),
    ("gyroscope", SensorType::PhoneGyroscope),
    ("location", SensorType::Location),
];

const LOCATION_HEADER: &str = "datetime, epoch, latitude, longitude, altitude, accuracy, speed";
const KINETIC_HEADER: &str = "datetime, epoch, x, y, z, total";
const KINETIC_PLUS_HEADER: &str =
    "datetime, epoch, x, y, z, total, xfilt, yfilt, zfilt, totalfilt";

impl SensorType {
    /// Comma-separated list of the accepted sensor names.
    pub fn known_sensors() -> String {
        NAMES
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Configuration name of this sensor type.
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, ty)| *ty == self)
            .map_or("unknown", |(name, _)| *name)
    }

    /// True for phone gyroscope data.
    pub fn is_gyro(self) -> bool {
        self == SensorType::PhoneGyroscope
    }

    /// True for AX3 and phone accelerometer data.
    pub fn is_acceleration(self) -> bool {
        matches!(
            self,
            SensorType::Ax3Accelerometer | SensorType::PhoneAccelerometer
        )
    }

    /// True for location data of either kind.
    pub fn is_location(self) -> bool {
        !(self.is_gyro() || self.is_acceleration())
    }

    /// Whether the baseline filter runs for this sensor.
    ///
    /// Only the AX3 samples at a constant rate; phone data does not.
    pub fn has_baseline(self) -> bool {
        self == SensorType::Ax3Accelerometer
    }

    /// Whether rows are averaged per second, as opposed to passed through.
    pub fn is_aggregated(self) -> bool {
        !self.is_location()
    }

    /// Number of numeric fields following the timestamp in an input record.
    pub fn input_fields(self) -> usize {
        if self.is_location() {
            5
        } else {
            3
        }
    }

    /// Column heading line for output files, without line terminator.
    pub fn heading(self) -> &'static str {
        match self {
            SensorType::PhoneGyroscope | SensorType::PhoneAccelerometer => KINETIC_HEADER,
            SensorType::Ax3Accelerometer => KINETIC_PLUS_HEADER,
            SensorType::Location | SensorType::GpsLocation => LOCATION_HEADER,
        }
    }
}

impl FromStr for SensorType {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        NAMES
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, ty)| *ty)
            .ok_or_else(|| CleanError::UnknownSensor {
                name: s.to_string(),
                known: Self::known_sensors(),
            })
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
