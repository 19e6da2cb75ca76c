//! End-to-end tests: files on disk in, cleaned files on disk out.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sensor_clean::config::{CleanerConfig, ProcessingConfig};
use sensor_clean::pipeline::{Cleaner, FileJob};
use sensor_clean::sensor::SensorType;
use std::fmt::Write as _;
use std::path::Path;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 7, 22)
        .unwrap()
        .and_hms_opt(15, 0, 0)
        .unwrap()
}

/// `count` samples at 100 Hz, the first at `.990` of its second.
fn write_regular_samples(path: &Path, count: u64, values: (f64, f64, f64)) {
    let base = start();
    let mut text = String::with_capacity(count as usize * 40);
    text.push_str("datetime,x,y,z\n");
    for i in 0..count {
        let ms = 990 + 10 * i as i64;
        let at = base + Duration::milliseconds(ms);
        writeln!(
            text,
            "{}.{:03},{},{},{}",
            at.format("%Y-%m-%d %H:%M:%S"),
            ms % 1000,
            values.0,
            values.1,
            values.2
        )
        .unwrap();
    }
    std::fs::write(path, text).unwrap();
}

fn read_output(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .unwrap();
    reader.records().map(|r| r.unwrap()).collect()
}

#[test]
fn test_million_samples_reduce_to_ten_thousand_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("phone.csv");
    let output = dir.path().join("phone_clean.csv");
    write_regular_samples(&input, 1_000_000, (0.25, -0.5, 1.0));

    let cleaner = Cleaner::new(ProcessingConfig {
        sample_rate_hz: Some(100.0),
        ..Default::default()
    });
    let summary = cleaner
        .process_file(&input, &output, SensorType::PhoneAccelerometer)
        .unwrap();

    assert_eq!(summary.rows_stored, 1_000_000);
    assert_eq!(summary.rows_skipped, 0);
    assert_eq!(summary.rows_written, 10_000);

    let records = read_output(&output);
    assert_eq!(records.len(), 10_000);
    assert_eq!(&records[0][0], "2019-07-22 15:00:00");
    assert_eq!(&records[9_999][0], "2019-07-22 17:46:39");
    for record in &records {
        assert_eq!(&record[2], "0.25");
        assert_eq!(&record[3], "-0.5");
        assert_eq!(&record[4], "1");
        assert_eq!(record.len(), 6);
    }
}

#[test]
fn test_epoch_column_counts_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("phone.csv");
    let output = dir.path().join("phone_clean.csv");
    write_regular_samples(&input, 1_000, (0.0, 0.0, 9.81));

    Cleaner::default()
        .process_file(&input, &output, SensorType::PhoneAccelerometer)
        .unwrap();

    let records = read_output(&output);
    assert_eq!(records.len(), 10);
    let first: i64 = records[0][1].parse().unwrap();
    assert_eq!(first, start().and_utc().timestamp());
    for (i, record) in records.iter().enumerate() {
        let epoch: i64 = record[1].parse().unwrap();
        assert_eq!(epoch, first + i as i64);
        assert_eq!(&record[5], "9.81");
    }
}

#[test]
fn test_gyroscope_total_is_rotation_angle() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gyro.csv");
    let output = dir.path().join("gyro_clean.csv");
    let half_turn = std::f64::consts::FRAC_PI_2;
    std::fs::write(
        &input,
        format!(
            "2020-01-01 00:00:00.000,0,0,{half_turn}\n\
             2020-01-01 00:00:00.500,0,0,{half_turn}\n\
             2020-01-01 00:00:01.000,0,0,0\n"
        ),
    )
    .unwrap();

    Cleaner::default()
        .process_file(&input, &output, SensorType::PhoneGyroscope)
        .unwrap();

    let records = read_output(&output);
    assert_eq!(records.len(), 1);
    let total: f64 = records[0][5].parse().unwrap();
    assert!((total - 90.0).abs() < 1e-3);
}

#[test]
fn test_batch_from_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let ax3 = dir.path().join("ax3.csv");
    let gps = dir.path().join("gps.csv");
    write_regular_samples(&ax3, 500, (0.0, 1.0, 0.0));
    std::fs::write(&gps, "time,lat,lon,alt,acc,speed\n2020-01-01 00:00:00,51.5,-0.1,30,5,0\n")
        .unwrap();

    let toml = format!(
        r#"
        [processing]
        sensor = "ax3"
        millisecond_epoch = true

        [[files]]
        input = "{}"

        [[files]]
        input = "{}"
        sensor = "gpslocation"
        "#,
        ax3.display(),
        gps.display()
    );
    let config_path = dir.path().join("cleaner.toml");
    std::fs::write(&config_path, toml).unwrap();

    let config = CleanerConfig::load_from(&config_path).unwrap();
    config.validate().unwrap();
    let jobs: Vec<FileJob> = config.jobs();
    let report = Cleaner::from_config(&config).run_batch(&jobs);

    assert!(report.is_success());
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.completed[0].rows_written, 5);
    // One sample in the opening second, then four full seconds of 100.
    let rate = report.completed[0].sample_rate_hz.unwrap();
    assert!((rate - 80.2).abs() < 1e-9);
    assert_eq!(report.completed[1].rows_written, 1);

    let gps_out = read_output(&dir.path().join("gps_clean.csv"));
    let epoch_ms = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis();
    assert_eq!(gps_out[0][1].parse::<i64>().unwrap(), epoch_ms);
    assert!(dir.path().join("ax3_clean_rate.txt").exists());
}
