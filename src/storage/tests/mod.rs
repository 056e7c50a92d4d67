mod errors;

use super::*;
use chrono::{DateTime, TimeZone, Utc};

use crate::codec::SensorType;
use crate::ingest::PointBuilder;
use crate::model::Measurement;

/// 2023-11-14T22:13:20Z
pub const T0: i64 = 1_700_000_000;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn test_store() -> MemoryStore {
    MemoryStore::new("telemetry", StorageConfig::default())
}

pub fn point(device_id: &str, source: &str, name: &str, value: f64, secs: i64) -> TimeSeriesPoint {
    PointBuilder::new(device_id, source, Some(SensorType::Bme280), at(secs))
        .build(&Measurement::new(name, value, "°C", "celsius"))
}

pub fn range_query(measurement: &str, start: i64, stop: i64) -> String {
    format!(
        r#"from(bucket:"telemetry") |> range(start: {}, stop: {}) |> filter(fn: (r) => r._measurement == "{}")"#,
        start, stop, measurement
    )
}

pub fn drain(cursor: &mut dyn Cursor) -> Vec<(bool, Record)> {
    let mut rows = Vec::new();
    while cursor.advance() {
        rows.push((cursor.table_changed(), cursor.record().unwrap().clone()));
    }
    assert!(cursor.err().is_none());
    rows
}
