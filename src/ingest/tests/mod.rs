mod points;

use super::*;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use crate::codec::SensorType;
use crate::model::{DataTypeCode, MeasurementSubmission, Payload};
use crate::storage::{Cursor, StoreError};

/// Store double that records every batch it accepts.
#[derive(Default)]
pub struct RecordingStore {
    pub unhealthy: bool,
    pub fail_writes: bool,
    pub batches: Mutex<Vec<Vec<TimeSeriesPoint>>>,
    pub health_checks: Mutex<usize>,
}

impl RecordingStore {
    pub fn written(&self) -> usize {
        self.batches.lock().iter().map(Vec::len).sum()
    }
}

impl StoreClient for RecordingStore {
    fn health(&self) -> Health {
        *self.health_checks.lock() += 1;
        if self.unhealthy {
            Health::Unhealthy("health check failed".to_string())
        } else {
            Health::Healthy
        }
    }

    fn write_batch(&self, points: &[TimeSeriesPoint]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.batches.lock().push(points.to_vec());
        Ok(())
    }

    fn query(&self, _query: &str) -> Result<Box<dyn Cursor>, StoreError> {
        Err(StoreError::UnsupportedQuery("write-only test store".to_string()))
    }
}

pub fn measured_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn submission(data_type: i64, sensor_type: Option<SensorType>, payload: &str) -> MeasurementSubmission {
    MeasurementSubmission {
        device_id: "dev-1".to_string(),
        source: "garden".to_string(),
        data_type: DataTypeCode(data_type),
        sensor_type,
        payload: Payload::new(payload),
        measured_at: measured_at(),
    }
}

pub fn generic(payload: &str) -> MeasurementSubmission {
    submission(0, None, payload)
}
