//! Time-series points and their construction from decoded measurements.
//!
//! Line Protocol format produced by [`TimeSeriesPoint::to_line_protocol`]:
//! ```text
//! measurement,tag1=val1,tag2=val2 value=<f64> timestamp_ns
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codec::SensorType;
use crate::model::Measurement;

/// Value of the `type` tag carried by every sensor reading.
pub const SENSOR_VALUE_TYPE: &str = "sensor_value";

/// `sensorName` of readings decoded without a declared sensor type.
pub const GENERIC_SENSOR_NAME: &str = "generic";

/// The single field every point carries.
pub const VALUE_FIELD: &str = "value";

pub mod tag {
    pub const DEVICE_ID: &str = "deviceId";
    pub const SOURCE: &str = "source";
    pub const TYPE: &str = "type";
    pub const NAME: &str = "name";
    pub const UNIT: &str = "unit";
    pub const UNIT_NAME: &str = "unitName";
    pub const SENSOR_NAME: &str = "sensorName";
    pub const SENSOR_TYPE: &str = "sensorType";
}

/// Store-side identifier of a device/source series family.
///
/// Written on every point and matched exactly on reads.
pub fn measurement_key(device_id: &str, source: &str) -> String {
    format!("{}/{}", device_id, source)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl TimeSeriesPoint {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// `None` when the timestamp does not fit in i64 nanoseconds.
    pub fn timestamp_nanos(&self) -> Option<i64> {
        self.timestamp.timestamp_nanos_opt()
    }

    /// Renders the point as one line of InfluxDB line protocol.
    ///
    /// Tags come out sorted by key and empty tags are left out. Returns
    /// `None` when the timestamp is outside the nanosecond range the
    /// protocol can carry, or when the measurement or a tag holds a line
    /// break, which no escape can represent.
    pub fn to_line_protocol(&self) -> Option<String> {
        let components = std::iter::once(&self.measurement)
            .chain(self.tags.iter().flat_map(|(key, value)| [key, value]));
        for component in components {
            if component.contains(['\n', '\r']) {
                return None;
            }
        }

        let mut line = escape_measurement(&self.measurement);
        for (key, value) in &self.tags {
            // Line protocol has no empty tag values
            if value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }
        line.push(' ');
        line.push_str(VALUE_FIELD);
        line.push('=');
        line.push_str(&self.value.to_string());
        line.push(' ');
        line.push_str(&self.timestamp_nanos()?.to_string());
        Some(line)
    }
}

/// Builds the points of one submission.
///
/// Tag construction is total: every point gets the device, source, type,
/// measurement name, units and sensor name; `sensorType` only when declared.
#[derive(Debug, Clone)]
pub struct PointBuilder<'a> {
    device_id: &'a str,
    source: &'a str,
    sensor_type: Option<SensorType>,
    timestamp: DateTime<Utc>,
}

impl<'a> PointBuilder<'a> {
    pub fn new(
        device_id: &'a str,
        source: &'a str,
        sensor_type: Option<SensorType>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id,
            source,
            sensor_type,
            timestamp,
        }
    }

    pub fn sensor_name(&self) -> &'static str {
        self.sensor_type
            .map_or(GENERIC_SENSOR_NAME, SensorType::sensor_name)
    }

    pub fn build(&self, measurement: &Measurement) -> TimeSeriesPoint {
        let mut tags = BTreeMap::new();
        tags.insert(tag::DEVICE_ID.to_string(), self.device_id.to_string());
        tags.insert(tag::SOURCE.to_string(), self.source.to_string());
        tags.insert(tag::TYPE.to_string(), SENSOR_VALUE_TYPE.to_string());
        tags.insert(tag::NAME.to_string(), measurement.name.clone());
        tags.insert(tag::UNIT.to_string(), measurement.unit.clone());
        tags.insert(tag::UNIT_NAME.to_string(), measurement.unit_name.clone());
        tags.insert(tag::SENSOR_NAME.to_string(), self.sensor_name().to_string());
        if let Some(sensor) = self.sensor_type {
            tags.insert(tag::SENSOR_TYPE.to_string(), sensor.as_str().to_string());
        }

        TimeSeriesPoint {
            measurement: measurement_key(self.device_id, self.source),
            tags,
            value: measurement.value,
            timestamp: self.timestamp,
        }
    }
}

/// Backslashes, spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace('\\', "\\\\").replace(',', "\\,").replace(' ', "\\ ")
}

/// Backslashes, commas, equals signs, and spaces must be escaped.
fn escape_tag(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
