//! Request and response types shared by the write and read paths

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::codec::SensorType;

/// Raw `dataType` code exactly as a device submitted it.
///
/// Kept as an integer so unknown codes survive body parsing and are rejected
/// by classification instead of by the JSON layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTypeCode(pub i64);

/// The closed set of data types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    SensorValue,
}

impl DataType {
    pub const SENSOR_VALUE_CODE: i64 = 0;

    pub fn code(self) -> DataTypeCode {
        match self {
            DataType::SensorValue => DataTypeCode(Self::SENSOR_VALUE_CODE),
        }
    }
}

impl TryFrom<DataTypeCode> for DataType {
    type Error = DataTypeCode;

    fn try_from(code: DataTypeCode) -> Result<Self, Self::Error> {
        match code.0 {
            Self::SENSOR_VALUE_CODE => Ok(DataType::SensorValue),
            _ => Err(code),
        }
    }
}

/// Opaque encoded payload of a submission.
///
/// Devices either send the payload as a JSON string holding the encoded
/// document, or embed the document directly. Both end up as the same raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(raw) => Ok(Payload(raw)),
            embedded => Ok(Payload(embedded.to_string())),
        }
    }
}

/// One reading submitted by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSubmission {
    pub device_id: String,
    pub source: String,
    pub data_type: DataTypeCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<SensorType>,
    pub payload: Payload,
    pub measured_at: DateTime<Utc>,
}

/// Ordered batch of submissions ingested as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestRequest {
    pub data: Vec<MeasurementSubmission>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IngestBody {
    Bare(Vec<MeasurementSubmission>),
    Wrapped { data: Vec<MeasurementSubmission> },
}

impl IngestRequest {
    pub fn new(data: Vec<MeasurementSubmission>) -> Self {
        Self { data }
    }

    /// Parses a request body, either a bare array of submissions or an
    /// object with a `data` array.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let data = match serde_json::from_slice(body)? {
            IngestBody::Bare(data) => data,
            IngestBody::Wrapped { data } => data,
        };
        Ok(Self { data })
    }
}

/// A single named scalar decoded from a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub unit_name: String,
}

impl Measurement {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        unit_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            unit_name: unit_name.into(),
        }
    }
}

/// Echo of a submission the pipeline accepted, with what it decoded to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedSubmission {
    pub device_id: String,
    pub source: String,
    pub data_type: DataTypeCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<SensorType>,
    pub payload: Payload,
    pub measured_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub measurements: Vec<Measurement>,
}

impl AcceptedSubmission {
    pub fn new(
        submission: &MeasurementSubmission,
        measurements: Vec<Measurement>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: submission.device_id.clone(),
            source: submission.source.clone(),
            data_type: submission.data_type,
            sensor_type: submission.sensor_type,
            payload: submission.payload.clone(),
            measured_at: submission.measured_at,
            received_at,
            measurements,
        }
    }
}

/// Range read for every measurement under one device/source pair.
///
/// `start` and `stop` are opaque range expressions handed to the store
/// verbatim; see [`crate::query::build_query`] for how they are combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadRequest {
    pub device_id: String,
    pub source: String,
    pub start: Option<String>,
    pub stop: Option<String>,
}

impl ReadRequest {
    pub fn new(device_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            source: source.into(),
            start: None,
            stop: None,
        }
    }

    pub fn with_range(mut self, start: Option<&str>, stop: Option<&str>) -> Self {
        self.start = start.map(str::to_string);
        self.stop = stop.map(str::to_string);
        self
    }
}
