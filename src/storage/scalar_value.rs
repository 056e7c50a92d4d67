use arrow::array::{Array, Float64Array, StringArray, TimestampNanosecondArray};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::StoreError;

/// A single cell of a query result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Long(i64),
    Double(f64),
    String(String),
    Time(DateTime<Utc>),
}

impl ScalarValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Double(v) => Some(*v),
            ScalarValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Flux annotation name of the value's column type.
    pub fn flux_type(&self) -> &'static str {
        match self {
            ScalarValue::Null | ScalarValue::String(_) => "string",
            ScalarValue::Long(_) => "long",
            ScalarValue::Double(_) => "double",
            ScalarValue::Time(_) => "dateTime:RFC3339",
        }
    }

    /// Reads row `row` of a string, float or nanosecond-timestamp column.
    pub fn from_array(array: &dyn Array, row: usize) -> Result<Self, StoreError> {
        if array.is_null(row) {
            return Ok(ScalarValue::Null);
        }
        let any = array.as_any();
        if let Some(strings) = any.downcast_ref::<StringArray>() {
            return Ok(ScalarValue::String(strings.value(row).to_string()));
        }
        if let Some(floats) = any.downcast_ref::<Float64Array>() {
            return Ok(ScalarValue::Double(floats.value(row)));
        }
        if let Some(times) = any.downcast_ref::<TimestampNanosecondArray>() {
            return Ok(ScalarValue::Time(DateTime::from_timestamp_nanos(times.value(row))));
        }
        Err(StoreError::SchemaMismatch(format!(
            "Unsupported column type {}",
            array.data_type()
        )))
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<DateTime<Utc>> for ScalarValue {
    fn from(t: DateTime<Utc>) -> Self {
        ScalarValue::Time(t)
    }
}
