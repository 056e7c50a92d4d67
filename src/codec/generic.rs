//! Fallback decoder for payloads without a declared sensor type.
//!
//! The payload is an object mapping a measurement name to
//! `{"value": <number>, "unit": "...", "unitName": "..."}`. The reserved
//! [`RESERVED_SENSOR_KEY`] entry carries sensor metadata and is skipped.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::CodecError;
use crate::model::Measurement;

pub const RESERVED_SENSOR_KEY: &str = "sensor";

const SHAPE: &str = "generic";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenericValue {
    value: f64,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    unit_name: String,
}

/// Emits one measurement per non-reserved key, in ascending key order.
pub fn decode(payload: &str) -> Result<Vec<Measurement>, CodecError> {
    let entries: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(payload).map_err(|e| CodecError::malformed(SHAPE, e))?;

    entries
        .into_iter()
        .filter(|(name, _)| name != RESERVED_SENSOR_KEY)
        .map(|(name, raw)| {
            let value: GenericValue = serde_json::from_value(raw)
                .map_err(|e| CodecError::malformed(SHAPE, format!("field `{}`: {}", name, e)))?;
            Ok(Measurement {
                name,
                value: value.value,
                unit: value.unit,
                unit_name: value.unit_name,
            })
        })
        .collect()
}
