//! Payload decoding: turns a raw submission payload into named measurements.
//!
//! Decoding is pure. A declared [`SensorType`] selects a fixed decoder for that
//! sensor's payload shape; without one the [`generic`] decoder is used.

use crate::model::{DataType, DataTypeCode, Measurement, Payload};

pub mod generic;
mod sensors;

#[cfg(test)]
mod tests;

pub use sensors::{Decoder, SensorType};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(i64),
    #[error("Malformed {shape} payload: {reason}")]
    MalformedPayload { shape: &'static str, reason: String },
}

impl CodecError {
    pub(crate) fn malformed(shape: &'static str, err: impl std::fmt::Display) -> Self {
        CodecError::MalformedPayload {
            shape,
            reason: err.to_string(),
        }
    }
}

/// Decodes one submission payload into its measurements.
pub fn decode(
    data_type: DataTypeCode,
    sensor_type: Option<SensorType>,
    payload: &Payload,
) -> Result<Vec<Measurement>, CodecError> {
    match DataType::try_from(data_type) {
        Ok(DataType::SensorValue) => {}
        Err(code) => return Err(CodecError::UnsupportedDataType(code.0)),
    }

    let decoder = match sensor_type {
        Some(sensor) => sensor.decoder(),
        None => generic::decode,
    };
    decoder(payload.as_str())
}
