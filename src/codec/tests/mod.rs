pub mod sensors;

use super::*;

fn sensor_value() -> DataTypeCode {
    DataType::SensorValue.code()
}

fn names(measurements: &[Measurement]) -> Vec<&str> {
    measurements.iter().map(|m| m.name.as_str()).collect()
}

#[test]
fn test_unsupported_data_type_rejected() {
    let payload = Payload::new(r#"{"temp":{"value":1.0}}"#);
    let result = decode(DataTypeCode(7), None, &payload);
    assert_eq!(result, Err(CodecError::UnsupportedDataType(7)));
}

#[test]
fn test_unsupported_data_type_checked_before_sensor_shape() {
    let payload = Payload::new("not json at all");
    let result = decode(DataTypeCode(-1), Some(SensorType::Bme280), &payload);
    assert_eq!(result, Err(CodecError::UnsupportedDataType(-1)));
}

#[test]
fn test_decode_is_idempotent() {
    let payload = Payload::new(
        r#"{"b":{"value":2.0,"unit":"V","unitName":"volt"},"a":{"value":1.0}}"#,
    );
    let first = decode(sensor_value(), None, &payload).unwrap();
    let second = decode(sensor_value(), None, &payload).unwrap();
    assert_eq!(first, second);

    let typed = Payload::new(r#"{"temperature":20.0,"humidity":40.0,"pressure":1000.0}"#);
    let first = decode(sensor_value(), Some(SensorType::Bme280), &typed).unwrap();
    let second = decode(sensor_value(), Some(SensorType::Bme280), &typed).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_sensor_type_selects_dedicated_decoder() {
    // A distance payload is not a valid generic payload, so this only passes
    // when the declared sensor type drives dispatch.
    let payload = Payload::new(r#"{"distance":42.5}"#);
    let measurements = decode(sensor_value(), Some(SensorType::HcSr04), &payload).unwrap();
    assert_eq!(names(&measurements), vec!["distance"]);
    assert!(decode(sensor_value(), None, &payload).is_err());
}
