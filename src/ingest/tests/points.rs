use super::*;
use crate::model::Measurement;

fn celsius(value: f64) -> Measurement {
    Measurement::new("temperature", value, "°C", "celsius")
}

#[test]
fn test_point_tags_for_typed_sensor() {
    let builder = PointBuilder::new("dev-1", "garden", Some(SensorType::HcSr04), measured_at());
    let point = builder.build(&Measurement::new("distance", 12.0, "cm", "centimeter"));

    assert_eq!(point.measurement, "dev-1/garden");
    assert_eq!(point.value, 12.0);
    assert_eq!(point.timestamp, measured_at());
    assert_eq!(point.tag("deviceId"), Some("dev-1"));
    assert_eq!(point.tag("source"), Some("garden"));
    assert_eq!(point.tag("type"), Some("sensor_value"));
    assert_eq!(point.tag("name"), Some("distance"));
    assert_eq!(point.tag("unit"), Some("cm"));
    assert_eq!(point.tag("unitName"), Some("centimeter"));
    assert_eq!(point.tag("sensorName"), Some("HC-SR04"));
    assert_eq!(point.tag("sensorType"), Some("HCSR04"));
}

#[test]
fn test_generic_point_has_no_sensor_type() {
    let point = PointBuilder::new("dev-1", "garden", None, measured_at()).build(&celsius(1.0));
    assert_eq!(point.tag("sensorName"), Some("generic"));
    assert_eq!(point.tag("sensorType"), None);
    assert_eq!(point.tags.len(), 7);
}

#[test]
fn test_measurement_key() {
    assert_eq!(measurement_key("a", "b"), "a/b");
}

#[test]
fn test_line_protocol() {
    let point = PointBuilder::new("dev 1", "a,b", None, measured_at()).build(&celsius(21.5));
    let line = point.to_line_protocol().unwrap();

    assert!(line.starts_with(r"dev\ 1/a\,b,deviceId=dev\ 1,name=temperature,"));
    assert!(line.contains(r",source=a\,b,"));
    assert!(line.ends_with(&format!(" value=21.5 {}", measured_at().timestamp_nanos_opt().unwrap())));
}

#[test]
fn test_line_protocol_skips_empty_tags() {
    let point = PointBuilder::new("dev-1", "s", None, measured_at())
        .build(&Measurement::new("count", 3.0, "", ""));
    let line = point.to_line_protocol().unwrap();
    assert!(!line.contains("unit="));
    assert!(!line.contains("unitName="));
}

#[test]
fn test_line_protocol_rejects_out_of_range_timestamp() {
    let far = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
    let point = PointBuilder::new("dev-1", "s", None, far).build(&celsius(1.0));
    assert_eq!(point.to_line_protocol(), None);
}

#[test]
fn test_line_protocol_escapes_backslashes() {
    let point = PointBuilder::new(r"dev\", "s", None, measured_at()).build(&celsius(1.0));
    let line = point.to_line_protocol().unwrap();

    assert!(line.starts_with(r"dev\\/s,deviceId=dev\\,name=temperature,"));
}

#[test]
fn test_line_protocol_rejects_line_breaks() {
    let point = PointBuilder::new("dev\n1", "s", None, measured_at()).build(&celsius(1.0));
    assert_eq!(point.to_line_protocol(), None);

    let point = PointBuilder::new("dev-1", "s", None, measured_at())
        .build(&Measurement::new("temperature", 1.0, "C\r", "celsius"));
    assert_eq!(point.to_line_protocol(), None);
}
