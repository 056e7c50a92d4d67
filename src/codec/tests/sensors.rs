use super::*;

fn sample_payload(sensor: SensorType) -> &'static str {
    match sensor {
        SensorType::Bme280 => r#"{"temperature":22.4,"humidity":48.1,"pressure":1013.2}"#,
        SensorType::Bmp280 => r#"{"temperature":19.0,"pressure":998.7}"#,
        SensorType::Dht22 => r#"{"temperature":25.3,"humidity":61.0}"#,
        SensorType::Ds18b20 => r#"{"temperature":-4.5}"#,
        SensorType::HcSr04 => r#"{"distance":120.7}"#,
        SensorType::Bh1750 => r#"{"illuminance":350}"#,
    }
}

#[test]
fn test_every_sensor_emits_its_full_named_set() {
    for sensor in SensorType::ALL {
        let measurements = sensor.decoder()(sample_payload(sensor)).unwrap();
        assert_eq!(
            names(&measurements),
            sensor.measurement_names().to_vec(),
            "sensor {:?}",
            sensor
        );
    }
}

#[test]
fn test_bme280_values_and_units() {
    let measurements = SensorType::Bme280.decoder()(sample_payload(SensorType::Bme280)).unwrap();

    assert_eq!(
        measurements,
        vec![
            Measurement::new("temperature", 22.4, "°C", "celsius"),
            Measurement::new("humidity", 48.1, "%", "percent"),
            Measurement::new("pressure", 1013.2, "hPa", "hectopascal"),
        ]
    );
}

#[test]
fn test_missing_field_never_yields_subset() {
    let result = SensorType::Bme280.decoder()(r#"{"temperature":22.4,"humidity":48.1}"#);
    match result {
        Err(CodecError::MalformedPayload { shape, reason }) => {
            assert_eq!(shape, "BME280");
            assert!(reason.contains("pressure"), "reason was {}", reason);
        }
        other => panic!("expected MalformedPayload, got {:?}", other),
    }
}

#[test]
fn test_extra_fields_are_ignored() {
    let measurements =
        SensorType::Ds18b20.decoder()(r#"{"temperature":5.0,"address":"28-0316a2"}"#).unwrap();
    assert_eq!(names(&measurements), vec!["temperature"]);
}

#[test]
fn test_wrong_type_is_malformed() {
    let result = SensorType::HcSr04.decoder()(r#"{"distance":"far"}"#);
    assert!(matches!(result, Err(CodecError::MalformedPayload { shape: "HCSR04", .. })));
}

#[test]
fn test_sensor_type_wire_names() {
    for sensor in SensorType::ALL {
        let wire = serde_json::to_string(&sensor).unwrap();
        assert_eq!(wire, format!("\"{}\"", sensor.as_str()));
        let parsed: SensorType = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed, sensor);
    }
    assert_eq!(SensorType::HcSr04.sensor_name(), "HC-SR04");
}
