use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::CodecError;
use crate::model::Measurement;

/// Decodes a raw payload of one known shape.
pub type Decoder = fn(&str) -> Result<Vec<Measurement>, CodecError>;

/// Sensors with a dedicated payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    #[serde(rename = "BME280")]
    Bme280,
    #[serde(rename = "BMP280")]
    Bmp280,
    #[serde(rename = "DHT22")]
    Dht22,
    #[serde(rename = "DS18B20")]
    Ds18b20,
    #[serde(rename = "HCSR04")]
    HcSr04,
    #[serde(rename = "BH1750")]
    Bh1750,
}

impl SensorType {
    pub const ALL: [SensorType; 6] = [
        SensorType::Bme280,
        SensorType::Bmp280,
        SensorType::Dht22,
        SensorType::Ds18b20,
        SensorType::HcSr04,
        SensorType::Bh1750,
    ];

    /// Wire identifier, also used as the `sensorType` tag value.
    pub fn as_str(self) -> &'static str {
        match self {
            SensorType::Bme280 => "BME280",
            SensorType::Bmp280 => "BMP280",
            SensorType::Dht22 => "DHT22",
            SensorType::Ds18b20 => "DS18B20",
            SensorType::HcSr04 => "HCSR04",
            SensorType::Bh1750 => "BH1750",
        }
    }

    /// Human label of the part.
    pub fn sensor_name(self) -> &'static str {
        match self {
            SensorType::HcSr04 => "HC-SR04",
            other => other.as_str(),
        }
    }

    /// Names this sensor always emits, in emission order.
    pub fn measurement_names(self) -> &'static [&'static str] {
        match self {
            SensorType::Bme280 => &[TEMPERATURE, HUMIDITY, PRESSURE],
            SensorType::Bmp280 => &[TEMPERATURE, PRESSURE],
            SensorType::Dht22 => &[TEMPERATURE, HUMIDITY],
            SensorType::Ds18b20 => &[TEMPERATURE],
            SensorType::HcSr04 => &[DISTANCE],
            SensorType::Bh1750 => &[ILLUMINANCE],
        }
    }

    pub fn decoder(self) -> Decoder {
        match self {
            SensorType::Bme280 => decode_bme280,
            SensorType::Bmp280 => decode_bmp280,
            SensorType::Dht22 => decode_dht22,
            SensorType::Ds18b20 => decode_ds18b20,
            SensorType::HcSr04 => decode_hcsr04,
            SensorType::Bh1750 => decode_bh1750,
        }
    }
}

const TEMPERATURE: &str = "temperature";
const HUMIDITY: &str = "humidity";
const PRESSURE: &str = "pressure";
const DISTANCE: &str = "distance";
const ILLUMINANCE: &str = "illuminance";

fn temperature(value: f64) -> Measurement {
    Measurement::new(TEMPERATURE, value, "°C", "celsius")
}

fn humidity(value: f64) -> Measurement {
    Measurement::new(HUMIDITY, value, "%", "percent")
}

fn pressure(value: f64) -> Measurement {
    Measurement::new(PRESSURE, value, "hPa", "hectopascal")
}

fn distance(value: f64) -> Measurement {
    Measurement::new(DISTANCE, value, "cm", "centimeter")
}

fn illuminance(value: f64) -> Measurement {
    Measurement::new(ILLUMINANCE, value, "lx", "lux")
}

fn parse<T: DeserializeOwned>(sensor: SensorType, payload: &str) -> Result<T, CodecError> {
    serde_json::from_str(payload).map_err(|e| CodecError::malformed(sensor.as_str(), e))
}

#[derive(Deserialize)]
struct Climate {
    temperature: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Deserialize)]
struct Barometric {
    temperature: f64,
    pressure: f64,
}

#[derive(Deserialize)]
struct Hygrometric {
    temperature: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct Thermometric {
    temperature: f64,
}

#[derive(Deserialize)]
struct Ranging {
    distance: f64,
}

#[derive(Deserialize)]
struct Luminous {
    illuminance: f64,
}

fn decode_bme280(payload: &str) -> Result<Vec<Measurement>, CodecError> {
    let p: Climate = parse(SensorType::Bme280, payload)?;
    Ok(vec![temperature(p.temperature), humidity(p.humidity), pressure(p.pressure)])
}

fn decode_bmp280(payload: &str) -> Result<Vec<Measurement>, CodecError> {
    let p: Barometric = parse(SensorType::Bmp280, payload)?;
    Ok(vec![temperature(p.temperature), pressure(p.pressure)])
}

fn decode_dht22(payload: &str) -> Result<Vec<Measurement>, CodecError> {
    let p: Hygrometric = parse(SensorType::Dht22, payload)?;
    Ok(vec![temperature(p.temperature), humidity(p.humidity)])
}

fn decode_ds18b20(payload: &str) -> Result<Vec<Measurement>, CodecError> {
    let p: Thermometric = parse(SensorType::Ds18b20, payload)?;
    Ok(vec![temperature(p.temperature)])
}

fn decode_hcsr04(payload: &str) -> Result<Vec<Measurement>, CodecError> {
    let p: Ranging = parse(SensorType::HcSr04, payload)?;
    Ok(vec![distance(p.distance)])
}

fn decode_bh1750(payload: &str) -> Result<Vec<Measurement>, CodecError> {
    let p: Luminous = parse(SensorType::Bh1750, payload)?;
    Ok(vec![illuminance(p.illuminance)])
}
