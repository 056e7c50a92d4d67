
use super::*;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::storage::MemoryStore;

pub fn memory_service(config: Config) -> (DataService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(config.bucket.clone(), config.storage.clone()));
    let service = DataService::new(config, store.clone()).unwrap();
    (service, store)
}

/// A generic submission measured a few minutes ago.
pub fn generic_body(device_id: &str, source: &str, value: f64) -> String {
    let measured_at = (Utc::now() - chrono::TimeDelta::minutes(5)).to_rfc3339_opts(SecondsFormat::Millis, true);
    serde_json::json!([{
        "deviceId": device_id,
        "source": source,
        "dataType": 0,
        "payload": format!(r#"{{"temperature":{{"value":{},"unit":"°C","unitName":"celsius"}}}}"#, value),
        "measuredAt": measured_at,
    }])
    .to_string()
}

pub fn json(response: &ApiResponse) -> Value {
    serde_json::from_str(&response.body).unwrap()
}
