//! Sensor telemetry ingestion and time-series query translation.
//!
//! Devices submit encoded readings; [`ingest::IngestionPipeline`] decodes them
//! with [`codec`], turns every measurement into a tagged point and writes the
//! whole request to a [`storage::StoreClient`] as one batch. Reads go the other
//! way through [`query`]: a device/source range becomes a Flux query and the
//! store's streaming cursor is assembled into tables and records.

pub mod codec;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod query;
pub mod service;
pub mod storage;
