//! Benchmarks for payload decoding and the write path against the memory store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use tsingest::codec::{self, SensorType};
use tsingest::ingest::IngestionPipeline;
use tsingest::model::{DataType, IngestRequest, MeasurementSubmission, Payload};
use tsingest::storage::{MemoryStore, StorageConfig};

const BME280_PAYLOAD: &str = r#"{"temperature":21.5,"humidity":40.2,"pressure":1013.25}"#;
const GENERIC_PAYLOAD: &str = r#"{"temperature":{"value":21.5,"unit":"°C","unitName":"celsius"},"battery":{"value":3.7,"unit":"V","unitName":"volt"},"rssi":{"value":-67.0}}"#;

fn submission(i: usize) -> MeasurementSubmission {
    let (sensor_type, payload) = if i % 2 == 0 {
        (Some(SensorType::Bme280), BME280_PAYLOAD)
    } else {
        (None, GENERIC_PAYLOAD)
    };
    MeasurementSubmission {
        device_id: format!("device-{}", i % 16),
        source: "bench".to_string(),
        data_type: DataType::SensorValue.code(),
        sensor_type,
        payload: Payload::new(payload),
        measured_at: Utc.timestamp_opt(1_704_067_200 + i as i64, 0).unwrap(),
    }
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let code = DataType::SensorValue.code();

    let typed = Payload::new(BME280_PAYLOAD);
    group.bench_function("bme280", |b| {
        b.iter(|| codec::decode(code, Some(SensorType::Bme280), black_box(&typed)))
    });

    let generic = Payload::new(GENERIC_PAYLOAD);
    group.bench_function("generic", |b| {
        b.iter(|| codec::decode(code, None, black_box(&generic)))
    });

    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for size in [1, 10, 100, 1000] {
        let request = IngestRequest::new((0..size).map(submission).collect());
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("memory_store", size), &request, |b, request| {
            // Each batch writes into an empty store so partitions do not grow across samples
            b.iter_batched(
                || IngestionPipeline::new(Arc::new(MemoryStore::new("telemetry", StorageConfig::default()))),
                |pipeline| pipeline.ingest(black_box(request)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_ingest);
criterion_main!(benches);
