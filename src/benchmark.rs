use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use log::info;
use rand::Rng;
use tsingest::codec::SensorType;
use tsingest::config::Config;
use tsingest::ingest::IngestionPipeline;
use tsingest::model::{DataType, IngestRequest, MeasurementSubmission, Payload, ReadRequest};
use tsingest::query::{DataReader, QueryTranslator};
use tsingest::storage::MemoryStore;

const NUM_SUBMISSIONS: usize = 100_000;
const NUM_DEVICES: usize = 50;
const SOURCES: [&str; 4] = ["garden", "attic", "garage", "cellar"];
const TIME_RANGE_SECS: i64 = 50 * 60; // Inside the default read window

pub fn run_benchmarks(config: Config) {
    println!("Running benchmarks with {} submissions...", NUM_SUBMISSIONS);

    let store = Arc::new(MemoryStore::new(config.bucket.clone(), config.storage.clone()));
    let pipeline = IngestionPipeline::new(store.clone());
    let reader = DataReader::new(store.clone(), QueryTranslator::new(config.bucket.clone()));

    let submissions = generate_submissions(Utc::now());

    let ingest_time = benchmark_ingest(&pipeline, &submissions);
    let query_time = benchmark_queries(&reader);

    let stats = store.table().stats();
    println!("\nBenchmark Results:");
    println!("-----------------");
    println!("Points stored: {}", stats.total_rows);
    println!("Write batches: {}", stats.write_count);
    println!("Memory usage: {} bytes", store.table().memory_usage());
    println!("Total ingest: {:.2}ms", ingest_time);
    println!("Total queries: {:.2}ms", query_time);
}

fn generate_submissions(now: DateTime<Utc>) -> Vec<MeasurementSubmission> {
    let mut rng = rand::rng();
    (0..NUM_SUBMISSIONS)
        .map(|_| {
            let device = rng.random_range(0..NUM_DEVICES);
            let source = SOURCES[rng.random_range(0..SOURCES.len())];
            let measured_at = now - TimeDelta::seconds(rng.random_range(0..TIME_RANGE_SECS));
            let (sensor_type, payload) = random_payload(&mut rng);
            MeasurementSubmission {
                device_id: format!("device-{:03}", device),
                source: source.to_string(),
                data_type: DataType::SensorValue.code(),
                sensor_type,
                payload: Payload::new(payload),
                measured_at,
            }
        })
        .collect()
}

fn random_payload(rng: &mut impl Rng) -> (Option<SensorType>, String) {
    let temperature = rng.random::<f64>() * 40.0 - 10.0;
    match rng.random_range(0..3) {
        0 => (
            Some(SensorType::Bme280),
            format!(
                r#"{{"temperature":{:.2},"humidity":{:.2},"pressure":{:.2}}}"#,
                temperature,
                rng.random::<f64>() * 100.0,
                950.0 + rng.random::<f64>() * 100.0
            ),
        ),
        1 => (
            Some(SensorType::Bh1750),
            format!(r#"{{"illuminance":{:.1}}}"#, rng.random::<f64>() * 10_000.0),
        ),
        _ => (
            None,
            format!(
                r#"{{"temperature":{{"value":{:.2},"unit":"°C","unitName":"celsius"}},"battery":{{"value":{:.2},"unit":"V","unitName":"volt"}}}}"#,
                temperature,
                3.0 + rng.random::<f64>()
            ),
        ),
    }
}

fn benchmark_ingest(pipeline: &IngestionPipeline, submissions: &[MeasurementSubmission]) -> f64 {
    println!("Ingesting submissions...");
    let start = Instant::now();

    // Each third of the data goes in at a different request size
    let batch_sizes = [10, 100, 1000];
    let part = submissions.len() / batch_sizes.len();
    for (i, &batch_size) in batch_sizes.iter().enumerate() {
        let batch_start = Instant::now();
        let mut written = 0;
        for chunk in submissions[i * part..(i + 1) * part].chunks(batch_size) {
            match pipeline.ingest(&IngestRequest::new(chunk.to_vec())) {
                Ok(outcome) => written += outcome.data.len(),
                Err(e) => println!("Request failed: {} ({})", e, e.reason()),
            }
        }
        let duration = batch_start.elapsed().as_secs_f64() * 1000.0;
        println!("Request size {}: {} submissions in {:.2}ms", batch_size, written, duration);
    }

    let total_duration = start.elapsed().as_secs_f64() * 1000.0;
    info!("ingest completed in {:.2}ms", total_duration);
    total_duration
}

fn benchmark_queries(reader: &DataReader) -> f64 {
    println!("\nRunning query benchmarks...");
    let start = Instant::now();

    let cases = [
        ("Default window", None, None),
        ("Last 10 minutes", Some("-10m"), None),
        ("Bounded window", Some("-40m"), Some("-20m")),
    ];
    for (label, range_start, range_stop) in cases {
        let query_start = Instant::now();
        let mut records = 0;
        let mut tables = 0;
        for device in 0..NUM_DEVICES {
            let request = ReadRequest::new(format!("device-{:03}", device), SOURCES[device % SOURCES.len()])
                .with_range(range_start, range_stop);
            match reader.read(&request) {
                Ok(response) => {
                    records += response.records.len();
                    tables += response.tables.len();
                }
                Err(e) => println!("Query failed: {} ({})", e, e.reason()),
            }
        }
        let duration = query_start.elapsed().as_secs_f64() * 1000.0;
        println!(
            "{}: {} tables, {} records over {} reads in {:.2}ms",
            label, tables, records, NUM_DEVICES, duration
        );
    }

    start.elapsed().as_secs_f64() * 1000.0
}
