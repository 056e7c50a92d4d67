use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{Array, TimestampNanosecondArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Datelike, Timelike, Utc};
use parking_lot::Mutex;

use super::version::{Version, VersionRef};
use super::{PartitionGranularity, StorageConfig, StoreError};
use crate::ingest::point::tag;

pub const TIME_COLUMN: &str = "_time";
pub const MEASUREMENT_COLUMN: &str = "_measurement";
pub const VALUE_COLUMN: &str = "_value";

/// Tag columns in schema order. `sensorType` is the only nullable one.
pub const TAG_COLUMNS: [&str; 8] = [
    tag::DEVICE_ID,
    tag::SOURCE,
    tag::TYPE,
    tag::NAME,
    tag::UNIT,
    tag::UNIT_NAME,
    tag::SENSOR_NAME,
    tag::SENSOR_TYPE,
];

/// Fixed layout of stored points: time, measurement key, tags, value.
pub fn point_schema() -> SchemaRef {
    let mut fields = vec![
        Field::new(TIME_COLUMN, DataType::Timestamp(TimeUnit::Nanosecond, None), false),
        Field::new(MEASUREMENT_COLUMN, DataType::Utf8, false),
    ];
    fields.extend(
        TAG_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, *name == tag::SENSOR_TYPE)),
    );
    fields.push(Field::new(VALUE_COLUMN, DataType::Float64, false));
    Arc::new(Schema::new(fields))
}

#[derive(Clone)]
pub struct Partition {
    pub current_version: VersionRef,
    min_time: DateTime<Utc>,
    max_time: DateTime<Utc>,
}

impl Partition {
    fn empty(schema: SchemaRef) -> Self {
        Self {
            current_version: Arc::new(Version::new(RecordBatch::new_empty(schema))),
            min_time: DateTime::<Utc>::MAX_UTC,
            max_time: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Whether any row may fall inside `[min_time, max_time]`.
    pub fn overlaps(&self, min_time: Option<DateTime<Utc>>, max_time: Option<DateTime<Utc>>) -> bool {
        let matches_min = min_time.map_or(true, |min| self.max_time >= min);
        let matches_max = max_time.map_or(true, |max| self.min_time <= max);
        matches_min && matches_max
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableStats {
    pub total_rows: usize,
    pub write_count: usize,
    pub query_count: usize,
}

/// Time-partitioned, append-only point table.
///
/// Each ingest links a new version in front of every partition it touches.
/// All of those links happen under one lock, so a reader sees either the
/// whole batch or none of it.
pub struct Table {
    schema: SchemaRef,
    state: Mutex<TableState>,
    config: StorageConfig,
}

struct TableState {
    partitions: BTreeMap<String, Partition>,
    memory_usage: usize,
    stats: TableStats,
}

/// Rows of an incoming batch bound for one partition.
struct Staged {
    key: String,
    batch: RecordBatch,
    min_time: DateTime<Utc>,
    max_time: DateTime<Utc>,
}

impl Table {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            schema: point_schema(),
            state: Mutex::new(TableState {
                partitions: BTreeMap::new(),
                memory_usage: 0,
                stats: TableStats::default(),
            }),
            config,
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn memory_usage(&self) -> usize {
        self.state.lock().memory_usage
    }

    pub fn stats(&self) -> TableStats {
        self.state.lock().stats.clone()
    }

    pub fn partitions(&self) -> BTreeMap<String, Partition> {
        self.state.lock().partitions.clone()
    }

    pub(crate) fn record_query(&self) {
        self.state.lock().stats.query_count += 1;
    }

    /// Returns partition keys for partitions that overlap with the given time range
    pub fn relevant_partitions(
        &self,
        min_time: Option<DateTime<Utc>>,
        max_time: Option<DateTime<Utc>>,
    ) -> Vec<String> {
        let state = self.state.lock();
        state.partitions.iter()
            .filter(|(_, partition)| partition.overlaps(min_time, max_time))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn ingest(&self, batch: RecordBatch) -> Result<(), StoreError> {
        if batch.schema().as_ref() != self.schema.as_ref() {
            return Err(StoreError::SchemaMismatch(
                "Batch schema does not match table schema".to_string(),
            ));
        }
        if batch.num_rows() == 0 {
            return Ok(());
        }

        // Split the batch outside the lock
        let mut staged = Vec::new();
        for (key, row_indices) in extract_partition_keys(&batch, &self.config.partition_granularity)? {
            let indices = UInt32Array::from(row_indices);
            let columns: Vec<_> = batch.columns()
                .iter()
                .map(|col| arrow::compute::take(col.as_ref(), &indices, None))
                .collect::<Result<_, _>>()?;
            let partition_batch = RecordBatch::try_new(batch.schema(), columns)?;
            let (min_time, max_time) = time_bounds(&partition_batch)?;
            staged.push(Staged { key, batch: partition_batch, min_time, max_time });
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        for Staged { key, batch, min_time, max_time } in staged {
            let rows = batch.num_rows();
            let size = batch.get_array_memory_size();

            let partition = state.partitions
                .entry(key)
                .or_insert_with(|| Partition::empty(self.schema.clone()));
            partition.min_time = partition.min_time.min(min_time);
            partition.max_time = partition.max_time.max(max_time);

            let new_version = Arc::new(Version::new(batch));
            let old_current = std::mem::replace(&mut partition.current_version, new_version.clone());
            *new_version.next.write() = Some(old_current);

            state.memory_usage += size;
            state.stats.total_rows += rows;
        }
        state.stats.write_count += 1;

        Ok(())
    }
}

fn timestamps(batch: &RecordBatch) -> Result<&TimestampNanosecondArray, StoreError> {
    batch.column(0)
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
        .ok_or(StoreError::InvalidTimestamp("First column must be timestamp".to_string()))
}

fn partition_key(dt: DateTime<Utc>, granularity: &PartitionGranularity) -> String {
    match granularity {
        PartitionGranularity::Minute => format!("{}-{:02}-{:02}T{:02}:{:02}", dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute()),
        PartitionGranularity::Hour => format!("{}-{:02}-{:02}T{:02}", dt.year(), dt.month(), dt.day(), dt.hour()),
        PartitionGranularity::Day => format!("{}-{:02}-{:02}", dt.year(), dt.month(), dt.day()),
        PartitionGranularity::Month => format!("{}-{:02}", dt.year(), dt.month()),
        PartitionGranularity::Year => dt.year().to_string(),
    }
}

fn extract_partition_keys(
    batch: &RecordBatch,
    granularity: &PartitionGranularity,
) -> Result<BTreeMap<String, Vec<u32>>, StoreError> {
    let times = timestamps(batch)?;
    if times.null_count() > 0 {
        return Err(StoreError::InvalidTimestamp("Null timestamp in batch".to_string()));
    }

    let mut partitions_map: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for (row_idx, ts) in times.values().iter().enumerate() {
        let key = partition_key(DateTime::from_timestamp_nanos(*ts), granularity);
        partitions_map.entry(key).or_default().push(row_idx as u32);
    }

    Ok(partitions_map)
}

fn time_bounds(batch: &RecordBatch) -> Result<(DateTime<Utc>, DateTime<Utc>), StoreError> {
    let times = timestamps(batch)?;
    let min = arrow::compute::min(times)
        .ok_or(StoreError::InvalidTimestamp("Empty partition batch".to_string()))?;
    let max = arrow::compute::max(times)
        .ok_or(StoreError::InvalidTimestamp("Empty partition batch".to_string()))?;
    Ok((DateTime::from_timestamp_nanos(min), DateTime::from_timestamp_nanos(max)))
}
