use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampNanosecondArray};
use arrow::compute::kernels::cmp;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use log::debug;

use super::flux::{self, FluxQuery};
use super::scan_partitions::RowFilter;
use super::table::{MEASUREMENT_COLUMN, TAG_COLUMNS, TIME_COLUMN, VALUE_COLUMN};
use super::{
    ColumnMetadata, Cursor, Health, Record, ScalarValue, StorageConfig, StoreClient, StoreError,
    Table, TableMetadata,
};
use crate::ingest::point::VALUE_FIELD;
use crate::ingest::TimeSeriesPoint;

const RESULT_NAME: &str = "_result";

/// In-process [`StoreClient`] over a single bucket.
///
/// Evaluates the Flux subset documented in the `flux` module and shapes
/// results the way a Flux engine streams them: one table per series.
pub struct MemoryStore {
    bucket: String,
    table: Table,
    healthy: AtomicBool,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>, config: StorageConfig) -> Self {
        Self {
            bucket: bucket.into(),
            table: Table::new(config),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    fn points_to_batch(&self, points: &[TimeSeriesPoint]) -> Result<RecordBatch, StoreError> {
        let mut times = Vec::with_capacity(points.len());
        for point in points {
            times.push(point.timestamp_nanos().ok_or_else(|| {
                StoreError::InvalidTimestamp(format!("{} is outside the nanosecond range", point.timestamp))
            })?);
            if let Some(unknown) = point.tags.keys().find(|k| !TAG_COLUMNS.contains(&k.as_str())) {
                return Err(StoreError::SchemaMismatch(format!("Unknown tag {}", unknown)));
            }
        }

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(TimestampNanosecondArray::from(times)),
            Arc::new(StringArray::from_iter_values(points.iter().map(|p| p.measurement.as_str()))),
        ];
        for name in TAG_COLUMNS {
            let values: Vec<Option<&str>> = points.iter().map(|p| p.tag(name)).collect();
            let nullable = self.table.schema().field_with_name(name)?.is_nullable();
            if !nullable && values.iter().any(Option::is_none) {
                return Err(StoreError::SchemaMismatch(format!("Point is missing tag {}", name)));
            }
            columns.push(Arc::new(StringArray::from(values)));
        }
        columns.push(Arc::new(Float64Array::from_iter_values(points.iter().map(|p| p.value))));

        Ok(RecordBatch::try_new(self.table.schema().clone(), columns)?)
    }

    fn execute(&self, query: &FluxQuery, now: DateTime<Utc>) -> Result<MemoryCursor, StoreError> {
        if query.bucket != self.bucket {
            return Err(StoreError::BucketNotFound(query.bucket.clone()));
        }
        let start = query.start.resolve(now)?;
        let stop = match &query.stop {
            Some(stop) => stop.resolve(now)?,
            None => now,
        };
        if start >= stop {
            return Err(StoreError::UnsupportedQuery(format!(
                "Empty range: start {} is not before stop {}",
                start, stop
            )));
        }
        self.table.record_query();

        let filter = range_filter(start, stop, query.measurement.clone())?;
        let batches = self.table.scan_partitions(Some(start), Some(stop), Some(&filter))?;
        if batches.is_empty() {
            return Ok(MemoryCursor::new(Vec::new(), Vec::new()));
        }

        let combined = arrow::compute::concat_batches(self.table.schema(), &batches)?;
        let (tables, records) = shape_series(&combined, start, stop)?;
        debug!("query matched {} rows in {} tables", records.len(), tables.len());
        Ok(MemoryCursor::new(tables, records))
    }
}

impl StoreClient for MemoryStore {
    fn health(&self) -> Health {
        if self.is_healthy() {
            Health::Healthy
        } else {
            Health::Unhealthy("memory store marked unhealthy".to_string())
        }
    }

    fn write_batch(&self, points: &[TimeSeriesPoint]) -> Result<(), StoreError> {
        if !self.is_healthy() {
            return Err(StoreError::Unavailable("memory store marked unhealthy".to_string()));
        }
        let batch = self.points_to_batch(points)?;
        self.table.ingest(batch)
    }

    fn query(&self, query: &str) -> Result<Box<dyn Cursor>, StoreError> {
        let parsed = flux::parse(query)?;
        Ok(Box::new(self.execute(&parsed, Utc::now())?))
    }
}

/// `start <= _time < stop`, plus an exact `_measurement` match when given.
fn range_filter(
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    measurement: Option<String>,
) -> Result<RowFilter, StoreError> {
    let out_of_range = || StoreError::InvalidTimestamp("Range bound outside the nanosecond range".to_string());
    let start_ns = start.timestamp_nanos_opt().ok_or_else(out_of_range)?;
    let stop_ns = stop.timestamp_nanos_opt().ok_or_else(out_of_range)?;

    Ok(Box::new(move |batch: &RecordBatch| {
        let times = batch.column(0);
        let lower = cmp::gt_eq(times, &TimestampNanosecondArray::new_scalar(start_ns))?;
        let upper = cmp::lt(times, &TimestampNanosecondArray::new_scalar(stop_ns))?;
        let in_range = arrow::compute::and(&lower, &upper)?;
        match &measurement {
            Some(key) => {
                let matches = cmp::eq(batch.column(1), &StringArray::new_scalar(key.as_str()))?;
                arrow::compute::and(&in_range, &matches)
            }
            None => Ok(in_range),
        }
    }))
}

/// Group key of one series, in column order: measurement, then present tags.
type SeriesKey = Vec<(&'static str, String)>;

/// Splits matched rows into one table per series, ordered by group key,
/// rows ordered by time.
fn shape_series(
    batch: &RecordBatch,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
) -> Result<(Vec<TableMetadata>, Vec<Record>), StoreError> {
    let order = arrow_ord::sort::sort_to_indices(batch.column(0), None, None)?;
    let measurements = string_column(batch, MEASUREMENT_COLUMN)?;
    let tags = TAG_COLUMNS
        .iter()
        .map(|name| Ok((*name, string_column(batch, name)?)))
        .collect::<Result<Vec<_>, StoreError>>()?;
    let times = batch.column_by_name(TIME_COLUMN)
        .ok_or_else(|| StoreError::SchemaMismatch(format!("Missing column {}", TIME_COLUMN)))?;
    let values = batch.column_by_name(VALUE_COLUMN)
        .ok_or_else(|| StoreError::SchemaMismatch(format!("Missing column {}", VALUE_COLUMN)))?;

    let mut series: BTreeMap<SeriesKey, Vec<usize>> = BTreeMap::new();
    for row in order.values().iter().map(|&i| i as usize) {
        let mut key: SeriesKey = vec![(MEASUREMENT_COLUMN, measurements.value(row).to_string())];
        key.extend(
            tags.iter()
                .filter(|(_, column)| column.is_valid(row))
                .map(|(name, column)| (*name, column.value(row).to_string())),
        );
        series.entry(key).or_default().push(row);
    }

    let mut tables = Vec::with_capacity(series.len());
    let mut records = Vec::new();
    for (position, (key, rows)) in series.into_iter().enumerate() {
        let first = records.len();
        for row in rows {
            let mut values_by_column = BTreeMap::new();
            values_by_column.insert("result".to_string(), ScalarValue::from(RESULT_NAME));
            values_by_column.insert("table".to_string(), ScalarValue::Long(position as i64));
            values_by_column.insert("_start".to_string(), ScalarValue::from(start));
            values_by_column.insert("_stop".to_string(), ScalarValue::from(stop));
            values_by_column.insert(TIME_COLUMN.to_string(), ScalarValue::from_array(times.as_ref(), row)?);
            values_by_column.insert(VALUE_COLUMN.to_string(), ScalarValue::from_array(values.as_ref(), row)?);
            values_by_column.insert("_field".to_string(), ScalarValue::from(VALUE_FIELD));
            for (name, value) in &key {
                values_by_column.insert(name.to_string(), ScalarValue::from(value.as_str()));
            }
            records.push(Record { table_index: position, values: values_by_column });
        }
        tables.push(table_metadata(position, &key, records.get(first)));
    }

    Ok((tables, records))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, StoreError> {
    batch.column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::SchemaMismatch(format!("Missing string column {}", name)))
}

/// Column types follow the values of the table's first record.
fn table_metadata(position: usize, key: &SeriesKey, sample: Option<&Record>) -> TableMetadata {
    let mut columns = vec![
        ("result", false, RESULT_NAME),
        ("table", false, ""),
        ("_start", true, ""),
        ("_stop", true, ""),
        (TIME_COLUMN, false, ""),
        (VALUE_COLUMN, false, ""),
        ("_field", true, ""),
    ];
    columns.extend(key.iter().map(|(name, _)| (*name, true, "")));

    TableMetadata {
        position,
        columns: columns
            .into_iter()
            .enumerate()
            .map(|(index, (name, is_group_key, default_value))| ColumnMetadata {
                index,
                name: name.to_string(),
                data_type: sample
                    .and_then(|record| record.value(name))
                    .map_or("string", ScalarValue::flux_type)
                    .to_string(),
                is_group_key,
                default_value: default_value.to_string(),
            })
            .collect(),
    }
}

/// Pre-materialized result of a [`MemoryStore`] query.
#[derive(Debug)]
pub struct MemoryCursor {
    tables: Vec<TableMetadata>,
    records: Vec<Record>,
    position: Option<usize>,
}

impl MemoryCursor {
    pub fn new(tables: Vec<TableMetadata>, records: Vec<Record>) -> Self {
        Self { tables, records, position: None }
    }
}

impl Cursor for MemoryCursor {
    fn advance(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.records.len() {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.records.len());
            false
        }
    }

    fn table_changed(&self) -> bool {
        match self.position {
            Some(0) => !self.records.is_empty(),
            Some(p) if p < self.records.len() => {
                self.records[p].table_index != self.records[p - 1].table_index
            }
            _ => false,
        }
    }

    fn table_metadata(&self) -> Option<&TableMetadata> {
        self.record().and_then(|r| self.tables.get(r.table_index))
    }

    fn record(&self) -> Option<&Record> {
        self.position.and_then(|p| self.records.get(p))
    }

    fn err(&self) -> Option<&StoreError> {
        None
    }
}
