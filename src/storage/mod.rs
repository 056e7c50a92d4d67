//! Time-series store abstraction and the in-memory reference store
//!
//! The engine only talks to a store through [`StoreClient`] and the
//! forward-only [`Cursor`] it hands back for a query. [`MemoryStore`] is an
//! Arrow-backed implementation of both.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ingest::TimeSeriesPoint;

mod errors;
mod flux;
mod memory;
mod scalar_value;
mod scan_partitions;
mod table;
mod version;

#[cfg(test)]
mod tests;

pub use errors::StoreError;
pub use memory::{MemoryCursor, MemoryStore};
pub use scalar_value::ScalarValue;
pub use table::{Table, TableStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy(String),
}

/// Client of a time-series store.
///
/// Shared by every in-flight request, so implementations must tolerate
/// concurrent calls.
pub trait StoreClient: Send + Sync {
    fn health(&self) -> Health;

    /// Writes all points in one call; either all of them become durable or
    /// none do.
    fn write_batch(&self, points: &[TimeSeriesPoint]) -> Result<(), StoreError>;

    fn query(&self, query: &str) -> Result<Box<dyn Cursor>, StoreError>;
}

/// Single-pass, forward-only stream over a query result.
pub trait Cursor: Send {
    /// Moves to the next row. `false` once the stream is exhausted or failed.
    fn advance(&mut self) -> bool;

    /// Whether the current row opened a new table.
    fn table_changed(&self) -> bool;

    fn table_metadata(&self) -> Option<&TableMetadata>;

    fn record(&self) -> Option<&Record>;

    fn err(&self) -> Option<&StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub index: usize,
    pub name: String,
    pub data_type: String,
    pub is_group_key: bool,
    pub default_value: String,
}

/// Schema of one logical result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub position: usize,
    pub columns: Vec<ColumnMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub table_index: usize,
    pub values: BTreeMap<String, ScalarValue>,
}

impl Record {
    pub fn value(&self, column: &str) -> Option<&ScalarValue> {
        self.values.get(column)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionGranularity {
    Minute,
    #[default]
    Hour,
    Day,
    Month,
    Year,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub partition_granularity: PartitionGranularity,
}
