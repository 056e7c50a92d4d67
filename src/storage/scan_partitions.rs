use arrow::array::BooleanArray;
use arrow::compute::filter_record_batch;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};

use crate::storage::{StoreError, Table};

/// Row mask computed per scanned batch.
pub type RowFilter = Box<dyn Fn(&RecordBatch) -> Result<BooleanArray, ArrowError> + Send + Sync>;

impl Table {
    /// Scans every partition overlapping `[min_time, max_time]`, newest
    /// version first, keeping the rows the filter selects. Batches left
    /// empty by the filter are dropped.
    ///
    /// Pruning and scanning share one snapshot of the partition map, so a
    /// concurrent ingest is seen whole or not at all.
    pub fn scan_partitions(
        &self,
        min_time: Option<DateTime<Utc>>,
        max_time: Option<DateTime<Utc>>,
        row_filter: Option<&RowFilter>,
    ) -> Result<Vec<RecordBatch>, StoreError> {
        let partitions = self.partitions();
        let mut results: Vec<RecordBatch> = Vec::new();

        for partition in partitions.values().filter(|p| p.overlaps(min_time, max_time)) {
            for batch in partition.current_version.collect_all_batches() {
                let selected = match row_filter {
                    Some(row_filter_func) => {
                        let mask = row_filter_func(batch.as_ref())?;
                        filter_record_batch(&batch, &mask)?
                    }
                    None => (*batch).clone(),
                };
                if selected.num_rows() > 0 {
                    results.push(selected);
                }
            }
        }

        Ok(results)
    }
}
