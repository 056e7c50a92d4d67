use std::sync::Arc;
use parking_lot::RwLock;
use arrow::record_batch::RecordBatch;

/// One write's worth of rows in a partition, linked to the version it
/// superseded. Versions are never mutated once linked.
#[derive(Debug)]
pub struct Version {
    pub data: Arc<RecordBatch>,
    pub next: RwLock<Option<VersionRef>>,
}

pub type VersionRef = Arc<Version>;

impl Version {
    pub fn new(batch: RecordBatch) -> Self {
        Self {
            data: Arc::new(batch),
            next: RwLock::new(None),
        }
    }

    /// Walks the chain newest first.
    pub fn collect_all_batches(self: &Arc<Self>) -> Vec<Arc<RecordBatch>> {
        let mut batches = Vec::new();
        let mut current = Some(Arc::clone(self));

        while let Some(version) = current {
            if version.data.num_rows() > 0 {
                batches.push(Arc::clone(&version.data));
            }
            current = version.next.read().as_ref().map(Arc::clone);
        }

        batches
    }
}
