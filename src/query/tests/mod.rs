
use std::collections::BTreeMap;

use super::*;
use crate::storage::{ColumnMetadata, Cursor, Record, ScalarValue, StoreError, TableMetadata};

pub enum Step {
    Row { changed: bool, table: usize, value: f64 },
    Fail(&'static str),
}

/// Cursor that replays a fixed script of rows and failures.
pub struct ScriptedCursor {
    steps: Vec<Step>,
    tables: Vec<TableMetadata>,
    position: Option<usize>,
    record: Option<Record>,
    error: Option<StoreError>,
    advances: usize,
}

impl ScriptedCursor {
    pub fn new(steps: Vec<Step>) -> Self {
        let table_count = steps
            .iter()
            .filter_map(|s| match s {
                Step::Row { table, .. } => Some(table + 1),
                Step::Fail(_) => None,
            })
            .max()
            .unwrap_or(0);
        Self {
            steps,
            tables: (0..table_count).map(table).collect(),
            position: None,
            record: None,
            error: None,
            advances: 0,
        }
    }

    /// Number of `advance` calls made so far, including ones after a failure.
    pub fn advances(&self) -> usize {
        self.advances
    }
}

impl Cursor for ScriptedCursor {
    fn advance(&mut self) -> bool {
        self.advances += 1;
        if self.error.is_some() {
            return false;
        }
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next);
        self.record = None;
        match self.steps.get(next) {
            Some(Step::Row { table, value, .. }) => {
                self.record = Some(record(*table, *value));
                true
            }
            Some(Step::Fail(message)) => {
                self.error = Some(StoreError::Unavailable(message.to_string()));
                false
            }
            None => false,
        }
    }

    fn table_changed(&self) -> bool {
        match self.position.and_then(|p| self.steps.get(p)) {
            Some(Step::Row { changed, .. }) => *changed,
            _ => false,
        }
    }

    fn table_metadata(&self) -> Option<&TableMetadata> {
        self.record.as_ref().and_then(|r| self.tables.get(r.table_index))
    }

    fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    fn err(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }
}

pub fn table(position: usize) -> TableMetadata {
    TableMetadata {
        position,
        columns: vec![ColumnMetadata {
            index: 0,
            name: "_value".to_string(),
            data_type: "double".to_string(),
            is_group_key: false,
            default_value: String::new(),
        }],
    }
}

pub fn record(table_index: usize, value: f64) -> Record {
    let mut values = BTreeMap::new();
    values.insert("_value".to_string(), ScalarValue::Double(value));
    Record { table_index, values }
}

pub fn row(changed: bool, table: usize, value: f64) -> Step {
    Step::Row { changed, table, value }
}
