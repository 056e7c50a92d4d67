//! Turns a streaming store cursor into an ordered table and record list.

use log::{debug, error};
use serde::Serialize;

use crate::error::Error;
use crate::storage::{Cursor, Record, TableMetadata};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadResponse {
    pub tables: Vec<TableMetadata>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Start,
    Row,
    Exhausted,
    Errored,
}

/// What one `advance` of the cursor produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorEvent {
    TableBoundary,
    SameTable,
    Exhausted,
    Errored,
}

#[derive(Debug)]
pub struct ResultAssembler {
    state: CursorState,
    response: ReadResponse,
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAssembler {
    pub fn new() -> Self {
        Self {
            state: CursorState::Start,
            response: ReadResponse::default(),
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Advances the cursor once and classifies the result.
    ///
    /// The first row after `Start` always opens a table, whatever the
    /// cursor's own flag says.
    fn next_event(&self, cursor: &mut dyn Cursor) -> CursorEvent {
        let advanced = cursor.advance();
        if cursor.err().is_some() {
            return CursorEvent::Errored;
        }
        if !advanced {
            return CursorEvent::Exhausted;
        }
        if self.state == CursorState::Start || cursor.table_changed() {
            CursorEvent::TableBoundary
        } else {
            CursorEvent::SameTable
        }
    }

    /// Drains the cursor. Any cursor error discards what was collected so far.
    pub fn assemble(&mut self, cursor: &mut dyn Cursor) -> Result<ReadResponse, Error> {
        loop {
            let step = match self.next_event(cursor) {
                CursorEvent::Exhausted => {
                    self.state = CursorState::Exhausted;
                    debug!(
                        "assembled {} tables, {} records",
                        self.response.tables.len(),
                        self.response.records.len()
                    );
                    return Ok(std::mem::take(&mut self.response));
                }
                CursorEvent::Errored => {
                    if let Some(err) = cursor.err() {
                        error!("store cursor failed after {} records: {}", self.response.records.len(), err);
                    }
                    Err(Error::StoreQueryError)
                }
                CursorEvent::TableBoundary => self.push_table(cursor),
                CursorEvent::SameTable => self.push_record(cursor),
            };

            match step {
                Ok(()) => self.state = CursorState::Row,
                Err(e) => {
                    self.state = CursorState::Errored;
                    self.response = ReadResponse::default();
                    return Err(e);
                }
            }
        }
    }

    fn push_table(&mut self, cursor: &dyn Cursor) -> Result<(), Error> {
        let metadata = cursor.table_metadata().cloned().ok_or_else(|| {
            error!("store cursor reported a new table without metadata");
            Error::StoreQueryError
        })?;
        debug!("table {} with {} columns", metadata.position, metadata.columns.len());
        self.response.tables.push(metadata);
        self.push_record(cursor)
    }

    fn push_record(&mut self, cursor: &dyn Cursor) -> Result<(), Error> {
        let record = cursor.record().cloned().ok_or_else(|| {
            error!("store cursor advanced without a record");
            Error::StoreQueryError
        })?;
        debug!("record {} of table {}", self.response.records.len(), record.table_index);
        self.response.records.push(record);
        Ok(())
    }
}

pub fn assemble(cursor: &mut dyn Cursor) -> Result<ReadResponse, Error> {
    ResultAssembler::new().assemble(cursor)
}
