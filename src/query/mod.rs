//! Read path: device/source range reads translated into store queries.

use std::sync::Arc;

use log::{debug, error};

use crate::error::Error;
use crate::ingest::measurement_key;
use crate::model::ReadRequest;
use crate::storage::StoreClient;

pub mod assembler;

#[cfg(test)]
mod tests;

pub use assembler::{assemble, CursorEvent, CursorState, ReadResponse, ResultAssembler};

/// Trailing window used when a read names no start.
pub const DEFAULT_RANGE_START: &str = "-1h";

/// Builds the Flux query for every point under `device_id/source`.
///
/// `start` and `stop` are passed through as range expressions. Without a
/// start the trailing hour is read and `stop` is ignored; empty strings count
/// as absent.
pub fn build_query(
    bucket: &str,
    device_id: &str,
    source: &str,
    start: Option<&str>,
    stop: Option<&str>,
) -> String {
    format!(
        "from(bucket: {}) |> range({}) |> filter(fn: (r) => r._measurement == {})",
        quote(bucket),
        range_clause(start, stop),
        quote(&measurement_key(device_id, source)),
    )
}

fn range_clause(start: Option<&str>, stop: Option<&str>) -> String {
    let start = start.filter(|s| !s.is_empty());
    let stop = stop.filter(|s| !s.is_empty());
    match (start, stop) {
        (None, _) => format!("start: {}", DEFAULT_RANGE_START),
        (Some(start), None) => format!("start: {}", start),
        (Some(start), Some(stop)) => format!("start: {}, stop: {}", start, stop),
    }
}

/// Double-quoted Flux string literal. `${` would start an interpolation, so
/// the `$` is escaped.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\\' => out.push('\\'),
            '$' if chars.peek() == Some(&'{') => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTranslator {
    bucket: String,
}

impl QueryTranslator {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self { bucket: bucket.into() }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn translate(&self, request: &ReadRequest) -> String {
        build_query(
            &self.bucket,
            &request.device_id,
            &request.source,
            request.start.as_deref(),
            request.stop.as_deref(),
        )
    }
}

/// Runs translated reads against the store and assembles the cursor.
pub struct DataReader {
    store: Arc<dyn StoreClient>,
    translator: QueryTranslator,
}

impl DataReader {
    pub fn new(store: Arc<dyn StoreClient>, translator: QueryTranslator) -> Self {
        Self { store, translator }
    }

    pub fn read(&self, request: &ReadRequest) -> Result<ReadResponse, Error> {
        let query = self.translator.translate(request);
        debug!("querying store: {}", query);

        let mut cursor = self.store.query(&query).map_err(|e| {
            error!("query for {}/{} failed: {}", request.device_id, request.source, e);
            Error::StoreQueryError
        })?;
        assemble(cursor.as_mut())
    }
}
