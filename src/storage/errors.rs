use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    #[error("Query parse error: {0}")]
    ParseError(String),
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
