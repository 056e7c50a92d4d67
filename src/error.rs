//! Request-level error taxonomy

use crate::codec::CodecError;

/// HTTP-equivalent status codes surfaced at the service boundary.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_ERROR: u16 = 500;
}

/// Every failure aborts the whole request. Messages never carry store
/// internals; those only go to the log.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unsupported data_type provided: {0}")]
    UnsupportedDataType(i64),
    #[error("Malformed {shape} payload: {reason}")]
    MalformedPayload { shape: &'static str, reason: String },
    #[error("Time-series store is not healthy")]
    StoreUnavailable,
    #[error("Time-series store rejected the write")]
    StoreWriteFailure,
    #[error("Time-series store query failed")]
    StoreQueryError,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0} support is disabled")]
    FeatureDisabled(&'static str),
    #[error("Not authorized or no valid secret provided")]
    Unauthorized,
}

impl Error {
    pub fn status(&self) -> u16 {
        match self {
            Error::UnsupportedDataType(_) | Error::BadRequest(_) => status::BAD_REQUEST,
            Error::Unauthorized => status::UNAUTHORIZED,
            Error::FeatureDisabled(_) => status::NOT_FOUND,
            Error::MalformedPayload { .. }
            | Error::StoreUnavailable
            | Error::StoreWriteFailure
            | Error::StoreQueryError => status::INTERNAL_ERROR,
        }
    }

    /// Machine-stable reason string.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::UnsupportedDataType(_) => "unsupported_data_type",
            Error::MalformedPayload { .. } => "malformed_payload",
            Error::StoreUnavailable => "store_unavailable",
            Error::StoreWriteFailure => "store_write_failure",
            Error::StoreQueryError => "store_query_error",
            Error::BadRequest(_) => "bad_request",
            Error::FeatureDisabled(_) => "feature_disabled",
            Error::Unauthorized => "unauthorized",
        }
    }
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedDataType(code) => Error::UnsupportedDataType(code),
            CodecError::MalformedPayload { shape, reason } => {
                Error::MalformedPayload { shape, reason }
            }
        }
    }
}
