//! Service boundary: JSON bodies in, status code and JSON body out.
//!
//! `create_data` stands for `POST /data` and `read_data` for
//! `GET /data/{deviceId}/{source}`. Both take the secret the caller
//! presented; transport and routing live in front of this type.

use std::sync::Arc;

use log::{error, warn};
use serde::Serialize;

use crate::config::{Config, ConfigError};
use crate::error::{status, Error};
use crate::ingest::{IngestOutcome, IngestionPipeline};
use crate::model::{AcceptedSubmission, IngestRequest, ReadRequest};
use crate::query::{DataReader, QueryTranslator};
use crate::storage::StoreClient;

#[cfg(test)]
mod tests;

const DATA_FEATURE: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Information {
    pub name: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
}

#[derive(Serialize)]
struct CreatedBody<'a> {
    status: u16,
    data: &'a [AcceptedSubmission],
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    reason: &'a str,
    message: String,
}

pub struct DataService {
    config: Config,
    secret: Option<String>,
    pipeline: IngestionPipeline,
    reader: DataReader,
}

impl DataService {
    /// Fails only when the configured secret cannot be read.
    pub fn new(config: Config, store: Arc<dyn StoreClient>) -> Result<Self, ConfigError> {
        let secret = config.resolve_secret()?;
        let translator = QueryTranslator::new(config.bucket.clone());
        Ok(Self {
            secret,
            pipeline: IngestionPipeline::new(store.clone()),
            reader: DataReader::new(store, translator),
            config,
        })
    }

    /// Without a configured secret every caller is accepted.
    pub fn verify_secret(&self, presented: Option<&str>) -> bool {
        match &self.secret {
            Some(secret) => presented == Some(secret.as_str()),
            None => true,
        }
    }

    pub fn info(&self) -> Information {
        Information {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT").unwrap_or_default(),
        }
    }

    pub fn create_data(&self, secret: Option<&str>, body: &[u8]) -> ApiResponse {
        let result = self.authorize(secret).and_then(|()| {
            let request = IngestRequest::from_json(body).map_err(|e| {
                warn!("rejecting unparsable ingest body: {}", e);
                Error::BadRequest(e.to_string())
            })?;
            self.pipeline.ingest(&request)
        });

        match result {
            Ok(IngestOutcome { status, data }) => json_response(status, &CreatedBody { status, data: &data }),
            Err(e) => error_response(&e),
        }
    }

    pub fn read_data(
        &self,
        secret: Option<&str>,
        device_id: &str,
        source: &str,
        start: Option<&str>,
        stop: Option<&str>,
    ) -> ApiResponse {
        let result = self.authorize(secret).and_then(|()| {
            let request = ReadRequest::new(device_id, source).with_range(start, stop);
            self.reader.read(&request)
        });

        match result {
            Ok(response) => json_response(status::OK, &response),
            Err(e) => error_response(&e),
        }
    }

    /// A disabled feature answers 404 before the secret is looked at.
    fn authorize(&self, secret: Option<&str>) -> Result<(), Error> {
        if !self.config.features.data {
            return Err(Error::FeatureDisabled(DATA_FEATURE));
        }
        if !self.verify_secret(secret) {
            warn!("rejecting request without a valid secret");
            return Err(Error::Unauthorized);
        }
        Ok(())
    }
}

fn json_response<T: Serialize>(status: u16, body: &T) -> ApiResponse {
    match serde_json::to_string(body) {
        Ok(body) => ApiResponse { status, body },
        Err(e) => {
            error!("failed to encode response body: {}", e);
            ApiResponse {
                status: status::INTERNAL_ERROR,
                body: String::new(),
            }
        }
    }
}

fn error_response(err: &Error) -> ApiResponse {
    let status = err.status();
    json_response(
        status,
        &ErrorBody {
            status,
            reason: err.reason(),
            message: err.to_string(),
        },
    )
}
