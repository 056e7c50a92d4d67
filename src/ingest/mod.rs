//! Write path: submissions in, one atomic batch of points out.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::codec::{self, CodecError};
use crate::error::{status, Error};
use crate::model::{AcceptedSubmission, DataType, IngestRequest};
use crate::storage::{Health, StoreClient};

pub mod point;

#[cfg(test)]
mod tests;

pub use point::{measurement_key, PointBuilder, TimeSeriesPoint};

/// Result of a request that was fully written.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub status: u16,
    pub data: Vec<AcceptedSubmission>,
}

pub struct IngestionPipeline {
    store: Arc<dyn StoreClient>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// Decodes every submission and writes all resulting points in a single
    /// store call.
    ///
    /// Any rejected submission fails the whole request before the store is
    /// touched.
    pub fn ingest(&self, request: &IngestRequest) -> Result<IngestOutcome, Error> {
        for submission in &request.data {
            if DataType::try_from(submission.data_type).is_err() {
                warn!(
                    "rejecting request: unsupported data_type {} from device {}",
                    submission.data_type.0, submission.device_id
                );
                return Err(CodecError::UnsupportedDataType(submission.data_type.0).into());
            }
        }

        let received_at = Utc::now();
        let mut points = Vec::new();
        let mut accepted = Vec::with_capacity(request.data.len());
        for submission in &request.data {
            let measurements = codec::decode(submission.data_type, submission.sensor_type, &submission.payload)
                .map_err(|e| {
                    warn!("rejecting request: {} (device {})", e, submission.device_id);
                    Error::from(e)
                })?;
            debug!(
                "decoded {} measurements for {}/{}",
                measurements.len(),
                submission.device_id,
                submission.source
            );

            let builder = PointBuilder::new(
                &submission.device_id,
                &submission.source,
                submission.sensor_type,
                submission.measured_at,
            );
            points.extend(measurements.iter().map(|m| builder.build(m)));
            accepted.push(AcceptedSubmission::new(submission, measurements, received_at));
        }

        if points.is_empty() {
            debug!("request carried no measurements, skipping write");
            return Ok(IngestOutcome { status: status::CREATED, data: accepted });
        }

        if let Health::Unhealthy(reason) = self.store.health() {
            warn!("store is not healthy: {}", reason);
            return Err(Error::StoreUnavailable);
        }

        self.store.write_batch(&points).map_err(|e| {
            error!("failed to write {} points: {}", points.len(), e);
            Error::StoreWriteFailure
        })?;
        info!("wrote {} points from {} submissions", points.len(), accepted.len());

        Ok(IngestOutcome { status: status::CREATED, data: accepted })
    }
}
