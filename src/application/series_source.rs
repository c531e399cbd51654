// Series source trait for weather data access
use crate::domain::data_source::DataSource;
use crate::domain::telemetry::TimeSeries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Every way a fetch can fail; the orchestrator recovers from all of them
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to weather source failed: {0}")]
    Transport(String),

    #[error("weather source did not answer within {0:?}")]
    Timeout(Duration),

    #[error("weather source returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed weather payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Hourly readings of `source.field` from `source.endpoint` at `(lat, lng)`,
    /// between `start` and `end` inclusive
    async fn fetch_series(
        &self,
        source: &DataSource,
        lat: f64,
        lng: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TimeSeries, FetchError>;
}
