// Open-Meteo archive client implementing the series source
use crate::application::series_source::{FetchError, SeriesSource};
use crate::domain::data_source::DataSource;
use crate::domain::telemetry::TimeSeries;
use crate::infrastructure::config::expand_template;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    client: reqwest::Client,
    url_template: String,
    timeout: std::time::Duration,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(flatten)]
    variables: HashMap<String, Vec<Option<f64>>>,
}

impl OpenMeteoSource {
    pub fn new(url_template: String, timeout: std::time::Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            client,
            url_template,
            timeout,
        })
    }

    fn build_url(
        &self,
        source: &DataSource,
        lat: f64,
        lng: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("endpoint".to_string(), source.endpoint.trim_end_matches('?').to_string());
        vars.insert("lat".to_string(), lat.to_string());
        vars.insert("lng".to_string(), lng.to_string());
        vars.insert("start_date".to_string(), start.format("%Y-%m-%d").to_string());
        vars.insert("end_date".to_string(), end.format("%Y-%m-%d").to_string());
        vars.insert("field".to_string(), urlencoding::encode(&source.field).into_owned());
        expand_template(&self.url_template, &vars)
    }

    /// Turn the archive payload into a series trimmed to `[start hour, end]`
    ///
    /// The archive answers whole days, so the hours outside the window are dropped.
    fn parse_archive(
        response: ArchiveResponse,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TimeSeries, FetchError> {
        let mut hourly = response
            .hourly
            .ok_or_else(|| FetchError::Malformed("missing hourly block".to_string()))?;
        let values = hourly
            .variables
            .remove(field)
            .ok_or_else(|| FetchError::Malformed(format!("missing hourly field {}", field)))?;

        let timestamps = hourly
            .time
            .iter()
            .map(|t| {
                NaiveDateTime::parse_from_str(t, TIME_FORMAT)
                    .map(|naive| naive.and_utc())
                    .map_err(|e| FetchError::Malformed(format!("bad timestamp {}: {}", t, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let series = TimeSeries::new(timestamps, values).ok_or_else(|| {
            FetchError::Malformed("time and value arrays differ in length".to_string())
        })?;

        let first_hour = start.duration_trunc(Duration::hours(1)).unwrap_or(start);
        Ok(series.retain_between(first_hour, end))
    }
}

#[async_trait]
impl SeriesSource for OpenMeteoSource {
    async fn fetch_series(
        &self,
        source: &DataSource,
        lat: f64,
        lng: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TimeSeries, FetchError> {
        let url = self.build_url(source, lat, lng, start, end);
        tracing::debug!("Fetching weather series: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout)
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let payload = response
            .json::<ArchiveResponse>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let series = Self::parse_archive(payload, &source.field, start, end)?;
        tracing::debug!(
            "{} series for {}, {}: {} samples from {:?}",
            source.field,
            lat,
            lng,
            series.len(),
            series.timestamps().first()
        );
        Ok(series)
    }
}
