// Recompute service - Debounced refresh of every polygon's value and color
use crate::application::dashboard_store::DashboardStore;
use crate::application::debounce::Debouncer;
use crate::application::series_source::{FetchError, SeriesSource};
use crate::domain::aggregate::aggregate;
use crate::domain::color_rule::evaluate_color;
use crate::domain::data_source::DataSource;
use crate::domain::fallback::fallback_series;
use crate::domain::geometry::LatLng;
use crate::domain::polygon::Polygon;
use crate::domain::telemetry::TimeSeries;
use crate::domain::time_window::{RecomputeKey, TimeWindow};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy)]
pub struct RecomputeSettings {
    /// How long inputs must stay unchanged before a pass fires
    pub quiet_period: Duration,
    /// Upper bound for a single series fetch
    pub fetch_timeout: Duration,
}

impl Default for RecomputeSettings {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(600),
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

/// Counters describing what happened to each debounced firing
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassStats {
    /// Firings dropped because a pass was already running
    pub dropped: u64,
    /// Passes skipped because their inputs matched the last completed pass
    pub skipped: u64,
    /// Passes that walked the polygon snapshot
    pub completed: u64,
}

#[derive(Default)]
struct PassGate {
    in_flight: bool,
    /// A firing arrived while a pass was running
    retrigger: bool,
    last_key: Option<RecomputeKey>,
    stats: PassStats,
}

pub struct RecomputeService {
    store: Arc<DashboardStore>,
    source: Arc<dyn SeriesSource>,
    fetch_timeout: Duration,
    debouncer: Debouncer,
    gate: Mutex<PassGate>,
}

impl RecomputeService {
    pub fn new(
        store: Arc<DashboardStore>,
        source: Arc<dyn SeriesSource>,
        settings: RecomputeSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            source,
            fetch_timeout: settings.fetch_timeout,
            debouncer: Debouncer::new(settings.quiet_period),
            gate: Mutex::new(PassGate::default()),
        })
    }

    fn gate(&self) -> MutexGuard<'_, PassGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> PassStats {
        self.gate().stats
    }

    /// Listen to store changes and trigger a pass on window or polygon-count edits
    pub fn spawn_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let service = self.clone();
        let mut events = self.store.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.triggers_recompute() => service.trigger(),
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Recompute watcher missed {} store events", missed);
                        service.trigger();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// (Re)start the quiet period; only the last trigger of a burst fires
    pub fn trigger(self: &Arc<Self>) {
        if self.debouncer.is_pending() {
            tracing::trace!("Restarting recompute quiet period");
        }
        let service = self.clone();
        self.debouncer.schedule(move || service.fire());
    }

    fn fire(self: Arc<Self>) {
        {
            let mut gate = self.gate();
            if gate.in_flight {
                gate.retrigger = true;
                gate.stats.dropped += 1;
                tracing::debug!("Recompute pass already running, deferring trigger");
                return;
            }
            gate.in_flight = true;
        }

        tokio::spawn(async move {
            self.run_pass().await;
            self.finish_pass();
        });
    }

    fn finish_pass(self: &Arc<Self>) {
        let retrigger = {
            let mut gate = self.gate();
            gate.in_flight = false;
            std::mem::take(&mut gate.retrigger)
        };

        if retrigger {
            self.trigger();
        }
    }

    /// One pass over a snapshot of the polygons. Results are written even if a
    /// newer trigger is already waiting.
    async fn run_pass(&self) {
        let window = self.store.time_window();
        let polygons = self.store.polygons();
        let key = RecomputeKey::new(&window, polygons.len());

        {
            let mut gate = self.gate();
            if gate.last_key == Some(key) {
                gate.stats.skipped += 1;
                tracing::debug!("Inputs unchanged since last pass, skipping");
                return;
            }
        }

        tracing::info!(
            "Recomputing {} polygons for {} .. {} (range: {})",
            polygons.len(),
            window.start(),
            window.end(),
            window.is_range()
        );

        match self.store.active_data_source() {
            Some(source) => {
                for polygon in &polygons {
                    self.refresh_polygon(polygon, &window, &source).await;
                }
            }
            None => tracing::warn!("No active data source, leaving polygons untouched"),
        }

        let mut gate = self.gate();
        gate.last_key = Some(key);
        gate.stats.completed += 1;
    }

    async fn refresh_polygon(&self, polygon: &Polygon, window: &TimeWindow, source: &DataSource) {
        if !polygon.is_valid() {
            tracing::debug!("Skipping {}: not enough usable vertices", polygon.id);
            return;
        }
        let centroid = polygon.centroid();
        if centroid.is_unavailable() {
            tracing::debug!("Skipping {}: centroid unavailable", polygon.id);
            return;
        }

        let series = match self.fetch(source, centroid, window).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("Fetch for polygon {} failed, using fallback series: {}", polygon.id, e);
                fallback_series(centroid, window)
            }
        };

        let Some(value) = aggregate(&series, window.is_range()) else {
            tracing::debug!("No usable readings for polygon {}, keeping previous value", polygon.id);
            return;
        };

        // The polygon may have been deleted since the snapshot
        if let Err(e) = self.store.update_value(&polygon.id, value) {
            tracing::debug!("Dropping result for polygon {}: {}", polygon.id, e);
            return;
        }
        let color = evaluate_color(value, &source.color_rules);
        if let Err(e) = self.store.update_color(&polygon.id, &color) {
            tracing::debug!("Dropping color for polygon {}: {}", polygon.id, e);
        }
    }

    async fn fetch(
        &self,
        source: &DataSource,
        centroid: LatLng,
        window: &TimeWindow,
    ) -> Result<TimeSeries, FetchError> {
        let (start, end) = window.query_bounds();
        let request = self.source.fetch_series(source, centroid.lat, centroid.lng, start, end);

        match tokio::time::timeout(self.fetch_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        }
    }
}
