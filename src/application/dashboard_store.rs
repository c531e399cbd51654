// Dashboard store - Shared state container for polygons, data sources and the time window
use crate::application::state_repository::{PersistedState, StateRepository};
use crate::domain::color_rule::ColorRule;
use crate::domain::data_source::DataSource;
use crate::domain::geometry::{usable_vertex_count, MIN_POLYGON_VERTICES};
use crate::domain::polygon::Polygon;
use crate::domain::time_window::TimeWindow;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::{broadcast, watch};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("polygon needs at least 3 usable vertices, got {usable}")]
    InvalidGeometry { usable: usize },

    #[error("unknown polygon: {0}")]
    UnknownPolygon(String),

    #[error("unknown data source: {0}")]
    UnknownDataSource(String),
}

/// Change notifications delivered to subscribers, in write order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StoreEvent {
    PolygonAdded { polygon: Polygon },
    PolygonDeleted { id: String },
    PolygonsCleared,
    ValueUpdated { id: String, value: f64 },
    ColorUpdated { id: String, color: String },
    TimeWindowChanged { window: TimeWindow },
    ColorRulesUpdated { data_source_id: String, rules: Vec<ColorRule> },
    ActiveDataSourceChanged { id: String },
}

impl StoreEvent {
    /// Window edits and polygon-count changes are the only inputs of a recompute pass
    pub fn triggers_recompute(&self) -> bool {
        matches!(
            self,
            StoreEvent::PolygonAdded { .. }
                | StoreEvent::PolygonDeleted { .. }
                | StoreEvent::PolygonsCleared
                | StoreEvent::TimeWindowChanged { .. }
        )
    }
}

struct StoreState {
    persisted: PersistedState,
    window: TimeWindow,
}

/// Latest snapshot waiting to be saved, numbered in write order
#[derive(Default)]
struct PendingSave {
    version: u64,
    state: PersistedState,
}

/// Hand-off to the single task that writes snapshots to the repository
struct Persistence {
    pending: watch::Sender<PendingSave>,
    saved: watch::Receiver<u64>,
}

pub struct DashboardStore {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    persistence: Option<Persistence>,
}

/// Save whatever snapshot is newest; snapshots queued during a slow save collapse into one
async fn write_snapshots(
    repository: Arc<dyn StateRepository>,
    mut pending: watch::Receiver<PendingSave>,
    saved: watch::Sender<u64>,
) {
    while pending.changed().await.is_ok() {
        let (version, snapshot) = {
            let latest = pending.borrow_and_update();
            (latest.version, latest.state.clone())
        };

        if let Err(e) = repository.save(&snapshot).await {
            tracing::warn!("Failed to persist dashboard state: {:#}", e);
        }
        saved.send_replace(version);
    }
    tracing::debug!("Dashboard state writer stopped");
}

impl DashboardStore {
    /// Store without persistence, starting from the default data sources
    pub fn in_memory() -> Self {
        Self::with_state(PersistedState::default(), None)
    }

    /// Restore the saved state from `repository` and persist every change back to it
    ///
    /// Must be called from within a tokio runtime; saving happens on a background task.
    pub async fn open(repository: Arc<dyn StateRepository>) -> Self {
        let persisted = match repository.load().await {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::info!("No saved dashboard state, starting empty");
                PersistedState::default()
            }
            Err(e) => {
                tracing::warn!("Could not load saved dashboard state, starting empty: {:#}", e);
                PersistedState::default()
            }
        };

        let (pending, pending_rx) = watch::channel(PendingSave::default());
        let (saved_tx, saved) = watch::channel(0);
        tokio::spawn(write_snapshots(repository, pending_rx, saved_tx));

        Self::with_state(persisted, Some(Persistence { pending, saved }))
    }

    fn with_state(mut persisted: PersistedState, persistence: Option<Persistence>) -> Self {
        let before = persisted.polygons.len();
        persisted.polygons.retain(Polygon::is_valid);
        if persisted.polygons.len() != before {
            tracing::debug!(
                "Discarded {} saved polygons with fewer than 3 usable vertices",
                before - persisted.polygons.len()
            );
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(StoreState {
                persisted,
                window: TimeWindow::current_hour(),
            }),
            events,
            persistence,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Queue `persisted` for saving. Callers hold the write lock so versions follow write order.
    fn persist(&self, persisted: &PersistedState) {
        if let Some(persistence) = &self.persistence {
            persistence.pending.send_modify(|pending| {
                pending.version += 1;
                pending.state = persisted.clone();
            });
        }
    }

    /// Wait until every change made so far has been handed to the repository
    pub async fn flush(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let target = persistence.pending.borrow().version;
        let mut saved = persistence.saved.clone();
        if saved.wait_for(|version| *version >= target).await.is_err() {
            tracing::warn!("Dashboard state writer stopped before flushing");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // Polygons

    /// Snapshot of every polygon, in drawing order
    pub fn polygons(&self) -> Vec<Polygon> {
        self.read().persisted.polygons.clone()
    }

    pub fn polygon(&self, id: &str) -> Option<Polygon> {
        self.read().persisted.polygons.iter().find(|p| p.id == id).cloned()
    }

    /// Add a freshly drawn polygon, bound to `data_source_id` or the active source
    pub fn add_polygon(
        &self,
        vertices: Vec<[f64; 2]>,
        data_source_id: Option<String>,
    ) -> Result<Polygon, StoreError> {
        let usable = usable_vertex_count(&vertices);
        if usable < MIN_POLYGON_VERTICES {
            tracing::warn!("Rejected polygon with {} usable vertices", usable);
            return Err(StoreError::InvalidGeometry { usable });
        }

        let polygon = {
            let mut state = self.write();
            let data_source_id =
                data_source_id.unwrap_or_else(|| state.persisted.active_data_source.clone());
            state.persisted.polygon_counter += 1;
            let polygon = Polygon::new(vertices, data_source_id, state.persisted.polygon_counter);
            state.persisted.polygons.push(polygon.clone());
            self.persist(&state.persisted);
            polygon
        };

        tracing::info!("Added {} ({})", polygon.name, polygon.id);
        self.publish(StoreEvent::PolygonAdded {
            polygon: polygon.clone(),
        });
        Ok(polygon)
    }

    pub fn delete_polygon(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut state = self.write();
            let before = state.persisted.polygons.len();
            state.persisted.polygons.retain(|p| p.id != id);
            if state.persisted.polygons.len() == before {
                return Err(StoreError::UnknownPolygon(id.to_string()));
            }
            self.persist(&state.persisted);
        }

        tracing::info!("Deleted polygon {}", id);
        self.publish(StoreEvent::PolygonDeleted { id: id.to_string() });
        Ok(())
    }

    fn update_polygon(&self, id: &str, apply: impl FnOnce(&mut Polygon)) -> Result<(), StoreError> {
        {
            let mut state = self.write();
            let polygon = state
                .persisted
                .polygons
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| StoreError::UnknownPolygon(id.to_string()))?;
            apply(polygon);
            self.persist(&state.persisted);
        }
        Ok(())
    }

    pub fn update_value(&self, id: &str, value: f64) -> Result<(), StoreError> {
        self.update_polygon(id, |p| p.current_value = Some(value))?;
        self.publish(StoreEvent::ValueUpdated {
            id: id.to_string(),
            value,
        });
        Ok(())
    }

    pub fn update_color(&self, id: &str, color: &str) -> Result<(), StoreError> {
        self.update_polygon(id, |p| p.color = color.to_string())?;
        self.publish(StoreEvent::ColorUpdated {
            id: id.to_string(),
            color: color.to_string(),
        });
        Ok(())
    }

    // Time window

    pub fn time_window(&self) -> TimeWindow {
        self.read().window
    }

    /// Replace the window; an identical window is not a change
    pub fn set_time_window(&self, window: TimeWindow) {
        {
            let mut state = self.write();
            if state.window == window {
                return;
            }
            state.window = window;
        }

        tracing::debug!(
            "Time window set to {} .. {} (range: {})",
            window.start(),
            window.end(),
            window.is_range()
        );
        self.publish(StoreEvent::TimeWindowChanged { window });
    }

    // Data sources

    pub fn data_sources(&self) -> Vec<DataSource> {
        self.read().persisted.data_sources.clone()
    }

    pub fn active_data_source(&self) -> Option<DataSource> {
        let state = self.read();
        state
            .persisted
            .data_sources
            .iter()
            .find(|ds| ds.id == state.persisted.active_data_source)
            .cloned()
    }

    /// Rules of the active data source, `None` when it cannot be resolved
    pub fn active_rules(&self) -> Option<Vec<ColorRule>> {
        self.active_data_source().map(|ds| ds.color_rules)
    }

    pub fn set_active_data_source(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut state = self.write();
            if !state.persisted.data_sources.iter().any(|ds| ds.id == id) {
                return Err(StoreError::UnknownDataSource(id.to_string()));
            }
            state.persisted.active_data_source = id.to_string();
            self.persist(&state.persisted);
        }

        self.publish(StoreEvent::ActiveDataSourceChanged { id: id.to_string() });
        Ok(())
    }

    pub fn update_color_rules(&self, data_source_id: &str, rules: Vec<ColorRule>) -> Result<(), StoreError> {
        {
            let mut state = self.write();
            let source = state
                .persisted
                .data_sources
                .iter_mut()
                .find(|ds| ds.id == data_source_id)
                .ok_or_else(|| StoreError::UnknownDataSource(data_source_id.to_string()))?;
            source.color_rules = rules.clone();
            self.persist(&state.persisted);
        }

        tracing::info!("Updated {} color rules for {}", rules.len(), data_source_id);
        self.publish(StoreEvent::ColorRulesUpdated {
            data_source_id: data_source_id.to_string(),
            rules,
        });
        Ok(())
    }

    /// Drop every polygon and restore default data sources and the current-hour window
    pub fn clear_all(&self) {
        let (window, window_changed) = {
            let mut state = self.write();
            state.persisted = PersistedState::default();
            let window = TimeWindow::current_hour();
            let window_changed = state.window != window;
            state.window = window;
            self.persist(&state.persisted);
            (window, window_changed)
        };

        tracing::info!("Cleared dashboard state");
        self.publish(StoreEvent::PolygonsCleared);
        if window_changed {
            self.publish(StoreEvent::TimeWindowChanged { window });
        }
    }
}
