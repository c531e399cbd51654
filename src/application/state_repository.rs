// Repository trait for persisted dashboard state
use crate::domain::data_source::{DataSource, DEFAULT_DATA_SOURCE_ID};
use crate::domain::polygon::Polygon;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything that survives a restart. Time windows and series are session-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub polygons: Vec<Polygon>,
    pub data_sources: Vec<DataSource>,
    pub active_data_source: String,
    pub polygon_counter: u64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            polygons: Vec::new(),
            data_sources: DataSource::defaults(),
            active_data_source: DEFAULT_DATA_SOURCE_ID.to_string(),
            polygon_counter: 0,
        }
    }
}

#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Load the last saved state, `None` when nothing was saved yet
    async fn load(&self) -> anyhow::Result<Option<PersistedState>>;

    async fn save(&self, state: &PersistedState) -> anyhow::Result<()>;
}
