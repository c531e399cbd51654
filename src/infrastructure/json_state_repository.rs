// JSON file repository for dashboard state
use crate::application::state_repository::{PersistedState, StateRepository};
use crate::domain::data_source::DataSource;
use crate::domain::polygon::Polygon;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct JsonStateRepository {
    path: PathBuf,
}

/// Saved file layout; polygons stay raw so one bad entry does not sink the rest
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFile {
    #[serde(default)]
    polygons: Vec<serde_json::Value>,
    data_sources: Vec<DataSource>,
    active_data_source: String,
    #[serde(default)]
    polygon_counter: u64,
}

impl JsonStateRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode_polygons(raw: Vec<serde_json::Value>) -> Vec<Polygon> {
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<Polygon>(value) {
                Ok(polygon) if polygon.is_valid() => Some(polygon),
                Ok(polygon) => {
                    tracing::debug!("Discarding saved polygon {} with too few vertices", polygon.id);
                    None
                }
                Err(e) => {
                    tracing::debug!("Discarding unreadable saved polygon: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl StateRepository for JsonStateRepository {
    async fn load(&self) -> Result<Option<PersistedState>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let file: StateFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        Ok(Some(PersistedState {
            polygons: Self::decode_polygons(file.polygons),
            data_sources: file.data_sources,
            active_data_source: file.active_data_source,
            polygon_counter: file.polygon_counter,
        }))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_vec_pretty(state).context("Failed to serialize dashboard state")?;

        // Write next to the target and rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn triangle() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [0.0, 2.0], [2.0, 0.0]]
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonStateRepository::new(dir.path().join("absent.json"));
        assert!(repository.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonStateRepository::new(dir.path().join("nested/state.json"));

        let mut state = PersistedState::default();
        let mut polygon = Polygon::new(triangle(), "openmeteo".into(), 1);
        polygon.current_value = Some(21.3);
        polygon.color = "#52c41a".into();
        state.polygons.push(polygon);
        state.polygon_counter = 1;

        repository.save(&state).await.unwrap();
        assert_eq!(repository.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_load_discards_invalid_polygons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let json = serde_json::json!({
            "polygons": [
                { "id": "ok", "vertices": [[0.0, 0.0], [0.0, 2.0], [2.0, 0.0]],
                  "dataSourceId": "openmeteo", "currentValue": null, "color": "#cccccc", "name": "Polygon 1" },
                { "id": "line", "vertices": [[0.0, 0.0], [1.0, 1.0]],
                  "dataSourceId": "openmeteo", "color": "#cccccc", "name": "Polygon 2" },
                { "id": "garbled", "vertices": [[0.0], "x"],
                  "dataSourceId": "openmeteo", "color": "#cccccc", "name": "Polygon 3" }
            ],
            "dataSources": [],
            "activeDataSource": "openmeteo",
            "polygonCounter": 3
        });
        std_fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

        let state = JsonStateRepository::new(&path).load().await.unwrap().unwrap();
        let ids: Vec<&str> = state.polygons.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
        assert_eq!(state.polygon_counter, 3);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std_fs::write(&path, b"{not json").unwrap();
        assert!(JsonStateRepository::new(&path).load().await.is_err());
    }
}
