// HTTP request handlers
use crate::application::dashboard_store::StoreError;
use crate::application::recompute_service::PassStats;
use crate::domain::color_rule::ColorRule;
use crate::domain::data_source::DataSource;
use crate::domain::polygon::Polygon;
use crate::domain::time_window::TimeWindow;
use crate::infrastructure::event_stream::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPolygonRequest {
    pub vertices: Vec<[f64; 2]>,
    pub data_source_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_range: bool,
}

#[derive(Deserialize)]
pub struct ActiveDataSourceRequest {
    pub id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourcesResponse {
    pub active_data_source: Option<String>,
    pub data_sources: Vec<DataSource>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List every polygon with its latest value and color
pub async fn list_polygons(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let polygons = state.store.polygons();
    match json_response(StatusCode::OK, &polygons, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Register a polygon closed by the drawing tool
pub async fn create_polygon(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewPolygonRequest>,
) -> Result<(StatusCode, Json<Polygon>), ApiError> {
    let polygon = state.store.add_polygon(request.vertices, request.data_source_id)?;
    Ok((StatusCode::CREATED, Json(polygon)))
}

pub async fn get_polygon(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Polygon>, ApiError> {
    let polygon = state
        .store
        .polygon(&id)
        .ok_or(StoreError::UnknownPolygon(id))?;
    Ok(Json(polygon))
}

pub async fn delete_polygon(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_polygon(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove all polygons and restore the default data sources
pub async fn clear_all(State(state): State<Arc<AppState>>) -> StatusCode {
    state.store.clear_all();
    StatusCode::NO_CONTENT
}

pub async fn get_time_window(State(state): State<Arc<AppState>>) -> Json<TimeWindow> {
    Json(state.store.time_window())
}

/// Replace the time window chosen on the timeline
pub async fn put_time_window(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TimeWindowRequest>,
) -> Result<Json<TimeWindow>, ApiError> {
    let window = TimeWindow::new(request.start, request.end, request.is_range)?;
    state.store.set_time_window(window);
    Ok(Json(window))
}

pub async fn list_data_sources(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = DataSourcesResponse {
        active_data_source: state.store.active_data_source().map(|ds| ds.id),
        data_sources: state.store.data_sources(),
    };
    match json_response(StatusCode::OK, &response, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

pub async fn set_active_data_source(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActiveDataSourceRequest>,
) -> Result<StatusCode, ApiError> {
    state.store.set_active_data_source(&request.id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rules currently used to color polygons
pub async fn get_active_rules(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ColorRule>>, ApiError> {
    let rules = state
        .store
        .active_rules()
        .ok_or_else(|| StoreError::UnknownDataSource("active".to_string()))?;
    Ok(Json(rules))
}

/// Replace the ordered rule list of a data source
pub async fn put_color_rules(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(rules): Json<Vec<ColorRule>>,
) -> Result<Json<Vec<ColorRule>>, ApiError> {
    state.store.update_color_rules(&id, rules.clone())?;
    Ok(Json(rules))
}

pub async fn recompute_stats(State(state): State<Arc<AppState>>) -> Json<PassStats> {
    Json(state.recompute.stats())
}

/// Stream store changes as they happen (progressive map updates)
pub async fn stream_events(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    stream_from_receiver(state.store.subscribe(), compress)
}
