// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_all, create_polygon, delete_polygon, get_active_rules, get_polygon, get_time_window,
    health_check, list_data_sources, list_polygons, put_color_rules, put_time_window,
    recompute_stats, set_active_data_source, stream_events,
};
use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/polygons", get(list_polygons).post(create_polygon).delete(clear_all))
        .route("/polygons/:id", get(get_polygon).delete(delete_polygon))
        .route("/time-window", get(get_time_window).put(put_time_window))
        .route("/data-sources", get(list_data_sources))
        .route("/data-sources/active", put(set_active_data_source))
        .route("/data-sources/active/rules", get(get_active_rules))
        .route("/data-sources/:id/rules", put(put_color_rules))
        .route("/recompute/stats", get(recompute_stats))
        .route("/events", get(stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
