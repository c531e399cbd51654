// Application state for HTTP handlers
use crate::application::dashboard_store::DashboardStore;
use crate::application::recompute_service::RecomputeService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DashboardStore>,
    pub recompute: Arc<RecomputeService>,
}
