// Application layer - Use cases and the seams to external collaborators
pub mod dashboard_store;
pub mod debounce;
pub mod recompute_service;
pub mod series_source;
pub mod state_repository;
