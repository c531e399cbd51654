// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod event_stream;
pub mod http_response;
pub mod json_state_repository;
pub mod open_meteo_source;
