// Presentation layer - HTTP surface for the map, timeline and rule editor clients
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod router;
