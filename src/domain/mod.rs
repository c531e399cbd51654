// Domain layer - Pure models and the computations over them
pub mod aggregate;
pub mod color_rule;
pub mod data_source;
pub mod fallback;
pub mod geometry;
pub mod polygon;
pub mod telemetry;
pub mod time_window;
