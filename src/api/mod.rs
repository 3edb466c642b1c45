//! HTTP API handlers for capitol-sync

pub mod health;
pub mod import;

pub use health::health_routes;
pub use import::import_routes;
