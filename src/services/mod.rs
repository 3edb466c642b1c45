//! Core services for capitol-sync

pub mod congress_client;
pub mod import_orchestrator;

pub use congress_client::CongressClient;
pub use import_orchestrator::ImportOrchestrator;
