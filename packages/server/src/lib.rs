// Annual Report Extraction Agent - API Core
//
// This crate provides the backend API for extracting structured financial
// data from annual reports. A submission creates a run that executes a fixed
// catalog of extraction tasks on its own tokio task; clients poll for status,
// results, and the audit trail.

pub mod common;
pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
