//! Forecast Service Library
//!
//! Exposes configuration and the run pipeline for testing purposes.

pub mod config;
pub mod runner;

pub use config::ServiceConfig;
pub use runner::{load_oracle, run, write_report};
