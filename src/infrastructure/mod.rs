//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Audit report files

pub mod config;
pub mod logging;
pub mod report;
