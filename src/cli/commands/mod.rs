//! CLI command implementations

pub mod config;
pub mod show;
pub mod simulate;
pub mod verify;
