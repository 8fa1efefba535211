//! Audit report files.

pub mod writer;

pub use writer::ReportWriter;
