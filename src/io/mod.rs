//! File output for run results.

pub mod export;

pub use export::{CSV_HEADER, export_records, write_records};
