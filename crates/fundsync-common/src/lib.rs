//! Shared utilities for fundsync crates.
//!
//! Polars `AnyValue` conversion into [`fundsync_model::CellValue`] plus the
//! small text helpers used by several pipeline stages, and the personal-data
//! redaction switch shared by every crate that logs contact details.

pub mod polars;
pub mod redact;
pub mod text;

pub use polars::{any_to_cell, any_to_string, dataframe_to_table};
pub use redact::{REDACTED_VALUE, log_data_enabled, redact_value, set_log_data};
pub use text::{strip_header_noise, title_case};
