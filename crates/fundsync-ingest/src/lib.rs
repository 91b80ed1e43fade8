//! Tabular loading for the fundsync pipelines.
//!
//! - **CSV**: platform exports read as text through Polars
//! - **XLSX**: workbook sheets read through calamine, optionally filtered by name prefix
//! - **Discovery**: newest file in a directory matching a filename prefix
//! - **Records**: JSON API payloads flattened into tables
//! - **Mapping files**: correction entries for the reconciler
//!
//! Every loader normalizes header names (whitespace, BOM, quotes) and skips
//! fully blank rows.

mod csv_table;
mod discovery;
mod error;
mod loader;
mod mapping;
mod records;
mod xlsx;

pub use csv_table::read_csv_table;
pub use discovery::{find_latest_with_prefix, list_files_with_prefix};
pub use error::{IngestError, Result};
pub use loader::{LoadedTable, TableFormat, load_tables, require_columns};
pub use mapping::{MappingLayout, load_mapping_entries};
pub use records::records_to_table;
pub use xlsx::read_xlsx_tables;
