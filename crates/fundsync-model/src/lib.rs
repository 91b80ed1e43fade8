//! Core data model for the fundsync pipelines.
//!
//! Every pipeline stage exchanges data through the types defined here:
//!
//! - [`Table`] / [`CellValue`]: a dynamic, header-driven in-memory table
//! - [`MappingEntry`]: a known-incorrect → correct value patch
//! - [`SheetName`]: a spreadsheet-safe group label
//! - [`ContactRecord`]: a desired entry in the remote contact directory

pub mod contact;
pub mod error;
pub mod mapping;
pub mod sheet;
pub mod table;

pub use contact::{ContactRecord, normalize_email};
pub use error::{ModelError, Result};
pub use mapping::MappingEntry;
pub use sheet::{INVALID_SHEET_CHARS, MAX_SHEET_NAME_LEN, SheetName, sanitize_sheet_name};
pub use table::{CellValue, RowRef, Table, format_number};
