//! Report output for the fundsync pipelines.
//!
//! - [`write_workbook`]: one sheet per label, auto-sized columns, summary blocks
//! - [`write_csv_table`]: plain CSV export
//! - [`SnapshotRegistry`]: timestamped dataset snapshots tracked in `snapshots.json`
//! - [`detect_changes`]: diff against the latest prior snapshot
//!
//! Every file is written to a temporary sibling and renamed into place, so a
//! failed write never leaves a partial file at the target path.

mod atomic;
mod changes;
mod csv_out;
mod error;
mod snapshot;
mod workbook;

pub use changes::{CHANGE_COLUMN, ChangeOutcome, ChangeSet, detect_changes, diff_tables};
pub use csv_out::{table_to_csv_bytes, write_csv_table};
pub use error::{ReportError, Result};
pub use snapshot::{REGISTRY_FILE, SnapshotRecord, SnapshotRegistry};
pub use workbook::{COLUMN_PADDING, SheetSpec, SummaryBlock, WorkbookStats, write_workbook};
