//! The pipelines behind each command.
//!
//! Every pipeline takes the resolved [`AppConfig`](crate::config::AppConfig)
//! and returns an outcome for the summary printer. Local failures (missing
//! inputs, missing columns) are errors; remote steps are recorded in the
//! outcome.

mod contacts;
mod fundraising;
mod remote;
mod tickets;
mod transactions;

pub use contacts::{ContactExport, ContactsOutcome, export_contacts, run_contacts};
pub use fundraising::{FundraisingOutcome, FundraisingReports, run_fundraising, write_reports};
pub use remote::{AccountSync, UploadResult, sync_accounts, upload_report};
pub use tickets::{TicketsOutcome, run_tickets};
pub use transactions::{CohortOutcome, TransactionsOutcome, run_transactions};

/// Rows written to one workbook sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCount {
    pub label: String,
    /// The raw category value the sheet was split on.
    pub source: String,
    pub rows: usize,
}
