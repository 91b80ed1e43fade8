//! Table transforms for the fundsync pipelines.
//!
//! Every stage is a plain function or small value type over
//! [`fundsync_model::Table`]:
//!
//! - **Filters and profiles**: row predicates, column drop-lists
//! - **Reconciler**: mapping-driven cell corrections
//! - **Labeler / Splitter**: partition rows into sheet-safe groups
//! - **Summaries**: value counts and column totals
//! - **Contact export**: the Google Contacts CSV layout and its inverse
//! - **Fundraising / transactions**: report shaping for the API and export pipelines
//!
//! Per-row problems never fail a stage: unmapped values and missing optional
//! columns pass through unchanged.

mod contacts;
mod error;
mod filter;
mod fundraising;
mod label;
mod ops;
mod profile;
mod reconcile;
mod split;
mod summary;
mod transactions;

pub use contacts::{
    CONTACT_EXPORT_COLUMNS, ContactExportOptions, GroupTagRule, LABEL_SEPARATOR,
    build_contact_export, contacts_from_export,
};
pub use error::{Result, TransformError};
pub use filter::{FilterOp, RowFilter};
pub use fundraising::{
    MEMBER_DROP_FIELDS, MembersReport, RAISED_COLUMN, TICKET_TITLE_COLUMN, TOTAL_RAISED_LABEL,
    field_to_header, members_report, tickets_report,
};
pub use label::{PrefixStrip, SheetLabeler, UNSPECIFIED_LABEL};
pub use ops::{format_date_column, lowercase_column, replace_exact, title_case_column};
pub use profile::PipelineProfile;
pub use reconcile::{ReconcileStats, Reconciler};
pub use split::{LabelCollision, SplitGroup, SplitOutcome, split_by_column};
pub use summary::{column_total, value_counts};
pub use transactions::{
    Cohort, DESCRIPTION_COLUMN, correct_team_member_emails, fix_descriptions, keep_tickets,
};
