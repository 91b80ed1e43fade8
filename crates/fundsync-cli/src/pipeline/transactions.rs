//! Transaction export → per-cohort snapshots and change files → master workbook.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fundsync_ingest::{MappingLayout, load_mapping_entries, read_csv_table, require_columns};
use fundsync_report::{SheetSpec, SnapshotRegistry, detect_changes, write_workbook};
use fundsync_transform::{
    DESCRIPTION_COLUMN, correct_team_member_emails, fix_descriptions, keep_tickets,
};
use tracing::{info, info_span, warn};

use crate::config::AppConfig;

const SUBTYPE_COLUMN: &str = "Item Subtype";

#[derive(Debug)]
pub struct CohortOutcome {
    pub dataset: String,
    pub rows: usize,
    pub snapshot: PathBuf,
    /// `first snapshot`, `no changes` or the added/removed counts.
    pub changes: String,
    pub changes_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct TransactionsOutcome {
    pub source: PathBuf,
    pub rows_read: usize,
    pub descriptions_fixed: usize,
    pub non_tickets_removed: usize,
    pub rows_excluded: usize,
    pub emails_corrected: usize,
    pub columns_dropped: usize,
    /// Ticket rows matching no cohort.
    pub unassigned: usize,
    pub cohorts: Vec<CohortOutcome>,
    pub workbook: PathBuf,
}

pub fn run_transactions(config: &AppConfig, now: DateTime<Utc>) -> Result<TransactionsOutcome> {
    let settings = &config.transactions;
    let _span = info_span!("transactions").entered();
    let started = Instant::now();
    if settings.profile.reconcile_removals {
        warn!("transactions do not sync contacts; profile.reconcile_removals is ignored");
    }

    let source = config.resolve(&settings.input_file);
    let mut table = read_csv_table(&source)
        .with_context(|| format!("transaction export {}", source.display()))?;
    require_columns(
        &table,
        &[DESCRIPTION_COLUMN, SUBTYPE_COLUMN],
        &source.display().to_string(),
    )?;
    let rows_read = table.len();

    let descriptions_fixed = fix_descriptions(&mut table, &settings.description_fixes);
    let non_tickets_removed = keep_tickets(&mut table);

    let mapping = load_mapping_entries(
        &config.resolve(&settings.mapping_file),
        MappingLayout::Keyed,
        true,
    )?;
    let corrections = correct_team_member_emails(&mut table, &mapping);
    let (rows_excluded, dropped) = settings.profile.apply(&mut table);
    info!(
        rows = table.len(),
        descriptions_fixed,
        emails_corrected = corrections.cells_changed,
        "cleaned transactions"
    );

    let output_dir = config.resolve(&settings.output_dir);
    let mut registry = SnapshotRegistry::open(&output_dir)?;
    let mut cohorts = Vec::with_capacity(settings.cohorts.len());
    let mut sheets = Vec::with_capacity(settings.cohorts.len());
    let mut assigned = 0;
    for cohort in &settings.cohorts {
        let subset = cohort.subset(&table);
        assigned += subset.len();
        let outcome = detect_changes(&mut registry, &cohort.dataset, &subset, now)?;
        info!(dataset = %cohort.dataset, rows = subset.len(), result = %outcome.describe(), "compared snapshot");
        cohorts.push(CohortOutcome {
            dataset: cohort.dataset.clone(),
            rows: subset.len(),
            snapshot: output_dir.join(&outcome.snapshot.file),
            changes: outcome.describe(),
            changes_file: outcome.changes_file,
        });
        sheets.push(SheetSpec::new(cohort.dataset.clone(), subset));
    }

    let workbook = config.resolve(&PathBuf::from(format!(
        "{}_{}.xlsx",
        settings.workbook_prefix,
        now.timestamp()
    )));
    write_workbook(&workbook, &sheets)?;

    info!(elapsed_ms = started.elapsed().as_millis() as u64, "transactions pipeline finished");
    Ok(TransactionsOutcome {
        source,
        rows_read,
        descriptions_fixed,
        non_tickets_removed,
        rows_excluded,
        emails_corrected: corrections.cells_changed,
        columns_dropped: dropped.len(),
        unassigned: table.len().saturating_sub(assigned),
        cohorts,
        workbook,
    })
}
