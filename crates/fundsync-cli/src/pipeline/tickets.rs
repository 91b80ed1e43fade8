//! Ticket export → split-by-type workbook → contact export → sync.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use fundsync_ingest::{find_latest_with_prefix, read_csv_table, require_columns};
use fundsync_model::Table;
use fundsync_report::{SheetSpec, SummaryBlock, write_workbook};
use fundsync_transform::{LabelCollision, SplitOutcome, split_by_column, value_counts};
use tracing::{debug, info, info_span, warn};

use super::SheetCount;
use super::contacts::{ContactExport, export_contacts};
use super::remote::{AccountSync, UploadResult, sync_accounts, upload_report};
use crate::config::{AppConfig, TshirtSheet};

#[derive(Debug)]
pub struct TicketsOutcome {
    pub source: PathBuf,
    pub rows_read: usize,
    pub rows_excluded: usize,
    pub columns_dropped: usize,
    pub sheets: Vec<SheetCount>,
    pub collisions: Vec<LabelCollision>,
    pub tshirt_rows: Option<usize>,
    pub workbook: PathBuf,
    pub upload: Option<UploadResult>,
    pub contacts: Option<ContactExport>,
    pub sync: Vec<AccountSync>,
}

impl TicketsOutcome {
    pub fn is_success(&self) -> bool {
        self.upload.as_ref().is_none_or(UploadResult::is_success)
            && self.sync.iter().all(AccountSync::is_success)
    }
}

/// Detail columns plus a size → count table after a blank row.
fn tshirt_sheet(table: &Table, settings: &TshirtSheet) -> Result<Option<SheetSpec>> {
    if !settings.enabled {
        return Ok(None);
    }
    if !table.has_column(&settings.size_column) {
        warn!(column = %settings.size_column, "no T-shirt size column, skipping size sheet");
        return Ok(None);
    }
    let mut columns = vec![settings.size_column.clone()];
    columns.extend(
        settings
            .detail_columns
            .iter()
            .filter(|column| table.has_column(column))
            .cloned(),
    );
    let detail = table.select(&columns)?;
    let counts = value_counts(
        table,
        &settings.size_column,
        &settings.size_header,
        &settings.count_header,
    )?;
    Ok(Some(
        SheetSpec::new(settings.sheet.clone(), detail).with_summary(SummaryBlock::Table(counts)),
    ))
}

pub fn run_tickets(config: &AppConfig, now: DateTime<Local>) -> Result<TicketsOutcome> {
    let settings = &config.tickets;
    let _span = info_span!("tickets").entered();
    let started = Instant::now();

    let source = find_latest_with_prefix(&config.work_dir, &settings.export_prefix, Some("csv"))
        .context("no ticket export to process")?;
    info!(path = %source.display(), "processing ticket export");
    let mut table = read_csv_table(&source)?;
    let rows_read = table.len();

    let (rows_excluded, dropped) = settings.profile.apply(&mut table);
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    require_columns(&table, &[settings.type_column.as_str()], &source_name)?;

    let SplitOutcome { groups, collisions } =
        split_by_column(&table, &settings.type_column, &settings.labeler)?;
    for collision in &collisions {
        warn!(
            raw = %collision.raw_value,
            label = %collision.assigned_label,
            "ticket types share a sheet label, suffixed"
        );
    }

    let mut sheets = Vec::with_capacity(groups.len() + 1);
    let mut counts = Vec::with_capacity(groups.len());
    for group in groups {
        let mut sheet_table = group.table;
        if settings.drop_empty_columns {
            let empty = sheet_table.drop_empty_columns();
            debug!(sheet = %group.label, dropped = empty.len(), "dropped empty columns");
        }
        counts.push(SheetCount {
            label: group.label.clone(),
            source: group.raw_value,
            rows: sheet_table.len(),
        });
        sheets.push(SheetSpec::new(group.label, sheet_table));
    }
    let tshirt = tshirt_sheet(&table, &settings.tshirt)?;
    let tshirt_rows = tshirt.as_ref().map(|sheet| sheet.table.len());
    sheets.extend(tshirt);

    let workbook = config.work_dir.join(format!(
        "{}_{}.xlsx",
        settings.output_prefix,
        now.format("%m-%d-%Y")
    ));
    write_workbook(&workbook, &sheets)?;

    let upload = config
        .upload
        .folder(settings.upload_folder.as_deref())
        .map(|folder| upload_report(config, folder, &workbook));

    let contacts = if settings.export_contacts {
        Some(export_contacts(config, &workbook)?)
    } else {
        None
    };
    let sync = match &contacts {
        Some(export) if settings.sync_contacts => sync_accounts(
            config,
            &export.records,
            &config.contacts.sync_options_for(&settings.profile),
        ),
        _ => Vec::new(),
    };

    info!(
        rows = rows_read,
        sheets = counts.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tickets pipeline finished"
    );
    Ok(TicketsOutcome {
        source,
        rows_read,
        rows_excluded,
        columns_dropped: dropped.len(),
        sheets: counts,
        collisions,
        tshirt_rows,
        workbook,
        upload,
        contacts,
        sync,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundsync_model::CellValue;

    fn roster() -> Table {
        Table::with_rows(
            ["T-shirt sizing (Unisex)", "First Name", "Email"]
                .map(String::from)
                .to_vec(),
            vec![
                vec!["M".into(), "Jo".into(), "jo@x.com".into()],
                vec!["L".into(), "Al".into(), "al@x.com".into()],
                vec!["M".into(), "Bo".into(), "bo@x.com".into()],
                vec![CellValue::Empty, "Cy".into(), "cy@x.com".into()],
            ],
        )
    }

    #[test]
    fn tshirt_sheet_skips_missing_detail_columns() {
        let sheet = tshirt_sheet(&roster(), &TshirtSheet::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            sheet.table.columns(),
            ["T-shirt sizing (Unisex)", "First Name", "Email"]
        );
        assert_eq!(sheet.table.len(), 4);
        let SummaryBlock::Table(counts) = &sheet.summaries[0] else {
            panic!("expected a summary table");
        };
        assert_eq!(counts.columns(), ["T-Shirt Size", "Count"]);
        assert_eq!(counts.value(0, "T-Shirt Size").unwrap().render(), "M");
        assert_eq!(counts.value(0, "Count").unwrap().render(), "2");
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn tshirt_sheet_absent_without_size_column() {
        let mut table = roster();
        table.drop_columns(&["T-shirt sizing (Unisex)"]);
        assert!(tshirt_sheet(&table, &TshirtSheet::default()).unwrap().is_none());
    }
}
