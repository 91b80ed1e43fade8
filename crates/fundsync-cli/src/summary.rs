use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fundsync_cli::pipeline::{
    AccountSync, ContactsOutcome, FundraisingOutcome, SheetCount, TicketsOutcome,
    TransactionsOutcome, UploadResult,
};
use fundsync_model::format_number;

pub fn print_tickets(outcome: &TicketsOutcome) {
    println!("Source: {}", outcome.source.display());
    println!(
        "Rows: {} read, {} excluded, {} columns dropped",
        outcome.rows_read, outcome.rows_excluded, outcome.columns_dropped
    );
    println!("Workbook: {}", outcome.workbook.display());
    print_sheets(&outcome.sheets, outcome.tshirt_rows);
    if !outcome.collisions.is_empty() {
        println!();
        println!("Label collisions:");
        for collision in &outcome.collisions {
            println!(
                "- '{}' → '{}' (wanted '{}')",
                collision.raw_value, collision.assigned_label, collision.base_label
            );
        }
    }
    if let Some(upload) = &outcome.upload {
        print_upload(upload);
    }
    if let Some(export) = &outcome.contacts {
        println!(
            "Contact export: {} ({} rows from {})",
            export.path.display(),
            export.rows,
            if export.sheets.is_empty() {
                "no sheets".to_string()
            } else {
                export.sheets.join(", ")
            }
        );
    }
    print_accounts(&outcome.sync);
}

pub fn print_transactions(outcome: &TransactionsOutcome) {
    println!("Source: {}", outcome.source.display());
    println!(
        "Rows: {} read, {} non-ticket removed, {} excluded, {} unassigned",
        outcome.rows_read, outcome.non_tickets_removed, outcome.rows_excluded, outcome.unassigned
    );
    println!(
        "Fixes: {} descriptions, {} team member emails, {} columns dropped",
        outcome.descriptions_fixed, outcome.emails_corrected, outcome.columns_dropped
    );
    println!("Workbook: {}", outcome.workbook.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Cohort"),
        header_cell("Rows"),
        header_cell("Snapshot"),
        header_cell("Changes"),
        header_cell("Changes file"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for cohort in &outcome.cohorts {
        let changes = if cohort.changes_file.is_some() {
            Cell::new(&cohort.changes)
                .fg(Color::Yellow)
                .add_attribute(Attribute::Bold)
        } else {
            dim_cell(&cohort.changes)
        };
        table.add_row(vec![
            Cell::new(&cohort.dataset)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(cohort.rows),
            Cell::new(file_name(&cohort.snapshot)),
            changes,
            cohort
                .changes_file
                .as_deref()
                .map_or_else(|| dim_cell("-"), |path| Cell::new(file_name(path))),
        ]);
    }
    println!("{table}");
}

pub fn print_fundraising(outcome: &FundraisingOutcome) {
    let reports = &outcome.reports;
    println!("Campaign: {} ({})", outcome.campaign.name, outcome.campaign.id);
    println!(
        "Members: {} in {}, total raised {}",
        reports.members,
        reports.members_file.display(),
        format_number(reports.total_raised)
    );
    match &reports.tickets_file {
        Some(path) => println!("Tickets: {} in {}", reports.tickets, path.display()),
        None => println!("Tickets: none for this year"),
    }
    print_sheets(&reports.ticket_sheets, None);
    if let Some(upload) = &outcome.upload {
        print_upload(upload);
    }
}

pub fn print_contacts(outcome: &ContactsOutcome) {
    println!(
        "Contact export: {} ({} records)",
        outcome.export_file.display(),
        outcome.records
    );
    print_accounts(&outcome.accounts);
}

fn print_sheets(sheets: &[SheetCount], tshirt_rows: Option<usize>) {
    if sheets.is_empty() && tshirt_rows.is_none() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Source value"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut total = 0usize;
    for sheet in sheets {
        total += sheet.rows;
        table.add_row(vec![
            Cell::new(&sheet.label)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&sheet.source),
            Cell::new(sheet.rows),
        ]);
    }
    if let Some(rows) = tshirt_rows {
        table.add_row(vec![
            Cell::new("T-Shirt Sizes").fg(Color::DarkGrey),
            dim_cell("(all rows)"),
            dim_cell(rows),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn print_upload(upload: &UploadResult) {
    match &upload.outcome {
        Ok(id) => println!(
            "Uploaded {} to folder {} (file id {id})",
            file_name(&upload.path),
            upload.folder
        ),
        Err(message) => eprintln!("Upload of {} failed: {message}", file_name(&upload.path)),
    }
}

fn print_accounts(accounts: &[AccountSync]) {
    if accounts.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Account"),
        header_cell("Records"),
        header_cell("Groups +"),
        header_cell("Contacts +"),
        header_cell("Members +"),
        header_cell("Already"),
        header_cell("Members -"),
        header_cell("Skipped"),
        header_cell("Failed"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut errors = Vec::new();
    for account in accounts {
        let name = Cell::new(&account.account)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold);
        let row = match &account.outcome {
            Ok(report) => vec![
                name,
                Cell::new(report.records),
                count_cell(report.groups_created, Color::Green),
                count_cell(report.contacts_created, Color::Green),
                count_cell(report.memberships_added, Color::Green),
                dim_cell(report.already_member),
                count_cell(report.memberships_removed, Color::Yellow),
                count_cell(report.skipped_rate_limited, Color::Yellow),
                count_cell(report.failures.len(), Color::Red),
            ],
            Err(message) => {
                errors.push(format!("{}: {message}", account.account));
                let mut row = vec![
                    name,
                    Cell::new("FAILED")
                        .fg(Color::Red)
                        .add_attribute(Attribute::Bold),
                ];
                row.extend((0..7).map(|_| dim_cell("-")));
                row
            }
        };
        table.add_row(row);
    }
    println!("{table}");

    for account in accounts {
        if let Ok(report) = &account.outcome {
            for failure in &report.failures {
                errors.push(format!(
                    "{}: {} for {}: {}",
                    account.account, failure.operation, failure.email, failure.message
                ));
            }
        }
    }
    if !errors.is_empty() {
        eprintln!("Errors:");
        for error in &errors {
            eprintln!("- {error}");
        }
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn count_cell(value: usize, color: Color) -> Cell {
    if value > 0 {
        Cell::new(value).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(value)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
