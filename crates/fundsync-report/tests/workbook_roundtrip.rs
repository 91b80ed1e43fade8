//! Workbook output read back through the ingest loader.

use fundsync_ingest::read_xlsx_tables;
use fundsync_model::{CellValue, Table};
use fundsync_report::{ReportError, SheetSpec, SummaryBlock, write_workbook};
use fundsync_transform::{SheetLabeler, split_by_column};
use tempfile::TempDir;

fn tickets() -> Table {
    let rows = [
        ("T100", "2025 - Rider", "Jo", "M"),
        ("T101", "2025 - Volunteer", "Al", "L"),
        ("T102", "2025 - Rider", "Bo", ""),
        ("T103", "2025 - MV New / Returning", "Cy", "L"),
        ("T104", "2025 - Rider", "Bo", ""),
    ];
    Table::with_rows(
        vec![
            "Ticket ID".into(),
            "Ticket Type".into(),
            "First Name".into(),
            "Size".into(),
        ],
        rows.iter()
            .map(|(id, ty, name, size)| {
                vec![
                    CellValue::text(*id),
                    CellValue::text(*ty),
                    CellValue::text(*name),
                    CellValue::text(*size),
                ]
            })
            .collect(),
    )
}

fn sorted_rows(table: &Table, columns: &[&str]) -> Vec<Vec<String>> {
    let mut rows = table.rendered_rows(columns);
    rows.sort();
    rows
}

#[test]
fn split_write_read_concatenate_preserves_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parsed_tickets.xlsx");
    let table = tickets();

    let outcome = split_by_column(&table, "Ticket Type", &SheetLabeler::ticket_types()).unwrap();
    let sheets: Vec<SheetSpec> = outcome
        .groups
        .iter()
        .map(|g| SheetSpec::new(g.label.clone(), g.table.clone()))
        .collect();
    let stats = write_workbook(&path, &sheets).unwrap();
    assert_eq!(stats.sheets, 3);

    let read_back = read_xlsx_tables(&path, None).unwrap();
    let names: Vec<&str> = read_back.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Rider", "Volunteer", "MV New Returning"]);

    let mut combined = Table::new(table.columns().to_vec());
    for (_, sheet) in &read_back {
        combined.append(sheet);
    }
    let columns = ["Ticket ID", "Ticket Type", "First Name", "Size"];
    assert_eq!(sorted_rows(&combined, &columns), sorted_rows(&table, &columns));
}

#[test]
fn summary_rows_and_tables_are_written_below_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Fundraising_Progress.xlsx");
    let members = Table::with_rows(
        vec!["First Name".into(), "Raised".into()],
        vec![
            vec!["Jo".into(), CellValue::Number(120.0)],
            vec!["Al".into(), CellValue::Number(30.5)],
        ],
    );
    let counts = Table::with_rows(
        vec!["T-Shirt Size".into(), "Count".into()],
        vec![vec!["L".into(), CellValue::Number(2.0)]],
    );
    let sheet = SheetSpec::new("Members", members)
        .with_summary(SummaryBlock::Rows(vec![vec![
            "Total Raised".into(),
            CellValue::Number(150.5),
        ]]))
        .with_summary(SummaryBlock::Table(counts));
    write_workbook(&path, &[sheet]).unwrap();

    let read_back = read_xlsx_tables(&path, None).unwrap();
    let grid = &read_back[0].1;
    // Header row is consumed as the column set; the blank spacer row is skipped.
    assert_eq!(grid.len(), 5);
    assert_eq!(grid.rows()[2][0].render(), "Total Raised");
    assert_eq!(grid.rows()[2][1], CellValue::Number(150.5));
    assert_eq!(grid.rows()[3][0].render(), "T-Shirt Size");
    assert_eq!(grid.rows()[4][1], CellValue::Number(2.0));
}

#[test]
fn invalid_label_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.xlsx");

    let err = write_workbook(&path, &[SheetSpec::new("Rider?", tickets())]).unwrap_err();

    assert!(matches!(err, ReportError::InvalidSheet(_)));
    assert!(!path.exists());
}
