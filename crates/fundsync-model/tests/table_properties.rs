use fundsync_model::{CellValue, SheetName, Table, sanitize_sheet_name};
use proptest::prelude::*;

proptest! {
    #[test]
    fn sanitized_names_are_valid_or_empty(raw in "\\PC{0,64}") {
        let cleaned = sanitize_sheet_name(&raw);
        prop_assert!(cleaned.chars().count() <= 31);
        prop_assert!(!cleaned.contains(['[', ']', ':', '*', '?', '\\', '/']));
        if !cleaned.trim().is_empty() {
            prop_assert!(SheetName::new(cleaned).is_ok());
        }
    }

    #[test]
    fn drop_columns_keeps_rows_aligned(
        rows in prop::collection::vec(prop::collection::vec("[a-z]{0,3}", 3), 0..8),
    ) {
        let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let table = Table::with_rows(
            columns,
            rows.iter()
                .map(|r| r.iter().map(|v| CellValue::text(v.as_str())).collect())
                .collect(),
        );
        let mut dropped = table.clone();
        dropped.drop_columns(&["b"]);
        prop_assert_eq!(dropped.len(), table.len());
        prop_assert_eq!(dropped.rendered_rows(&["a", "c"]), table.rendered_rows(&["a", "c"]));
    }
}

#[test]
fn table_serializes_as_json() {
    let table = Table::with_rows(
        vec!["Name".to_string(), "Raised".to_string()],
        vec![vec!["Jo".into(), CellValue::Number(25.0)]],
    );
    let json = serde_json::to_string(&table).unwrap();
    let back: Table = serde_json::from_str(&json).unwrap();
    assert_eq!(back, table);
}
