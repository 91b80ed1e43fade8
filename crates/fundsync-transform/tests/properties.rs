use fundsync_model::{CellValue, MappingEntry, Table};
use fundsync_transform::{Reconciler, SheetLabeler, split_by_column};
use proptest::prelude::*;

fn labelers() -> Vec<SheetLabeler> {
    vec![
        SheetLabeler::default(),
        SheetLabeler::ticket_types(),
        SheetLabeler::ticket_titles(),
    ]
}

fn small_table(rows: &[(String, String)]) -> Table {
    Table::with_rows(
        vec!["Ticket ID".into(), "Email".into()],
        rows.iter()
            .map(|(id, email)| vec![CellValue::text(id.as_str()), CellValue::text(email.as_str())])
            .collect(),
    )
}

proptest! {
    #[test]
    fn labels_are_sheet_safe(raw in "\\PC{0,80}") {
        for labeler in labelers() {
            let label = labeler.label(&raw);
            prop_assert!(!label.is_empty());
            prop_assert!(label.chars().count() <= 31);
            prop_assert!(!label.contains(['[', ']', ':', '*', '?', '\\', '/']));
        }
    }

    #[test]
    fn split_labels_are_unique_and_safe(
        values in prop::collection::vec("[ab]{0,3}( - |/|:)?[A-Za-z ]{0,40}", 1..20),
    ) {
        let table = Table::with_rows(
            vec!["Type".into()],
            values.iter().map(|v| vec![CellValue::text(v.as_str())]).collect(),
        );
        let outcome = split_by_column(&table, "Type", &SheetLabeler::ticket_types()).unwrap();

        let mut seen = std::collections::HashSet::new();
        for group in &outcome.groups {
            prop_assert!(group.label.chars().count() <= 31);
            prop_assert!(!group.label.contains(['[', ']', ':', '*', '?', '\\', '/']));
            prop_assert!(seen.insert(group.label.to_lowercase()));
        }
        prop_assert_eq!(outcome.total_rows(), table.len());
    }

    #[test]
    fn reconciler_is_idempotent(
        rows in prop::collection::vec(("T[0-3]", "[a-d]@x"), 0..12),
        keyed in prop::collection::vec(("T[0-3]", proptest::option::of("[a-d]@x"), "[a-d]@x"), 0..4),
        global in prop::collection::vec(("[a-d]@x", "[a-d]@x"), 0..4),
    ) {
        let entries: Vec<MappingEntry> = keyed
            .into_iter()
            .map(|(key, incorrect, correct)| MappingEntry { key: Some(key), incorrect, correct })
            .chain(global.into_iter().map(|(from, to)| MappingEntry::global(from, to)))
            .collect();
        let reconciler = Reconciler::new(vec!["Email".into()])
            .with_id_column("Ticket ID")
            .with_entries(entries);

        let mut once = small_table(&rows);
        reconciler.apply(&mut once);
        let mut twice = once.clone();
        let stats = reconciler.apply(&mut twice);

        prop_assert_eq!(stats.cells_changed, 0);
        prop_assert_eq!(once, twice);
    }
}
