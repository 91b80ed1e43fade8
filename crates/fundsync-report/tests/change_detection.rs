use chrono::{DateTime, TimeZone, Utc};
use fundsync_model::{CellValue, Table};
use fundsync_report::{SnapshotRegistry, detect_changes};
use tempfile::TempDir;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn cohort(emails: &[&str]) -> Table {
    Table::with_rows(
        vec!["Email".into(), "Item Description".into(), "Amount".into()],
        emails
            .iter()
            .map(|e| {
                vec![
                    CellValue::text(*e),
                    "MV Volunteer".into(),
                    CellValue::Number(25.0),
                ]
            })
            .collect(),
    )
}

#[test]
fn changes_file_holds_only_the_new_row() {
    let dir = TempDir::new().unwrap();
    let mut registry = SnapshotRegistry::open(dir.path()).unwrap();

    let first = detect_changes(&mut registry, "Volunteer", &cohort(&["a@x.com"]), at(100)).unwrap();
    assert!(first.previous.is_none());
    assert_eq!(first.describe(), "first snapshot");

    let same = detect_changes(&mut registry, "Volunteer", &cohort(&["a@x.com"]), at(200)).unwrap();
    assert!(same.changes_file.is_none());
    assert_eq!(same.describe(), "no changes");

    let grown = detect_changes(
        &mut registry,
        "Volunteer",
        &cohort(&["a@x.com", "b@x.com"]),
        at(300),
    )
    .unwrap();
    let changes_file = grown.changes_file.clone().unwrap();
    assert_eq!(
        changes_file.file_name().unwrap().to_str().unwrap(),
        "changes_Volunteer_300.csv"
    );
    assert_eq!(
        std::fs::read_to_string(&changes_file).unwrap(),
        "Change,Email,Item Description,Amount\nadded,b@x.com,MV Volunteer,25\n"
    );
    assert_eq!(grown.describe(), "1 added, 0 removed");
}

#[test]
fn datasets_are_compared_independently() {
    let dir = TempDir::new().unwrap();
    let mut registry = SnapshotRegistry::open(dir.path()).unwrap();

    detect_changes(&mut registry, "Reciprocal", &cohort(&["r@x.com"]), at(10)).unwrap();
    let other = detect_changes(&mut registry, "Volunteer", &cohort(&["v@x.com"]), at(20)).unwrap();

    assert!(other.previous.is_none());
    assert_eq!(registry.records().len(), 2);
}

#[test]
fn every_legacy_dataset_is_compared_with_its_newest_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("NewAndReturning_100.csv"),
        "Email,Item Description,Amount\nn@x.com,MV Volunteer,25\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("Volunteer_100.csv"),
        "Email,Item Description,Amount\nv@x.com,MV Volunteer,25\n",
    )
    .unwrap();
    let mut registry = SnapshotRegistry::open(dir.path()).unwrap();

    let first =
        detect_changes(&mut registry, "NewAndReturning", &cohort(&["n@x.com"]), at(200)).unwrap();
    let second = detect_changes(
        &mut registry,
        "Volunteer",
        &cohort(&["v@x.com", "w@x.com"]),
        at(200),
    )
    .unwrap();

    assert_eq!(first.describe(), "no changes");
    assert!(second.previous.is_some());
    assert_eq!(second.describe(), "1 added, 0 removed");
    assert!(second.changes_file.is_some());
}
