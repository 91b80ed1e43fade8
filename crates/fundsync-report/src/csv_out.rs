use std::path::Path;

use fundsync_model::Table;

use crate::atomic::write_atomic;
use crate::error::{ReportError, Result};

/// Serializes a table as CSV: header row, then rendered cell values.
pub fn table_to_csv_bytes(table: &Table) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.render()))?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Writes `table` to `path` as CSV.
pub fn write_csv_table(path: &Path, table: &Table) -> Result<()> {
    let bytes = table_to_csv_bytes(table).map_err(|e| ReportError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_atomic(path, &bytes)?;
    tracing::debug!(path = %path.display(), rows = table.len(), "wrote CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundsync_model::CellValue;

    #[test]
    fn test_csv_quotes_and_numbers() {
        let table = Table::with_rows(
            vec!["Name".into(), "Raised".into()],
            vec![
                vec!["Lee, Jo".into(), CellValue::Number(25.0)],
                vec!["Al".into(), CellValue::Empty],
            ],
        );
        let bytes = table_to_csv_bytes(&table).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Name,Raised\n\"Lee, Jo\",25\nAl,\n"
        );
    }
}
