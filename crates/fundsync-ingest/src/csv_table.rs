//! CSV export reading.

use std::path::Path;

use fundsync_common::{dataframe_to_table, strip_header_noise};
use fundsync_model::Table;
use polars::prelude::*;

use crate::error::{IngestError, Result, open_error};

/// Reads a CSV file into a [`Table`].
///
/// Schema inference is disabled so every cell keeps its exact text; ticket
/// numbers and phone numbers with leading zeros survive unchanged. Header
/// names are normalized and fully blank rows are dropped.
pub fn read_csv_table(path: &Path) -> Result<Table> {
    let metadata = std::fs::metadata(path).map_err(|e| open_error(path, e))?;
    if metadata.len() == 0 {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }

    let parse_error = |e: PolarsError| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)?;

    let columns: Vec<String> = df
        .get_column_names_owned()
        .into_iter()
        .map(|name| strip_header_noise(name.as_str()))
        .collect();
    let table = dataframe_to_table(&df, columns)?;

    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.width(),
        "loaded CSV"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundsync_model::CellValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_csv_keeps_text() {
        let file = create_temp_csv("Ticket ID,Phone\nT100,0123\n");
        let table = read_csv_table(file.path()).unwrap();

        assert_eq!(table.columns(), ["Ticket ID", "Phone"]);
        assert_eq!(table.rows()[0][1], CellValue::Text("0123".to_string()));
    }

    #[test]
    fn test_read_csv_normalizes_headers() {
        let file = create_temp_csv("\u{feff} First Name ,\" Email\"\nJo,jo@x.com\n");
        let table = read_csv_table(file.path()).unwrap();

        assert_eq!(table.columns(), ["First Name", "Email"]);
    }

    #[test]
    fn test_read_csv_skips_blank_rows() {
        let file = create_temp_csv("A,B\n1,2\n,\n3,\n");
        let table = read_csv_table(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][1], CellValue::Empty);
    }

    #[test]
    fn test_read_csv_empty_file() {
        let file = create_temp_csv("");
        let result = read_csv_table(file.path());

        assert!(matches!(result, Err(IngestError::EmptyCsv { .. })));
    }

    #[test]
    fn test_read_csv_missing_file() {
        let result = read_csv_table(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}
