use fundsync_model::{CellValue, Table};

use crate::error::{Result, TransformError};

/// Counts non-empty values of `column`.
///
/// Output columns are `[value_header, count_header]`, ordered by descending
/// count with ties kept in first-seen order.
pub fn value_counts(
    table: &Table,
    column: &str,
    value_header: &str,
    count_header: &str,
) -> Result<Table> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| TransformError::missing("value counts", column))?;

    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in table.rows() {
        let value = row[idx].render().trim().to_string();
        if value.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(Table::with_rows(
        vec![value_header.to_string(), count_header.to_string()],
        counts
            .into_iter()
            .map(|(value, n)| vec![CellValue::text(value), CellValue::Number(n as f64)])
            .collect(),
    ))
}

/// Sum of the numeric values in `column`; non-numeric cells count as zero.
pub fn column_total(table: &Table, column: &str) -> Result<f64> {
    let values = table
        .column_values(column)
        .ok_or_else(|| TransformError::missing("total", column))?;
    Ok(values.into_iter().filter_map(CellValue::as_f64).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sorted_by_frequency() {
        let table = Table::with_rows(
            vec!["Size".into()],
            ["M", "L", "L", "", "S", "L", "M"]
                .iter()
                .map(|s| vec![CellValue::text(*s)])
                .collect(),
        );
        let counts = value_counts(&table, "Size", "T-Shirt Size", "Count").unwrap();

        assert_eq!(counts.columns(), ["T-Shirt Size", "Count"]);
        assert_eq!(
            counts.rendered_rows(&["T-Shirt Size", "Count"]),
            vec![
                vec!["L".to_string(), "3".to_string()],
                vec!["M".to_string(), "2".to_string()],
                vec!["S".to_string(), "1".to_string()],
            ]
        );
    }

    #[test]
    fn totals_ignore_text() {
        let table = Table::with_rows(
            vec!["Raised".into()],
            vec![
                vec![CellValue::Number(100.0)],
                vec!["$25.50".into()],
                vec!["n/a".into()],
            ],
        );
        assert_eq!(column_total(&table, "Raised").unwrap(), 125.5);
    }
}
