use fundsync_model::Table;
use serde::{Deserialize, Serialize};

use crate::filter::RowFilter;

/// Per-pipeline cleanup knobs shared by every pipeline variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineProfile {
    /// Columns dropped before writing; absent names are ignored.
    pub drop_columns: Vec<String>,
    /// Rows matching this predicate are removed.
    pub exclude: Option<RowFilter>,
    /// Remove remote group memberships absent from the batch when this
    /// pipeline syncs contacts. Only `managed_groups` are ever touched.
    pub reconcile_removals: bool,
}

impl PipelineProfile {
    /// Applies the exclusion predicate and the drop-list.
    ///
    /// Returns `(rows removed, columns dropped)`.
    pub fn apply(&self, table: &mut Table) -> (usize, Vec<String>) {
        let excluded = self
            .exclude
            .as_ref()
            .map_or(0, |filter| filter.exclude(table));
        let dropped = table.drop_columns(&self.drop_columns);
        tracing::debug!(
            excluded,
            dropped = dropped.len(),
            "applied pipeline profile"
        );
        (excluded, dropped)
    }
}
