//! Mapping-driven cell corrections.
//!
//! Keyed entries fire on rows whose identifier column matches the entry key;
//! global entries fire on any target cell by exact match. Corrections are
//! followed to a fixed point (`a → b`, `b → c` rewrites `a` to `c`), so
//! [`Reconciler::apply`] is idempotent.

use std::collections::BTreeMap;

use fundsync_model::{CellValue, MappingEntry, RowRef, Table};

type RowPredicate = Box<dyn Fn(RowRef<'_>) -> bool>;

#[derive(Debug, Default)]
struct KeyedRules {
    guarded: BTreeMap<String, String>,
    any: Option<String>,
}

/// Counts reported by a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub rows_eligible: usize,
    pub cells_changed: usize,
}

pub struct Reconciler {
    id_column: Option<String>,
    target_columns: Vec<String>,
    keyed: BTreeMap<String, KeyedRules>,
    global: BTreeMap<String, String>,
    predicate: Option<RowPredicate>,
}

impl Reconciler {
    pub fn new(target_columns: Vec<String>) -> Self {
        Self {
            id_column: None,
            target_columns,
            keyed: BTreeMap::new(),
            global: BTreeMap::new(),
            predicate: None,
        }
    }

    /// Column whose value is matched against keyed entries.
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    /// Only rows accepted by `predicate` are eligible for correction.
    pub fn with_row_predicate(mut self, predicate: impl Fn(RowRef<'_>) -> bool + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn with_entries(mut self, entries: impl IntoIterator<Item = MappingEntry>) -> Self {
        let mut global: BTreeMap<String, String> = BTreeMap::new();
        for entry in entries {
            match (entry.key, entry.incorrect) {
                (Some(key), incorrect) => {
                    let rules = self.keyed.entry(key.trim().to_string()).or_default();
                    let slot = match incorrect {
                        Some(incorrect) => rules.guarded.entry(incorrect).or_default(),
                        None => rules.any.get_or_insert_with(String::new),
                    };
                    keep_smallest(slot, entry.correct);
                }
                (None, Some(incorrect)) => {
                    keep_smallest(global.entry(incorrect).or_default(), entry.correct);
                }
                (None, None) => {
                    tracing::warn!("ignoring mapping entry with neither key nor incorrect value");
                }
            }
        }
        self.global = global;
        self
    }

    pub fn is_noop(&self) -> bool {
        self.keyed.is_empty() && self.global.is_empty()
    }

    fn step<'s>(&'s self, rules: Option<&'s KeyedRules>, value: &'s str) -> &'s str {
        let keyed = rules
            .and_then(|rules| rules.guarded.get(value).or(rules.any.as_ref()))
            .map_or(value, String::as_str);
        self.global.get(keyed).map_or(keyed, String::as_str)
    }

    /// Follows corrections from `current` to a fixed point. Values caught in
    /// a correction cycle are left alone.
    fn correct_value(&self, rules: Option<&KeyedRules>, current: &str) -> Option<String> {
        let mut seen: Vec<&str> = vec![current];
        let mut value = current;
        loop {
            let next = self.step(rules, value);
            if next == value {
                break;
            }
            if seen.contains(&next) {
                tracing::warn!(value = %current, "mapping entries form a cycle; ignoring");
                return None;
            }
            seen.push(next);
            value = next;
        }
        (value != current).then(|| value.to_string())
    }

    /// Rewrites matching cells in place.
    pub fn apply(&self, table: &mut Table) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        if self.is_noop() {
            return stats;
        }

        let targets: Vec<usize> = self
            .target_columns
            .iter()
            .filter_map(|column| {
                let idx = table.column_index(column);
                if idx.is_none() {
                    tracing::debug!(column = %column, "reconcile target column absent; skipping");
                }
                idx
            })
            .collect();
        let id_idx = self.id_column.as_deref().and_then(|c| table.column_index(c));
        if self.id_column.is_some() && id_idx.is_none() && !self.keyed.is_empty() {
            tracing::warn!(
                column = self.id_column.as_deref().unwrap_or_default(),
                "identifier column absent; keyed corrections skipped"
            );
        }

        for row_idx in 0..table.len() {
            let Some(row) = table.row(row_idx) else {
                continue;
            };
            if let Some(predicate) = &self.predicate
                && !predicate(row)
            {
                continue;
            }
            stats.rows_eligible += 1;

            let rules = id_idx.and_then(|idx| {
                let key = row.values()[idx].render();
                self.keyed.get(key.trim())
            });
            let changes: Vec<(usize, String)> = targets
                .iter()
                .filter_map(|col| {
                    let current = row.values()[*col].render();
                    self.correct_value(rules, &current).map(|v| (*col, v))
                })
                .collect();

            for (col, value) in changes {
                table.set_value(row_idx, col, CellValue::text(value));
                stats.cells_changed += 1;
            }
        }

        tracing::debug!(
            rows_eligible = stats.rows_eligible,
            cells_changed = stats.cells_changed,
            "reconciled table"
        );
        stats
    }
}

fn keep_smallest(slot: &mut String, candidate: String) {
    if slot.is_empty() {
        *slot = candidate;
    } else if *slot != candidate {
        tracing::warn!(kept = %slot.as_str().min(candidate.as_str()), "conflicting mapping entries");
        if candidate < *slot {
            *slot = candidate;
        }
    }
}
