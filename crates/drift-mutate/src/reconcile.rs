use std::cmp::Ordering;
use std::fmt;

use drift_cache::{CacheEntry, CacheStore, DEFAULT_SCHEMA, decode};
use drift_query::{EvalError, Row, Sort, SortDirection, compare_values, matches_row};

use crate::operation::{MutateConfig, MutationOutcome};

/// Why a cached list was left unpatched and flagged for revalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The outcome row does not carry a primary-key column.
    MissingPrimaryKey(String),
    /// The list's filter could not be evaluated against the row's shape.
    Unevaluable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingPrimaryKey(column) => {
                write!(f, "outcome row is missing primary key column: {column}")
            }
            SkipReason::Unevaluable(message) => {
                write!(f, "list filter is unevaluable: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub key: String,
    pub reason: SkipReason,
}

/// What one reconciliation pass did: which keys were patched in place and
/// which were skipped (and marked stale) instead.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub patched: Vec<String>,
    pub skipped: Vec<Skipped>,
}

enum Action {
    Untouched,
    Patched(CacheEntry),
    Skip(SkipReason),
}

/// Patch every cached list of the mutated table in place.
///
/// No network round trip: only entries already resident in the store are
/// touched, and no new keys are created. Lists whose filter cannot be
/// judged against the written row are skipped and flagged stale rather
/// than guessed at. Patching notifies subscribers through the store, so
/// overlapping keys re-render from the patched value.
pub fn reconcile(
    store: &CacheStore,
    config: &MutateConfig,
    outcome: &MutationOutcome,
) -> ReconcileReport {
    let schema = config.schema.as_deref().unwrap_or(DEFAULT_SCHEMA);
    let mut report = ReconcileReport::default();

    for key in store.keys_for_table(schema, &config.table) {
        let Some(decoded) = decode(&key) else {
            continue;
        };
        let is_head = decoded.is_head;
        let Some(entry) = store.get(&key) else {
            continue;
        };

        match apply_to_entry(&entry, is_head, config, outcome) {
            Action::Untouched => {}
            Action::Patched(patched) => {
                if store.patch(&key, move |entry| *entry = patched) {
                    if let Some(callback) = &config.on_patched {
                        callback(&key);
                    }
                    report.patched.push(key);
                }
            }
            Action::Skip(reason) => {
                store.mark_stale(&key);
                report.skipped.push(Skipped { key, reason });
            }
        }
    }

    report
}

fn apply_to_entry(
    entry: &CacheEntry,
    is_head: bool,
    config: &MutateConfig,
    outcome: &MutationOutcome,
) -> Action {
    match outcome {
        MutationOutcome::DeleteOne(row) => delete_one(entry, is_head, config, row),
        MutationOutcome::UpdateOne(row) => update_one(entry, is_head, config, row),
        MutationOutcome::Insert(rows) => insert_rows(entry, is_head, config, rows, false),
        MutationOutcome::Upsert(rows) => insert_rows(entry, is_head, config, rows, true),
    }
}

fn delete_one(entry: &CacheEntry, is_head: bool, config: &MutateConfig, row: &Row) -> Action {
    if let Err(reason) = check_primary_keys(config, row) {
        return Action::Skip(reason);
    }

    if is_head {
        // no rows to locate; maintain the count from the filter alone
        return match matches_row(&entry.filters, row) {
            Err(e) => Action::Skip(unevaluable(e)),
            Ok(false) => Action::Untouched,
            Ok(true) => adjust_total(entry, -1),
        };
    }

    let mut patched = entry.clone();
    let before = patched.rows.len();
    patched.rows.retain(|resident| !pk_matches(config, resident, row));
    let removed = before - patched.rows.len();
    if removed == 0 {
        return Action::Untouched;
    }
    if let Some(total) = patched.total {
        patched.total = Some(total.saturating_sub(removed as u64));
    }
    // a list emptied by the delete stays resident as an empty list
    Action::Patched(patched)
}

fn update_one(entry: &CacheEntry, is_head: bool, config: &MutateConfig, row: &Row) -> Action {
    if let Err(reason) = check_primary_keys(config, row) {
        return Action::Skip(reason);
    }
    if is_head {
        // an update never changes which rows match, so the count holds
        return Action::Untouched;
    }

    let Some(index) = entry
        .rows
        .iter()
        .position(|resident| pk_matches(config, resident, row))
    else {
        // update never changes list membership; an absent row stays absent
        return Action::Untouched;
    };

    let mut patched = entry.clone();
    merge_row(&mut patched.rows[index], row);
    Action::Patched(patched)
}

fn insert_rows(
    entry: &CacheEntry,
    is_head: bool,
    config: &MutateConfig,
    rows: &[Row],
    upsert: bool,
) -> Action {
    if is_head {
        return insert_into_head(entry, rows, upsert);
    }

    let mut patched = entry.clone();
    let mut changed = false;

    for row in rows {
        if let Err(reason) = check_primary_keys(config, row) {
            return Action::Skip(reason);
        }

        if let Some(index) = patched
            .rows
            .iter()
            .position(|resident| pk_matches(config, resident, row))
        {
            // already present (upsert of an existing row): merge in place
            merge_row(&mut patched.rows[index], row);
            changed = true;
            continue;
        }

        match matches_row(&patched.filters, row) {
            Err(e) => return Action::Skip(unevaluable(e)),
            Ok(false) => {}
            Ok(true) => {
                let index = insertion_index(&patched.rows, row, &patched.sort);
                patched.rows.insert(index, row.clone());
                if let Some(total) = patched.total {
                    patched.total = Some(total + 1);
                }
                changed = true;
            }
        }
    }

    if changed {
        Action::Patched(patched)
    } else {
        Action::Untouched
    }
}

fn insert_into_head(entry: &CacheEntry, rows: &[Row], upsert: bool) -> Action {
    // A count-only entry has no resident rows to dedupe against, so an
    // upsert is ambiguous between insert and update; revalidate instead.
    if upsert {
        return Action::Skip(SkipReason::Unevaluable(
            "upsert against a count-only entry".to_string(),
        ));
    }

    let mut added = 0i64;
    for row in rows {
        match matches_row(&entry.filters, row) {
            Err(e) => return Action::Skip(unevaluable(e)),
            Ok(true) => added += 1,
            Ok(false) => {}
        }
    }
    if added == 0 {
        return Action::Untouched;
    }
    adjust_total(entry, added)
}

fn adjust_total(entry: &CacheEntry, delta: i64) -> Action {
    let Some(total) = entry.total else {
        return Action::Untouched;
    };
    let mut patched = entry.clone();
    patched.total = Some(if delta < 0 {
        total.saturating_sub(delta.unsigned_abs())
    } else {
        total + delta as u64
    });
    Action::Patched(patched)
}

fn unevaluable(error: EvalError) -> SkipReason {
    SkipReason::Unevaluable(error.to_string())
}

fn check_primary_keys(config: &MutateConfig, row: &Row) -> Result<(), SkipReason> {
    for column in &config.primary_keys {
        if !row.contains_key(column) {
            return Err(SkipReason::MissingPrimaryKey(column.clone()));
        }
    }
    Ok(())
}

fn pk_matches(config: &MutateConfig, a: &Row, b: &Row) -> bool {
    !config.primary_keys.is_empty()
        && config.primary_keys.iter().all(|column| {
            match (a.get(column), b.get(column)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        })
}

fn merge_row(target: &mut Row, update: &Row) {
    for (column, value) in update {
        target.insert(column.clone(), value.clone());
    }
}

/// Position implied by the list's order keys: after every row that does
/// not sort strictly greater than the new one. Lists with no order append.
fn insertion_index(rows: &[Row], row: &Row, sort: &[Sort]) -> usize {
    if sort.is_empty() {
        return rows.len();
    }
    rows.partition_point(|resident| cmp_rows(resident, row, sort) != Ordering::Greater)
}

fn cmp_rows(a: &Row, b: &Row, sort: &[Sort]) -> Ordering {
    for key in sort {
        let ordering = match (a.get(&key.field), b.get(&key.field)) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
