use std::fmt;

use drift_query::Row;

/// A completed write, carrying the affected row(s) as returned by it.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Insert(Vec<Row>),
    UpdateOne(Row),
    Upsert(Vec<Row>),
    DeleteOne(Row),
}

impl MutationOutcome {
    /// The written rows, regardless of operation kind.
    pub fn rows(&self) -> &[Row] {
        match self {
            MutationOutcome::Insert(rows) | MutationOutcome::Upsert(rows) => rows,
            MutationOutcome::UpdateOne(row) | MutationOutcome::DeleteOne(row) => {
                std::slice::from_ref(row)
            }
        }
    }
}

type PatchedCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Scope and identity configuration for one reconciliation pass.
///
/// `primary_keys` names the columns that identify a row; rows match when
/// every primary-key column is equal. `on_patched` is invoked once per
/// cache key that was patched.
pub struct MutateConfig {
    pub schema: Option<String>,
    pub table: String,
    pub primary_keys: Vec<String>,
    pub on_patched: Option<PatchedCallback>,
}

impl MutateConfig {
    pub fn new(table: impl Into<String>, primary_keys: Vec<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            primary_keys,
            on_patched: None,
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn on_patched(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_patched = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for MutateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutateConfig")
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("primary_keys", &self.primary_keys)
            .field("on_patched", &self.on_patched.as_ref().map(|_| ".."))
            .finish()
    }
}
