use drift_query::{Filter, Row, Sort, TableQuery};

/// One cached result: the resident rows plus the filter/order description
/// that produced them.
///
/// The description is what mutation reconciliation evaluates when deciding
/// whether a written row belongs in this list; `total` carries the remote's
/// count result when one was requested (head-only entries have a total and
/// no rows). `stale` marks an entry that should be revalidated in the
/// background, set when a reconciliation pass could not be applied safely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    pub rows: Vec<Row>,
    pub total: Option<u64>,
    pub filters: Vec<Filter>,
    pub sort: Vec<Sort>,
    pub stale: bool,
}

impl CacheEntry {
    pub fn new(rows: Vec<Row>, total: Option<u64>) -> Self {
        Self {
            rows,
            total,
            filters: Vec::new(),
            sort: Vec::new(),
            stale: false,
        }
    }

    /// Build an entry for a query's result, capturing the query's filter
    /// and order description for later reconciliation.
    pub fn for_query(query: &TableQuery, rows: Vec<Row>, total: Option<u64>) -> Self {
        Self {
            rows,
            total,
            filters: query.filters.clone(),
            sort: query.sort.clone(),
            stale: false,
        }
    }
}
