use std::sync::Arc;

use drift_cache::{CacheEntry, CacheStore, encode};
use drift_pages::{
    Applied, CursorPaginator, CursorSpec, FetchError, LoadMore, OffsetPaginator, PageError,
};
use drift_query::{Row, TableQuery};

use crate::fetcher::Fetcher;

/// What a driven `load_more` did.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A page was fetched and appended; the store was republished.
    Loaded { index: usize, ended: bool },
    /// Nothing left to load.
    Exhausted,
    /// A request was already outstanding; nothing was issued.
    InFlight,
}

/// Offset-paginated list bound to the cache under its infinite key.
///
/// Each successful page load republishes the flattened rows, so table
/// subscribers and mutation reconciliation see one list entry regardless
/// of how many pages were fetched.
pub struct InfiniteQuery {
    store: Arc<CacheStore>,
    source: TableQuery,
    key: String,
    paginator: OffsetPaginator,
}

impl InfiniteQuery {
    pub fn new(store: Arc<CacheStore>, query: TableQuery) -> Result<Self, PageError> {
        let key = encode(&query.parse(), true);
        let paginator = OffsetPaginator::new(query.clone())?;
        Ok(Self {
            store,
            source: query,
            key,
            paginator,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has_more(&self) -> bool {
        self.paginator.has_more()
    }

    pub fn data(&self) -> Vec<Row> {
        self.paginator.rows().cloned().collect()
    }

    /// Drive one load cycle: issue the next request, execute it, apply the
    /// result, publish. Failures surface to the caller and leave both the
    /// paginator and the store at the last good boundary.
    pub fn load_more<F: Fetcher>(&mut self, fetcher: &F) -> Result<LoadOutcome, FetchError> {
        match self.paginator.load_more() {
            LoadMore::Exhausted => Ok(LoadOutcome::Exhausted),
            LoadMore::InFlight | LoadMore::Cached(_) => Ok(LoadOutcome::InFlight),
            LoadMore::Fetch(request) => {
                let result = fetcher
                    .fetch(&request.query)
                    .map(|response| response.rows)
                    .map_err(FetchError::from);
                match self.paginator.apply(request.seq, result) {
                    Applied::Loaded { index, ended } => {
                        self.publish();
                        Ok(LoadOutcome::Loaded { index, ended })
                    }
                    Applied::Failed(err) => Err(err),
                    Applied::Discarded => Ok(LoadOutcome::InFlight),
                }
            }
        }
    }

    fn publish(&self) {
        let rows = self.data();
        self.store
            .set(&self.key, CacheEntry::for_query(&self.source, rows, None));
    }
}

/// Cursor-paginated list bound to the cache under its infinite key.
pub struct CursorQuery {
    store: Arc<CacheStore>,
    source: TableQuery,
    key: String,
    paginator: CursorPaginator,
}

impl CursorQuery {
    pub fn new(
        store: Arc<CacheStore>,
        query: TableQuery,
        spec: CursorSpec,
    ) -> Result<Self, PageError> {
        let key = encode(&query.parse(), true);
        let paginator = CursorPaginator::new(query.clone(), spec)?;
        Ok(Self {
            store,
            source: query,
            key,
            paginator,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has_more(&self) -> bool {
        self.paginator.has_more()
    }

    pub fn data(&self) -> Vec<Row> {
        self.paginator.rows().cloned().collect()
    }

    pub fn load_more<F: Fetcher>(&mut self, fetcher: &F) -> Result<LoadOutcome, FetchError> {
        match self.paginator.load_more() {
            LoadMore::Exhausted => Ok(LoadOutcome::Exhausted),
            LoadMore::InFlight | LoadMore::Cached(_) => Ok(LoadOutcome::InFlight),
            LoadMore::Fetch(request) => {
                let result = fetcher
                    .fetch(&request.query)
                    .map(|response| response.rows)
                    .map_err(FetchError::from);
                match self.paginator.apply(request.seq, result) {
                    Applied::Loaded { index, ended } => {
                        self.publish();
                        Ok(LoadOutcome::Loaded { index, ended })
                    }
                    Applied::Failed(err) => Err(err),
                    Applied::Discarded => Ok(LoadOutcome::InFlight),
                }
            }
        }
    }

    fn publish(&self) {
        let rows = self.data();
        self.store
            .set(&self.key, CacheEntry::for_query(&self.source, rows, None));
    }
}
