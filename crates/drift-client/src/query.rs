use std::sync::Arc;

use crossbeam::channel::Receiver;
use drift_cache::{CacheEntry, CacheEvent, CacheStore, encode};
use drift_query::{ParsedQuery, Row, TableQuery};

use crate::error::ClientError;
use crate::fetcher::Fetcher;

/// One logical cached request bound to its canonical key.
///
/// Built from an optional source to support conditional queries: a `None`
/// source is disabled. No fetch ever occurs, `is_loading()` is false and
/// `data()` is empty until a source appears in a rebuilt handle.
pub struct CachedQuery {
    store: Arc<CacheStore>,
    source: Option<Source>,
}

struct Source {
    query: TableQuery,
    parsed: ParsedQuery,
    key: String,
}

impl CachedQuery {
    pub fn new(store: Arc<CacheStore>, source: Option<TableQuery>) -> Self {
        let source = source.map(|query| {
            let parsed = query.parse();
            let key = encode(&parsed, false);
            Source { query, parsed, key }
        });
        Self { store, source }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    pub fn key(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.key.as_str())
    }

    /// The cached entry, stale or not. Stale-while-revalidate: render this
    /// immediately and revalidate in the background.
    pub fn entry(&self) -> Option<Arc<CacheEntry>> {
        let source = self.source.as_ref()?;
        self.store.get(&source.key)
    }

    pub fn data(&self) -> Vec<Row> {
        self.entry().map(|e| e.rows.clone()).unwrap_or_default()
    }

    /// Loading means a fetch is warranted and nothing is cached yet.
    /// Disabled queries are never loading.
    pub fn is_loading(&self) -> bool {
        match &self.source {
            None => false,
            Some(source) => !self.store.contains(&source.key),
        }
    }

    /// Fetch and republish unconditionally. Disabled queries are a no-op.
    pub fn revalidate<F: Fetcher>(&self, fetcher: &F) -> Result<(), ClientError> {
        let Some(source) = &self.source else {
            return Ok(());
        };
        let response = fetcher.fetch(&source.parsed)?;
        let entry = CacheEntry::for_query(&source.query, response.rows, response.total);
        self.store.set(&source.key, entry);
        Ok(())
    }

    /// Serve the cached entry when it is fresh; otherwise fetch, publish
    /// and return the new entry. Disabled queries return `None`.
    pub fn get_or_fetch<F: Fetcher>(
        &self,
        fetcher: &F,
    ) -> Result<Option<Arc<CacheEntry>>, ClientError> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        if let Some(entry) = self.store.get(&source.key) {
            if !entry.stale {
                return Ok(Some(entry));
            }
        }
        self.revalidate(fetcher)?;
        Ok(self.store.get(&source.key))
    }

    /// Events for this query's key. `None` when disabled.
    pub fn subscribe(&self) -> Option<Receiver<CacheEvent>> {
        let source = self.source.as_ref()?;
        Some(self.store.subscribe_key(source.key.clone()))
    }
}
