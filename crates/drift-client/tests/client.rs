use std::cell::Cell;
use std::sync::Arc;

use drift_cache::{CacheStore, EventKind, decode};
use drift_client::{
    CachedQuery, ClientError, CursorQuery, FetchResponse, Fetcher, InfiniteQuery, LoadOutcome,
};
use drift_pages::CursorSpec;
use drift_query::{ParsedQuery, Row, SortDirection, TableQuery};
use serde_json::json;

/// Serves a fixed ascending-by-username table. Honors the `limit`/`offset`
/// of the parsed query plus any `username=gt.<cursor>` pair the cursor
/// paginator derives.
struct FakeFetcher {
    rows: Vec<Row>,
    calls: Cell<usize>,
    fail_next: Cell<bool>,
}

impl FakeFetcher {
    fn new(names: &[&str]) -> Self {
        let rows = names
            .iter()
            .map(|name| {
                json!({ "id": name, "username": name })
                    .as_object()
                    .unwrap()
                    .clone()
            })
            .collect();
        Self {
            rows,
            calls: Cell::new(0),
            fail_next: Cell::new(false),
        }
    }

    fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, query: &ParsedQuery) -> Result<FetchResponse, ClientError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_next.replace(false) {
            return Err(ClientError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        let cursor = query.query.split('&').find_map(|pair| {
            pair.strip_prefix("username=gt.").map(|c| c.to_string())
        });

        let mut rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|row| match &cursor {
                None => true,
                Some(cursor) => row["username"].as_str().unwrap() > cursor.as_str(),
            })
            .cloned()
            .collect();

        let offset = query.offset.unwrap_or(0).min(rows.len());
        rows.drain(..offset);
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(FetchResponse {
            rows,
            total: Some(self.rows.len() as u64),
        })
    }
}

fn usernames(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|row| row["username"].as_str().unwrap().to_string())
        .collect()
}

fn base() -> TableQuery {
    TableQuery::table("contact")
        .select("id,username")
        .order("username", SortDirection::Asc)
        .limit(1)
}

#[test]
fn disabled_query_never_fetches() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1"]);
    let query = CachedQuery::new(Arc::clone(&store), None);

    assert!(!query.is_enabled());
    assert!(!query.is_loading());
    assert!(query.data().is_empty());
    assert!(query.get_or_fetch(&fetcher).unwrap().is_none());
    assert_eq!(fetcher.calls(), 0);
}

#[test]
fn cached_entry_is_served_without_a_refetch() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1", "user-2"]);
    let query = CachedQuery::new(Arc::clone(&store), Some(base().limit(10)));

    assert!(query.is_loading());
    let first = query.get_or_fetch(&fetcher).unwrap().unwrap();
    assert_eq!(usernames(&first.rows), ["user-1", "user-2"]);
    assert_eq!(fetcher.calls(), 1);
    assert!(!query.is_loading());

    let second = query.get_or_fetch(&fetcher).unwrap().unwrap();
    assert_eq!(second.rows, first.rows);
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn stale_entry_triggers_revalidation() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1"]);
    let query = CachedQuery::new(Arc::clone(&store), Some(base().limit(10)));

    query.get_or_fetch(&fetcher).unwrap();
    store.mark_stale(query.key().unwrap());
    let entry = query.get_or_fetch(&fetcher).unwrap().unwrap();
    assert!(!entry.stale);
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn infinite_query_grows_and_exhausts() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1", "user-2", "user-3", "user-4"]);
    let mut list = InfiniteQuery::new(Arc::clone(&store), base()).unwrap();

    let mut snapshots = Vec::new();
    for _ in 0..4 {
        list.load_more(&fetcher).unwrap();
        snapshots.push(usernames(&list.data()));
    }
    assert_eq!(snapshots[0], ["user-1"]);
    assert_eq!(snapshots[3], ["user-1", "user-2", "user-3", "user-4"]);

    // the fifth load learns the list is complete without changing the data
    let outcome = list.load_more(&fetcher).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { index: 4, ended: true });
    assert_eq!(list.data().len(), 4);
    assert!(!list.has_more());
    assert_eq!(list.load_more(&fetcher).unwrap(), LoadOutcome::Exhausted);
    assert_eq!(fetcher.calls(), 5);
}

#[test]
fn infinite_query_publishes_flattened_rows_under_infinite_key() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1", "user-2"]);
    let mut list = InfiniteQuery::new(Arc::clone(&store), base()).unwrap();

    let events = store.subscribe_key(list.key());
    list.load_more(&fetcher).unwrap();
    list.load_more(&fetcher).unwrap();

    let decoded = decode(list.key()).unwrap();
    assert!(decoded.is_infinite);

    let entry = store.get(list.key()).unwrap();
    assert_eq!(usernames(&entry.rows), ["user-1", "user-2"]);

    let kinds: Vec<_> = events.try_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [EventKind::Updated, EventKind::Updated]);
}

#[test]
fn failed_page_load_is_surfaced_and_resumable() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1", "user-2"]);
    let mut list = InfiniteQuery::new(Arc::clone(&store), base()).unwrap();

    list.load_more(&fetcher).unwrap();
    fetcher.fail_next.set(true);
    let err = list.load_more(&fetcher).unwrap_err();
    assert_eq!(err.status, Some(503));

    // the store still holds the last good boundary
    assert_eq!(usernames(&store.get(list.key()).unwrap().rows), ["user-1"]);

    // retrying picks up where the failure happened
    list.load_more(&fetcher).unwrap();
    assert_eq!(usernames(&list.data()), ["user-1", "user-2"]);
}

#[test]
fn cursor_query_stops_at_until() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1", "user-2", "user-3", "user-4"]);
    let spec = CursorSpec::new("username").unwrap().until("user-2");
    let mut list = CursorQuery::new(Arc::clone(&store), base(), spec).unwrap();

    list.load_more(&fetcher).unwrap();
    list.load_more(&fetcher).unwrap();
    assert_eq!(usernames(&list.data()), ["user-1", "user-2"]);

    assert_eq!(list.load_more(&fetcher).unwrap(), LoadOutcome::Exhausted);
    assert!(!list.has_more());
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(usernames(&store.get(list.key()).unwrap().rows), ["user-1", "user-2"]);
}

#[test]
fn cursor_query_walks_past_each_cursor() {
    let store = Arc::new(CacheStore::new());
    let fetcher = FakeFetcher::new(&["user-1", "user-2", "user-3"]);
    let spec = CursorSpec::new("username").unwrap();
    let mut list = CursorQuery::new(Arc::clone(&store), base(), spec).unwrap();

    list.load_more(&fetcher).unwrap();
    list.load_more(&fetcher).unwrap();
    list.load_more(&fetcher).unwrap();
    assert_eq!(usernames(&list.data()), ["user-1", "user-2", "user-3"]);
}
