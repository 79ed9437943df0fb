use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, Sender};
use imbl::OrdMap;

use crate::entry::CacheEntry;
use crate::key::decode;

type Entries = OrdMap<String, Arc<CacheEntry>>;

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The entry was replaced or patched in place; re-render from the store.
    Updated,
    /// The entry was flagged stale and should be revalidated.
    Invalidated,
}

enum Scope {
    Key(String),
    Table(String),
}

struct Subscriber {
    scope: Scope,
    sender: Sender<CacheEvent>,
}

/// The shared key-addressed cache.
///
/// Reads load an immutable snapshot (cheap due to imbl structural sharing);
/// writes are serialized through a single lock and swap in a new snapshot.
/// All hook instances share one store; keys are the canonical strings
/// produced by [`encode`](crate::encode).
pub struct CacheStore {
    entries: ArcSwap<Entries>,
    write_lock: Mutex<()>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::new(Arc::new(OrdMap::new())),
            write_lock: Mutex::new(()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.load().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.load().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Insert or replace an entry and notify subscribers.
    pub fn set(&self, key: &str, entry: CacheEntry) {
        {
            let _guard = self.write_lock.lock().unwrap();
            let mut next = (**self.entries.load()).clone();
            next.insert(key.to_string(), Arc::new(entry));
            self.entries.store(Arc::new(next));
        }
        self.notify(key, EventKind::Updated);
    }

    /// Patch an entry in place. Returns `false` without side effects when
    /// the key is not resident: patching never creates keys.
    pub fn patch(&self, key: &str, patch: impl FnOnce(&mut CacheEntry)) -> bool {
        let patched = {
            let _guard = self.write_lock.lock().unwrap();
            let mut next = (**self.entries.load()).clone();
            let Some(current) = next.get(key) else {
                return false;
            };
            let mut entry = (**current).clone();
            patch(&mut entry);
            next.insert(key.to_string(), Arc::new(entry));
            self.entries.store(Arc::new(next));
            true
        };
        if patched {
            self.notify(key, EventKind::Updated);
        }
        patched
    }

    /// Flag an entry for background revalidation. No-op for absent keys.
    pub fn mark_stale(&self, key: &str) -> bool {
        let marked = {
            let _guard = self.write_lock.lock().unwrap();
            let mut next = (**self.entries.load()).clone();
            let Some(current) = next.get(key) else {
                return false;
            };
            let mut entry = (**current).clone();
            entry.stale = true;
            next.insert(key.to_string(), Arc::new(entry));
            self.entries.store(Arc::new(next));
            true
        };
        if marked {
            self.notify(key, EventKind::Invalidated);
        }
        marked
    }

    pub fn remove(&self, key: &str) -> bool {
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.entries.load()).clone();
        let removed = next.remove(key).is_some();
        if removed {
            self.entries.store(Arc::new(next));
        }
        removed
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.load().keys().cloned().collect()
    }

    /// Keys of every cached list for one table, across plain and infinite
    /// variants. Foreign keys that do not decode are skipped.
    pub fn keys_for_table(&self, schema: &str, table: &str) -> Vec<String> {
        self.entries
            .load()
            .keys()
            .filter(|key| {
                decode(key).is_some_and(|decoded| {
                    decoded.schema == schema && decoded.table == table
                })
            })
            .cloned()
            .collect()
    }

    /// Subscribe to changes of one exact key.
    pub fn subscribe_key(&self, key: impl Into<String>) -> Receiver<CacheEvent> {
        self.subscribe(Scope::Key(key.into()))
    }

    /// Subscribe to changes of every key that addresses the given table,
    /// regardless of query shape.
    pub fn subscribe_table(&self, table: impl Into<String>) -> Receiver<CacheEvent> {
        self.subscribe(Scope::Table(table.into()))
    }

    fn subscribe(&self, scope: Scope) -> Receiver<CacheEvent> {
        let (sender, receiver) = crossbeam::channel::unbounded();
        self.subscribers
            .lock()
            .unwrap()
            .push(Subscriber { scope, sender });
        receiver
    }

    fn notify(&self, key: &str, kind: EventKind) {
        let table = decode(key).map(|decoded| decoded.table.to_string());
        let event = CacheEvent {
            key: key.to_string(),
            kind,
        };
        // Dropped receivers are pruned as sends fail.
        self.subscribers.lock().unwrap().retain(|sub| {
            let matched = match &sub.scope {
                Scope::Key(k) => k == key,
                Scope::Table(t) => table.as_deref() == Some(t),
            };
            if !matched {
                return true;
            }
            sub.sender.send(event.clone()).is_ok()
        });
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
