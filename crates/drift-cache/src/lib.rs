mod entry;
mod key;
mod store;

pub use entry::CacheEntry;
pub use key::{
    DEFAULT_SCHEMA, DecodedKey, INFINITE_PREFIX, KEY_PREFIX, KEY_SEPARATOR, decode, encode,
};
pub use store::{CacheEvent, CacheStore, EventKind};
