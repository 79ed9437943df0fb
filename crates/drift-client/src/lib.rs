mod error;
mod fetcher;
mod http;
mod infinite;
mod query;

pub use error::ClientError;
pub use fetcher::{FetchResponse, Fetcher};
pub use http::PostgrestHttp;
pub use infinite::{CursorQuery, InfiniteQuery, LoadOutcome};
pub use query::CachedQuery;
