use drift_query::{ParsedQuery, Row};

use crate::error::ClientError;

/// Result of executing one request: the rows and, when a count mode was
/// requested, the remote's total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResponse {
    pub rows: Vec<Row>,
    pub total: Option<u64>,
}

/// Executes parsed queries against the remote. Transport policy (auth,
/// retries) lives behind implementations of this trait.
pub trait Fetcher {
    fn fetch(&self, query: &ParsedQuery) -> Result<FetchResponse, ClientError>;
}
