use serde::{Deserialize, Serialize};

/// How the remote should count total rows for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    Exact,
    Planned,
    Estimated,
}

impl CountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountMode::Exact => "exact",
            CountMode::Planned => "planned",
            CountMode::Estimated => "estimated",
        }
    }

    /// Parse the token that appears after `count=` in a cache key.
    pub fn from_token(token: &str) -> Option<CountMode> {
        match token {
            "exact" => Some(CountMode::Exact),
            "planned" => Some(CountMode::Planned),
            "estimated" => Some(CountMode::Estimated),
            _ => None,
        }
    }
}

/// The immutable description of one request, as produced by
/// [`TableQuery::parse`](crate::TableQuery::parse).
///
/// `query` and `body` are canonical serializations: equal queries produce
/// byte-equal strings regardless of the order builder calls were made in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub schema: Option<String>,
    pub table: String,
    pub query: String,
    pub body: String,
    pub count: Option<CountMode>,
    pub head: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
