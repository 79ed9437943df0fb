use drift_query::{ParsedQuery, Row};

use crate::error::ClientError;
use crate::fetcher::{FetchResponse, Fetcher};

/// Blocking fetcher for a PostgREST-style endpoint.
///
/// Requests are `GET {base}/{table}?{query}` (or `HEAD` for head-only
/// queries); the schema travels in `Accept-Profile` and the count mode in
/// `Prefer`. The total comes back in `Content-Range`.
pub struct PostgrestHttp {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl PostgrestHttp {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            headers: Vec::new(),
        }
    }

    /// Attach a header (e.g. an auth token) to every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl Fetcher for PostgrestHttp {
    fn fetch(&self, query: &ParsedQuery) -> Result<FetchResponse, ClientError> {
        let url = format!("{}/{}?{}", self.base_url, query.table, query.query);

        let mut request = if query.head {
            ureq::head(&url)
        } else {
            ureq::get(&url)
        };
        request = request.header("Accept", "application/json");
        if let Some(schema) = &query.schema {
            request = request.header("Accept-Profile", schema.as_str());
        }
        if let Some(mode) = query.count {
            let prefer = format!("count={}", mode.as_str());
            request = request.header("Prefer", prefer.as_str());
        }
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut response = request.call()?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(content_range_total);

        let rows: Vec<Row> = if query.head {
            Vec::new()
        } else {
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            if body.is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&body)?
            }
        };

        Ok(FetchResponse { rows, total })
    }
}

/// Extract the total from a `Content-Range` value like `0-9/42` or `*/42`.
/// An unknown total (`*`) yields `None`.
fn content_range_total(value: &str) -> Option<u64> {
    value.split('/').nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_parses_total() {
        assert_eq!(content_range_total("0-9/42"), Some(42));
        assert_eq!(content_range_total("*/7"), Some(7));
        assert_eq!(content_range_total("*/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let http = PostgrestHttp::new("http://localhost:3000/");
        assert_eq!(http.base_url, "http://localhost:3000");
    }
}
