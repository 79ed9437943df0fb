use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A scalar filter/cursor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl QueryValue {
    /// Render the value as it appears in the canonical query string.
    ///
    /// Strings are emitted verbatim: reserved characters are escaped by the
    /// caller before the value reaches the query model.
    pub fn render(&self) -> String {
        match self {
            QueryValue::String(s) => s.clone(),
            QueryValue::Int(n) => n.to_string(),
            QueryValue::Float(f) => f.to_string(),
            QueryValue::Bool(b) => b.to_string(),
            QueryValue::Null => "null".to_string(),
        }
    }

    /// Convert a JSON scalar into a `QueryValue`.
    ///
    /// Returns `None` for arrays and objects: those never act as cursor or
    /// comparison values.
    pub fn from_json(value: &serde_json::Value) -> Option<QueryValue> {
        match value {
            serde_json::Value::Null => Some(QueryValue::Null),
            serde_json::Value::Bool(b) => Some(QueryValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(QueryValue::Int(i))
                } else {
                    n.as_f64().map(QueryValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(QueryValue::String(s.clone())),
            _ => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::String(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::String(s)
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        QueryValue::Int(n)
    }
}

impl From<f64> for QueryValue {
    fn from(f: f64) -> Self {
        QueryValue::Float(f)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

/// Compare two JSON values the way an ordered column compares.
///
/// Numbers compare numerically across integer/float representations,
/// strings lexicographically, booleans false-before-true. `Null` is equal
/// only to itself. Mixed types and composite values are incomparable and
/// yield `None`.
pub fn compare_values(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    use serde_json::Value;

    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return Some(xi.cmp(&yi));
            }
            let xf = x.as_f64()?;
            let yf = y.as_f64()?;
            xf.partial_cmp(&yf)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
