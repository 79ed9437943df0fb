use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Row;

/// Error rejecting a field path at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    EmptySegment(String),
    InvalidSegment(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "field path is empty"),
            PathError::EmptySegment(raw) => write!(f, "field path has an empty segment: {raw}"),
            PathError::InvalidSegment(seg) => {
                write!(f, "field path segment has invalid characters: {seg}")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A validated dot-separated field path, e.g. `address.city`.
///
/// Paths are checked when constructed so that a misconfigured cursor spec
/// fails at setup rather than silently yielding no value at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for segment in raw.split('.') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            if !segment.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(PathError::InvalidSegment(segment.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk the path through nested objects of a row.
    ///
    /// Returns `None` when any segment is absent or an intermediate value
    /// is not an object.
    pub fn get<'a>(&self, row: &'a Row) -> Option<&'a serde_json::Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = row.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(raw: String) -> Result<Self, PathError> {
        FieldPath::parse(&raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> String {
        path.raw
    }
}
