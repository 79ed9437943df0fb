use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

use crate::Row;
use crate::filter::Filter;
use crate::operator::Operator;
use crate::value::{QueryValue, compare_values};

/// Failure to evaluate a filter against a row.
///
/// `MissingField` is the best-effort boundary: a row that does not carry a
/// filtered field cannot be judged, and callers fall back to revalidation
/// instead of guessing.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    MissingField(String),
    Pattern { field: String, message: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::MissingField(field) => {
                write!(f, "row is missing filtered field: {field}")
            }
            EvalError::Pattern { field, message } => {
                write!(f, "invalid pattern on field {field}: {message}")
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluate a filter set against a row: all filters must hold (implicit AND).
pub fn matches_row(filters: &[Filter], row: &Row) -> Result<bool, EvalError> {
    for filter in filters {
        if !matches_filter(filter, row)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_filter(filter: &Filter, row: &Row) -> Result<bool, EvalError> {
    let value = row
        .get(&filter.field)
        .ok_or_else(|| EvalError::MissingField(filter.field.clone()))?;

    match filter.operator {
        Operator::Eq => Ok(json_eq(value, &filter.value)),
        Operator::Neq => Ok(!json_eq(value, &filter.value)),
        Operator::Gt => Ok(ordered(value, &filter.value, |o| o == Ordering::Greater)),
        Operator::Gte => Ok(ordered(value, &filter.value, |o| o != Ordering::Less)),
        Operator::Lt => Ok(ordered(value, &filter.value, |o| o == Ordering::Less)),
        Operator::Lte => Ok(ordered(value, &filter.value, |o| o != Ordering::Greater)),
        Operator::Like => matches_pattern(filter, value, false),
        Operator::ILike => matches_pattern(filter, value, true),
        Operator::Is => Ok(match &filter.value {
            QueryValue::Null => value.is_null(),
            QueryValue::Bool(b) => value.as_bool() == Some(*b),
            _ => false,
        }),
    }
}

fn json_eq(value: &serde_json::Value, expected: &QueryValue) -> bool {
    compare_values(&to_json(expected), value) == Some(Ordering::Equal)
}

fn ordered(
    value: &serde_json::Value,
    expected: &QueryValue,
    accept: impl Fn(Ordering) -> bool,
) -> bool {
    // Incomparable values (mixed types, nulls) never satisfy an ordering.
    compare_values(value, &to_json(expected)).is_some_and(accept)
}

fn to_json(value: &QueryValue) -> serde_json::Value {
    match value {
        QueryValue::String(s) => serde_json::Value::String(s.clone()),
        QueryValue::Int(n) => serde_json::Value::from(*n),
        QueryValue::Float(f) => serde_json::Value::from(*f),
        QueryValue::Bool(b) => serde_json::Value::Bool(*b),
        QueryValue::Null => serde_json::Value::Null,
    }
}

fn matches_pattern(
    filter: &Filter,
    value: &serde_json::Value,
    case_insensitive: bool,
) -> Result<bool, EvalError> {
    let Some(candidate) = value.as_str() else {
        return Ok(false);
    };
    let QueryValue::String(pattern) = &filter.value else {
        return Ok(false);
    };
    let regex = like_regex(pattern, case_insensitive).map_err(|e| EvalError::Pattern {
        field: filter.field.clone(),
        message: e.to_string(),
    })?;
    Ok(regex.is_match(candidate))
}

/// Translate a SQL LIKE pattern into an anchored regex: `%` matches any run
/// of characters, `_` matches exactly one.
fn like_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    if case_insensitive {
        expr.push_str("(?i)");
    }
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            c => expr.push_str(&regex::escape(&c.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}
