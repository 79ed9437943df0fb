mod builder;
mod eval;
mod filter;
mod operator;
mod parsed;
mod path;
mod sort;
mod value;

pub use builder::TableQuery;
pub use eval::{EvalError, matches_row};
pub use filter::Filter;
pub use operator::Operator;
pub use parsed::{CountMode, ParsedQuery};
pub use path::{FieldPath, PathError};
pub use sort::{Sort, SortDirection};
pub use value::{QueryValue, compare_values};

/// One result row as returned by the remote: a flat JSON object.
pub type Row = serde_json::Map<String, serde_json::Value>;
