use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::value::QueryValue;

/// A single column condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: QueryValue,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<QueryValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}
