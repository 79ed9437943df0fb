use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::operator::Operator;
use crate::parsed::{CountMode, ParsedQuery};
use crate::sort::{Sort, SortDirection};
use crate::value::QueryValue;

/// A cloneable query description for one table.
///
/// This is the builder side of the request model: it accumulates filters,
/// ordering and paging, and [`parse`](TableQuery::parse) freezes it into a
/// [`ParsedQuery`] with canonical `query`/`body` strings. Deriving a new
/// query from an existing one (the cursor-pagination case) is a clone plus
/// [`with_filter`](TableQuery::with_filter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    pub schema: Option<String>,
    pub table: String,
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub sort: Vec<Sort>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub count: Option<CountMode>,
    pub head: bool,
    pub body: Option<serde_json::Value>,
}

impl TableQuery {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: name.into(),
            select: None,
            filters: Vec::new(),
            sort: Vec::new(),
            limit: None,
            offset: None,
            count: None,
            head: false,
            body: None,
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(Filter::new(field, Operator::Eq, value))
    }

    pub fn neq(self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(Filter::new(field, Operator::Neq, value))
    }

    pub fn gt(self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(Filter::new(field, Operator::Gt, value))
    }

    pub fn gte(self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(Filter::new(field, Operator::Gte, value))
    }

    pub fn lt(self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(Filter::new(field, Operator::Lt, value))
    }

    pub fn lte(self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(Filter::new(field, Operator::Lte, value))
    }

    pub fn like(self, field: &str, pattern: &str) -> Self {
        self.filter(Filter::new(field, Operator::Like, pattern))
    }

    pub fn ilike(self, field: &str, pattern: &str) -> Self {
        self.filter(Filter::new(field, Operator::ILike, pattern))
    }

    pub fn is(self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(Filter::new(field, Operator::Is, value))
    }

    pub fn order(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort.push(Sort::new(field, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn count(mut self, mode: CountMode) -> Self {
        self.count = Some(mode);
        self
    }

    pub fn head(mut self, head: bool) -> Self {
        self.head = head;
        self
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Derive a new query with one more filter, keeping select, ordering,
    /// limit and everything else intact.
    pub fn with_filter(&self, filter: Filter) -> Self {
        let mut derived = self.clone();
        derived.filters.push(filter);
        derived
    }

    /// Freeze the builder into an immutable request description.
    ///
    /// The query string is canonical: filter pairs are sorted byte-wise, so
    /// two builders with the same filters added in different order produce
    /// identical strings. `order` keeps declaration order (it is semantic).
    /// The body string relies on serde_json's sorted map representation for
    /// key-order independence.
    pub fn parse(&self) -> ParsedQuery {
        let mut filter_pairs: Vec<String> = self
            .filters
            .iter()
            .map(|f| format!("{}={}.{}", f.field, f.operator.as_str(), f.value.render()))
            .collect();
        filter_pairs.sort();

        let mut pairs = Vec::with_capacity(filter_pairs.len() + 4);
        pairs.push(format!("select={}", self.select.as_deref().unwrap_or("*")));
        pairs.extend(filter_pairs);
        if !self.sort.is_empty() {
            let order = self
                .sort
                .iter()
                .map(|s| {
                    let dir = match s.direction {
                        SortDirection::Asc => "asc",
                        SortDirection::Desc => "desc",
                    };
                    format!("{}.{dir}", s.field)
                })
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(format!("order={order}"));
        }
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={limit}"));
        }
        if let Some(offset) = self.offset {
            pairs.push(format!("offset={offset}"));
        }

        let body = match &self.body {
            Some(value) => serde_json::to_string(value).unwrap_or_default(),
            None => String::new(),
        };

        ParsedQuery {
            schema: self.schema.clone(),
            table: self.table.clone(),
            query: pairs.join("&"),
            body,
            count: self.count,
            head: self.head,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
