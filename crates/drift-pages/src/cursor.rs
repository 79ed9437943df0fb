use drift_query::{FieldPath, Filter, Operator, QueryValue, Row, SortDirection, TableQuery};

use crate::error::{FetchError, PageError};
use crate::state::{Applied, LoadMore, Page, PageLog};

/// Where the next cursor comes from and where pagination stops.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorSpec {
    path: FieldPath,
    until: Option<String>,
}

impl CursorSpec {
    /// Validates the field path up front; a path that cannot be parsed is a
    /// configuration error, not a silent runtime stop.
    pub fn new(path: &str) -> Result<Self, PageError> {
        Ok(Self {
            path: FieldPath::parse(path)?,
            until: None,
        })
    }

    /// Terminal cursor value: pagination stops without a request once the
    /// cursor that would drive the next page equals it.
    pub fn until(mut self, value: impl Into<String>) -> Self {
        self.until = Some(value.into());
        self
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// More pages may exist.
    Open,
    /// The terminal cursor was reached; the page containing it is retained.
    Reached,
    /// A short page or an unresolvable cursor ended the list.
    Ended,
}

/// Cursor-based infinite pagination.
///
/// The first page is the base query unmodified. Every following page
/// derives from the base by adding a strict comparison against the cursor
/// extracted from the last row of the previous page, preserving the base's
/// ordering and limit. The comparison direction follows the first sort key:
/// ascending orders paginate with `gt`, descending with `lt`.
#[derive(Debug)]
pub struct CursorPaginator {
    base: TableQuery,
    limit: usize,
    spec: CursorSpec,
    operator: Operator,
    log: PageLog,
    phase: Phase,
}

impl CursorPaginator {
    pub fn new(base: TableQuery, spec: CursorSpec) -> Result<Self, PageError> {
        let limit = base.limit.ok_or(PageError::MissingLimit)?;
        let operator = match base.sort.first().ok_or(PageError::MissingOrder)?.direction {
            SortDirection::Asc => Operator::Gt,
            SortDirection::Desc => Operator::Lt,
        };
        Ok(Self {
            base,
            limit,
            spec,
            operator,
            log: PageLog::new(),
            phase: Phase::Open,
        })
    }

    /// Ask for the next page.
    pub fn load_more(&mut self) -> LoadMore {
        if self.phase != Phase::Open {
            return LoadMore::Exhausted;
        }
        if self.log.in_flight() {
            return LoadMore::InFlight;
        }
        if self.log.len() == 0 {
            return LoadMore::Fetch(self.log.issue(self.base.parse()));
        }

        let Some(cursor) = self.next_cursor() else {
            // the configured path yields no value; pagination cannot continue
            self.phase = Phase::Ended;
            return LoadMore::Exhausted;
        };
        if self.spec.until.as_deref() == Some(cursor.render().as_str()) {
            self.phase = Phase::Reached;
            return LoadMore::Exhausted;
        }

        let field = self.spec.path.as_str().to_string();
        let derived = self
            .base
            .with_filter(Filter::new(field, self.operator, cursor));
        LoadMore::Fetch(self.log.issue(derived.parse()))
    }

    /// Feed back the result of an issued request.
    pub fn apply(&mut self, seq: u64, result: Result<Vec<Row>, FetchError>) -> Applied {
        let Some(pending) = self.log.take_pending(seq) else {
            return Applied::Discarded;
        };
        match result {
            Err(err) => Applied::Failed(err),
            Ok(rows) => {
                let ended = rows.len() < self.limit;
                let index = self.log.append(pending, rows);
                if ended {
                    self.phase = Phase::Ended;
                }
                Applied::Loaded { index, ended }
            }
        }
    }

    /// The cursor that would drive the next request: the configured field
    /// of the last row of the most recently loaded page.
    fn next_cursor(&self) -> Option<QueryValue> {
        let row = self.log.last_row()?;
        let value = self.spec.path.get(row)?;
        QueryValue::from_json(value).filter(|v| *v != QueryValue::Null)
    }

    pub fn has_more(&self) -> bool {
        self.phase == Phase::Open
    }

    pub fn pages(&self) -> &[Page] {
        self.log.pages()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.log.rows()
    }

    pub fn page_size(&self) -> usize {
        self.limit
    }

    pub fn base(&self) -> &TableQuery {
        &self.base
    }

    /// Forget all loaded pages. Results of in-flight requests issued before
    /// the reset are discarded when applied.
    pub fn reset(&mut self) {
        self.log.clear();
        self.phase = Phase::Open;
    }
}
