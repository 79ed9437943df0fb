use drift_query::{Row, TableQuery};

use crate::error::{FetchError, PageError};
use crate::state::{Applied, LoadMore, Page, PageLog};

/// Offset-based infinite pagination.
///
/// Page *n* re-issues the base query with `offset = n * limit`. The list is
/// complete once a page comes back shorter than the page size; the short
/// page is still stored so its rows stay readable.
#[derive(Debug)]
pub struct OffsetPaginator {
    base: TableQuery,
    limit: usize,
    log: PageLog,
    ended: bool,
}

impl OffsetPaginator {
    /// The page size is the base query's `limit`.
    pub fn new(base: TableQuery) -> Result<Self, PageError> {
        let limit = base.limit.ok_or(PageError::MissingLimit)?;
        Ok(Self {
            base,
            limit,
            log: PageLog::new(),
            ended: false,
        })
    }

    /// Ask for the next page.
    pub fn load_more(&mut self) -> LoadMore {
        if self.ended {
            return LoadMore::Exhausted;
        }
        if self.log.in_flight() {
            return LoadMore::InFlight;
        }
        let index = self.log.len();
        let mut query = self.base.clone();
        query.limit = Some(self.limit);
        query.offset = Some(index * self.limit);
        LoadMore::Fetch(self.log.issue(query.parse()))
    }

    /// Ask for a specific page: already-loaded pages are served from the
    /// log, the next page is issued, anything beyond is a gap.
    pub fn load_page(&mut self, index: usize) -> Result<LoadMore, PageError> {
        if index < self.log.len() {
            return Ok(LoadMore::Cached(index));
        }
        if index > self.log.len() {
            return Err(PageError::Gap {
                requested: index,
                next: self.log.len(),
            });
        }
        Ok(self.load_more())
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
                    self.ended = true;
                }
                Applied::Loaded { index, ended }
            }
        }
    }

    /// Whether another page may exist, derived purely from the last known
    /// page being full.
    pub fn has_more(&self) -> bool {
        !self.ended
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
        self.ended = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TableQuery {
        TableQuery::table("contact").select("id,username").limit(2)
    }

    #[test]
    fn missing_limit_is_rejected() {
        let err = OffsetPaginator::new(TableQuery::table("contact")).unwrap_err();
        assert_eq!(err, PageError::MissingLimit);
    }

    #[test]
    fn pages_carry_increasing_offsets() {
        let mut p = OffsetPaginator::new(base()).unwrap();

        let LoadMore::Fetch(first) = p.load_more() else {
            panic!("expected a request");
        };
        assert_eq!(first.index, 0);
        assert!(first.query.query.contains("offset=0"));
        p.apply(first.seq, Ok(vec![Row::new(), Row::new()]));

        let LoadMore::Fetch(second) = p.load_more() else {
            panic!("expected a request");
        };
        assert_eq!(second.index, 1);
        assert!(second.query.query.contains("offset=2"));
        assert!(second.query.query.contains("limit=2"));
    }

    #[test]
    fn single_flight_coalesces() {
        let mut p = OffsetPaginator::new(base()).unwrap();
        let LoadMore::Fetch(request) = p.load_more() else {
            panic!("expected a request");
        };
        assert_eq!(p.load_more(), LoadMore::InFlight);
        p.apply(request.seq, Ok(vec![Row::new(), Row::new()]));
        assert!(matches!(p.load_more(), LoadMore::Fetch(_)));
    }

    #[test]
    fn short_page_ends_the_list_but_is_stored() {
        let mut p = OffsetPaginator::new(base()).unwrap();
        let LoadMore::Fetch(request) = p.load_more() else {
            panic!("expected a request");
        };
        let applied = p.apply(request.seq, Ok(vec![Row::new()]));
        assert_eq!(applied, Applied::Loaded { index: 0, ended: true });
        assert!(!p.has_more());
        assert_eq!(p.rows().count(), 1);
        assert_eq!(p.load_more(), LoadMore::Exhausted);
    }

    #[test]
    fn failure_is_resumable() {
        let mut p = OffsetPaginator::new(base()).unwrap();
        let LoadMore::Fetch(request) = p.load_more() else {
            panic!("expected a request");
        };
        let applied = p.apply(request.seq, Err(FetchError::new("boom")));
        assert!(matches!(applied, Applied::Failed(_)));
        assert_eq!(p.pages().len(), 0);
        assert!(p.has_more());

        // retry re-issues the same page
        let LoadMore::Fetch(retry) = p.load_more() else {
            panic!("expected a request");
        };
        assert_eq!(retry.index, request.index);
        assert_eq!(retry.query, request.query);
    }

    #[test]
    fn stale_seq_is_discarded() {
        let mut p = OffsetPaginator::new(base()).unwrap();
        let LoadMore::Fetch(request) = p.load_more() else {
            panic!("expected a request");
        };
        p.reset();
        assert_eq!(p.apply(request.seq, Ok(vec![Row::new()])), Applied::Discarded);
        assert_eq!(p.pages().len(), 0);
        assert!(p.has_more());
    }

    #[test]
    fn load_page_serves_cached_and_rejects_gaps() {
        let mut p = OffsetPaginator::new(base()).unwrap();
        let LoadMore::Fetch(request) = p.load_page(0).unwrap() else {
            panic!("expected a request");
        };
        p.apply(request.seq, Ok(vec![Row::new(), Row::new()]));

        assert_eq!(p.load_page(0).unwrap(), LoadMore::Cached(0));
        assert_eq!(
            p.load_page(5).unwrap_err(),
            PageError::Gap { requested: 5, next: 1 }
        );
    }
}
