use drift_query::{ParsedQuery, Row};

use crate::error::FetchError;

/// One loaded page of an infinite list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 0-based position within the list. Pages are contiguous.
    pub index: usize,
    pub rows: Vec<Row>,
    /// The query that produced this page.
    pub query: ParsedQuery,
}

/// A request the caller must execute and feed back via `apply`.
///
/// `seq` identifies one issue of one page; a paginator accepts exactly one
/// outstanding request at a time, so results always apply in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub seq: u64,
    pub index: usize,
    pub query: ParsedQuery,
}

/// Outcome of asking a paginator for more data.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadMore {
    /// Execute this request and hand the result to `apply`.
    Fetch(PageRequest),
    /// The page at this index is already loaded; serve it from the log.
    Cached(usize),
    /// A request for the next page is already outstanding; the duplicate
    /// trigger is coalesced and no new request is issued.
    InFlight,
    /// End of data or terminal cursor reached; nothing left to load.
    Exhausted,
}

/// Outcome of applying a fetched result.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The page was appended. `ended` is set when the page came back
    /// shorter than the page size and the list is complete.
    Loaded { index: usize, ended: bool },
    /// The request failed; the log is unchanged and the next `load_more`
    /// re-issues the same page.
    Failed(FetchError),
    /// The result belonged to a superseded or abandoned request and was
    /// dropped without touching the log.
    Discarded,
}

/// Append-only log of loaded pages plus the single-flight slot.
#[derive(Debug, Default)]
pub(crate) struct PageLog {
    pages: Vec<Page>,
    pending: Option<Pending>,
    next_seq: u64,
}

#[derive(Debug)]
pub(crate) struct Pending {
    pub seq: u64,
    pub index: usize,
    pub query: ParsedQuery,
}

impl PageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.pages.iter().flat_map(|page| page.rows.iter())
    }

    pub fn last_row(&self) -> Option<&Row> {
        self.pages.last().and_then(|page| page.rows.last())
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Issue a request for the next page. Callers check `in_flight` first.
    pub fn issue(&mut self, query: ParsedQuery) -> PageRequest {
        debug_assert!(self.pending.is_none(), "issue while a request is pending");
        self.next_seq += 1;
        let request = PageRequest {
            seq: self.next_seq,
            index: self.pages.len(),
            query: query.clone(),
        };
        self.pending = Some(Pending {
            seq: request.seq,
            index: request.index,
            query,
        });
        request
    }

    /// Claim the pending slot for a completed request. Stale sequence
    /// numbers return `None` and leave the slot untouched.
    pub fn take_pending(&mut self, seq: u64) -> Option<Pending> {
        match &self.pending {
            Some(pending) if pending.seq == seq => self.pending.take(),
            _ => None,
        }
    }

    /// Append a completed page. Contiguity is structural: the pending index
    /// is always `pages.len()` at issue time and nothing else appends.
    pub fn append(&mut self, pending: Pending, rows: Vec<Row>) -> usize {
        debug_assert_eq!(pending.index, self.pages.len(), "page log gap");
        let index = pending.index;
        self.pages.push(Page {
            index,
            rows,
            query: pending.query,
        });
        index
    }

    /// Drop all pages and any pending request. The sequence counter keeps
    /// increasing, so in-flight results from before the reset are stale and
    /// will be discarded.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.pending = None;
    }
}
