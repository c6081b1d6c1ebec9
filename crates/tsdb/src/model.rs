//! Core data types: entries, queries and their results.

use std::fmt;
use std::str::FromStr;

use crate::error::TsdbError;

/// Nanosecond timestamp.
pub type Timestamp = i64;

/// Default number of entries per page.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// A single timestamped payload.
///
/// The value is opaque to the store and returned byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    /// Timestamp in nanoseconds.
    pub time: Timestamp,
    /// Application-defined payload.
    pub value: Vec<u8>,
}

impl TimeEntry {
    /// Creates a new entry.
    pub fn new(time: Timestamp, value: impl Into<Vec<u8>>) -> Self {
        Self {
            time,
            value: value.into(),
        }
    }
}

/// Entries ordered by time as stored.
pub type TimeSeries = Vec<TimeEntry>;

/// Direction of a range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest entries first.
    #[default]
    Asc,
    /// Newest entries first.
    Desc,
}

impl SortOrder {
    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = TsdbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(TsdbError::InvalidArgument(format!(
                "unknown sort order {s:?}, expected \"asc\" or \"desc\""
            )))
        }
    }
}

/// A bounded, directional, paginated range request against one series.
///
/// Both bounds are inclusive. For [`SortOrder::Asc`] the scan starts at
/// `start` and walks towards `end`; for [`SortOrder::Desc`] it starts at
/// `end` and walks back towards `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Series name.
    pub series: String,
    /// Lower time bound (inclusive).
    pub start: Timestamp,
    /// Upper time bound (inclusive).
    pub end: Timestamp,
    /// Scan direction.
    pub sort: SortOrder,
    /// Maximum number of entries per page. Must be greater than zero.
    pub limit: usize,
}

impl Query {
    /// Creates an ascending query with the default page limit.
    pub fn new(series: impl Into<String>, start: Timestamp, end: Timestamp) -> Self {
        Self {
            series: series.into(),
            start,
            end,
            sort: SortOrder::default(),
            limit: DEFAULT_QUERY_LIMIT,
        }
    }

    /// Sets the scan direction.
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Checks that the query can be executed.
    ///
    /// # Errors
    ///
    /// Returns [`TsdbError::InvalidArgument`] if `limit` is zero.
    pub fn validate(&self) -> Result<(), TsdbError> {
        if self.limit == 0 {
            return Err(TsdbError::InvalidArgument(
                "query limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the query for the page following `result`.
    ///
    /// The seek bound (`start` for ascending, `end` for descending) moves to
    /// the continuation; everything else is kept. Returns `None` if `result`
    /// was the last page.
    pub fn next_page(&self, result: &QueryResult) -> Option<Query> {
        result.continuation.map(|ts| self.resumed_at(ts))
    }

    /// Returns the query that starts directly at page `page` of `index`.
    ///
    /// `index` must have been computed with the same range, direction and
    /// limit as `self`.
    pub fn page(&self, index: &PageIndex, page: usize) -> Option<Query> {
        index.boundaries.get(page).map(|&ts| self.resumed_at(ts))
    }

    fn resumed_at(&self, ts: Timestamp) -> Query {
        let mut next = self.clone();
        match self.sort {
            SortOrder::Asc => next.start = ts,
            SortOrder::Desc => next.end = ts,
        }
        next
    }
}

/// One page of a range query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Entries in scan order; at most `limit` of them.
    pub entries: Vec<TimeEntry>,
    /// Timestamp of the first qualifying entry not on this page, if any.
    pub continuation: Option<Timestamp>,
}

impl QueryResult {
    /// Returns true if more qualifying entries follow this page.
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

/// Page-start timestamps and total count of a range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndex {
    /// Timestamp of the first entry of each page, in scan order.
    pub boundaries: Vec<Timestamp>,
    /// Number of entries in the range.
    pub total_count: usize,
}

impl PageIndex {
    /// Returns the number of pages.
    pub fn page_count(&self) -> usize {
        self.boundaries.len()
    }
}
