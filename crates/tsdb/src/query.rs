//! Range query and pagination engine.
//!
//! Backends translate a [`ScanPlan`] into a directional cursor walk over
//! their own storage and feed the resulting entries to [`collect_page`] or
//! [`index_pages`]. The engine never touches storage itself, so every backend
//! shares the exact same boundary, limit and continuation rules.
//!
//! # Scan shape
//!
//! ```text
//! Asc : seek first key >= encode(start), walk forward  while t <= end
//! Desc: seek last  key <= encode(end),   walk backward while t >= start
//! ```
//!
//! A page stops at `limit` entries. If the cursor then still rests on a
//! qualifying entry, its timestamp becomes the continuation. Re-issuing the
//! query with the seek bound moved to the continuation lands on exactly that
//! entry, so pages neither overlap nor skip.

use crate::error::Result;
use crate::model::{PageIndex, Query, QueryResult, SortOrder, TimeEntry, Timestamp};

/// Upper bound on the capacity preallocated for a page.
const MAX_PREALLOC: usize = 1024;

/// Directional scan parameters derived from a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPlan {
    /// Timestamp the cursor seeks to.
    pub seek: Timestamp,
    /// Timestamp the walk must not pass.
    pub boundary: Timestamp,
    /// Walk direction.
    pub order: SortOrder,
}

impl ScanPlan {
    /// Builds the scan plan for a query.
    pub fn for_query(query: &Query) -> Self {
        match query.sort {
            SortOrder::Asc => Self {
                seek: query.start,
                boundary: query.end,
                order: SortOrder::Asc,
            },
            SortOrder::Desc => Self {
                seek: query.end,
                boundary: query.start,
                order: SortOrder::Desc,
            },
        }
    }

    /// Returns true if an entry at `ts` is still inside the range.
    #[inline]
    pub fn qualifies(&self, ts: Timestamp) -> bool {
        match self.order {
            SortOrder::Asc => ts <= self.boundary,
            SortOrder::Desc => ts >= self.boundary,
        }
    }
}

/// Collects one page from entries produced in scan order.
///
/// `entries` must yield entries starting at the plan's seek position and
/// walking in the plan's direction. At most `limit + 1` entries are pulled:
/// the extra one only decides the continuation.
///
/// # Errors
///
/// Returns the first error produced by `entries`; no partial page is
/// returned.
pub fn collect_page<I>(plan: &ScanPlan, limit: usize, entries: I) -> Result<QueryResult>
where
    I: IntoIterator<Item = Result<TimeEntry>>,
{
    let mut page = Vec::with_capacity(limit.min(MAX_PREALLOC));
    let mut continuation = None;

    for entry in entries {
        let entry = entry?;
        if !plan.qualifies(entry.time) {
            break;
        }
        if page.len() == limit {
            continuation = Some(entry.time);
            break;
        }
        page.push(entry);
    }

    Ok(QueryResult {
        entries: page,
        continuation,
    })
}

/// Computes page boundaries over the whole qualifying range.
///
/// `times` yields timestamps in scan order, like the entries passed to
/// [`collect_page`]. Every entry whose zero-based position is a multiple of
/// `limit` starts a page.
///
/// # Errors
///
/// Returns the first error produced by `times`.
pub fn index_pages<I>(plan: &ScanPlan, limit: usize, times: I) -> Result<PageIndex>
where
    I: IntoIterator<Item = Result<Timestamp>>,
{
    let mut index = PageIndex::default();

    for ts in times {
        let ts = ts?;
        if !plan.qualifies(ts) {
            break;
        }
        if index.total_count % limit == 0 {
            index.boundaries.push(ts);
        }
        index.total_count += 1;
    }

    Ok(index)
}
