//! Series stores.
//!
//! A store keeps one ordered container per series name. All backends share
//! the [`TimeSeriesStore`] contract and the range engine in [`crate::query`],
//! so pagination behaves identically whichever backend is selected.
//!
//! - [`RedbStore`]: one redb table per series, persisted to a single file.
//! - [`MemoryStore`]: copy-on-write in-memory containers.

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::error::{Result, TsdbError};
use crate::model::{PageIndex, Query, QueryResult, TimeEntry, TimeSeries};
use crate::stream::SeriesStream;

/// Operations every time series backend provides.
///
/// Reads observe a consistent snapshot of the store and never create a
/// series. Each `add` call is atomic: all of its entries become visible
/// together or none do.
pub trait TimeSeriesStore: Send + Sync {
    /// Writes `entries` into `series`, creating the series if needed.
    ///
    /// An entry whose timestamp already exists overwrites the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`TsdbError::InvalidArgument`] if `series` is empty, or a
    /// storage error if the write transaction fails (nothing is applied).
    fn add(&self, series: &str, entries: &[TimeEntry]) -> Result<()>;

    /// Returns one page of a range scan.
    ///
    /// # Errors
    ///
    /// Returns [`TsdbError::NotFound`] if the series does not exist and
    /// [`TsdbError::InvalidArgument`] if the query limit is zero.
    fn query(&self, query: &Query) -> Result<QueryResult>;

    /// Returns the page boundaries and entry count of a range scan.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TimeSeriesStore::query`].
    fn get_pages(&self, query: &Query) -> Result<PageIndex>;

    /// Returns every entry of `series` in ascending time order.
    ///
    /// # Errors
    ///
    /// Returns [`TsdbError::NotFound`] if the series does not exist.
    fn get(&self, series: &str) -> Result<TimeSeries>;

    /// Streams every entry of `series` from a background producer.
    ///
    /// # Errors
    ///
    /// Returns [`TsdbError::NotFound`] if the series does not exist. Errors
    /// hit during the scan are delivered through the stream itself.
    fn stream_series(&self, series: &str) -> Result<SeriesStream>;

    /// Removes `series` and all its entries.
    ///
    /// Deleting a series that does not exist succeeds without effect.
    fn delete(&self, series: &str) -> Result<()>;

    /// Releases the store. Every later call fails with [`TsdbError::Closed`].
    fn close(&self) -> Result<()>;
}

/// Rejects empty series names on write.
pub(crate) fn validate_series_name(series: &str) -> Result<()> {
    if series.is_empty() {
        return Err(TsdbError::InvalidArgument(
            "time series name must not be empty".to_string(),
        ));
    }
    Ok(())
}
