//! Alopex TSDB - paginated time series access on an embedded ordered KV store.
//!
//! Every named series lives in its own ordered container, keyed by an 8-byte
//! encoding of the entry's nanosecond timestamp. On top of that layout this
//! crate provides directional range scans with exact continuation cursors,
//! page-boundary indexes for direct page jumps, and background streaming of
//! whole series.
//!
//! # Components
//!
//! - [`codec`]: timestamp <-> key encoding
//! - [`query`]: the range and pagination engine shared by all backends
//! - [`TimeSeriesStore`]: store contract, implemented by [`RedbStore`] and
//!   [`MemoryStore`]
//! - [`SeriesStream`]: lazy full-series delivery from a producer thread
//!
//! # Example
//!
//! ```rust,no_run
//! use alopex_tsdb::{open, Query, SortOrder, StoreConfig, TimeEntry};
//!
//! # fn main() -> alopex_tsdb::Result<()> {
//! let store = open(&StoreConfig::new("/var/lib/sensors/tsdb.redb"))?;
//!
//! let entries: Vec<TimeEntry> = (0..100)
//!     .map(|i| TimeEntry::new(i * 1_000_000_000, vec![i as u8]))
//!     .collect();
//! store.add("sensor.temp", &entries)?;
//!
//! // Walk the series newest-first, 25 entries at a time.
//! let mut query = Query::new("sensor.temp", 0, 99_000_000_000)
//!     .with_sort(SortOrder::Desc)
//!     .with_limit(25);
//! loop {
//!     let page = store.query(&query)?;
//!     // ... consume page.entries ...
//!     match query.next_page(&page) {
//!         Some(next) => query = next,
//!         None => break,
//!     }
//! }
//!
//! store.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod store;
pub mod stream;

pub use codec::{KeyEncoding, TimeKey, KEY_LEN};
pub use config::{Backend, StoreConfig};
pub use error::{Result, TsdbError};
pub use model::{PageIndex, Query, QueryResult, SortOrder, TimeEntry, TimeSeries, Timestamp};
pub use store::{MemoryStore, RedbStore, TimeSeriesStore};
pub use stream::{CancellationToken, SeriesStream};

/// Opens the store backend selected by `config`.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened.
pub fn open(config: &StoreConfig) -> Result<Box<dyn TimeSeriesStore>> {
    match config.backend {
        Backend::Redb => Ok(Box::new(RedbStore::open(config)?)),
        Backend::Memory => Ok(Box::new(MemoryStore::new(config))),
    }
}
