//! In-memory series store.
//!
//! Each series is an ordered map from encoded key to payload, shared behind
//! an `Arc`. Readers clone the `Arc` and scan their own snapshot; writers
//! copy the container on write, so an `add` becomes visible all at once.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::codec::{KeyEncoding, TimeKey};
use crate::config::StoreConfig;
use crate::error::{Result, TsdbError};
use crate::model::{PageIndex, Query, QueryResult, SortOrder, TimeEntry, TimeSeries, Timestamp};
use crate::query::{self, ScanPlan};
use crate::store::{validate_series_name, TimeSeriesStore};
use crate::stream::{self, SeriesStream};

type Container = BTreeMap<TimeKey, Vec<u8>>;

/// Series store held entirely in process memory.
#[derive(Debug)]
pub struct MemoryStore {
    series: RwLock<Option<HashMap<String, Arc<Container>>>>,
    encoding: KeyEncoding,
    stream_buffer: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&StoreConfig::memory())
    }
}

impl MemoryStore {
    /// Creates an empty store using the encoding and stream settings of
    /// `config`.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            series: RwLock::new(Some(HashMap::new())),
            encoding: config.key_encoding,
            stream_buffer: config.stream_buffer,
        }
    }

    /// Returns the number of series currently stored.
    pub fn series_count(&self) -> usize {
        self.series.read().as_ref().map_or(0, HashMap::len)
    }

    fn snapshot(&self, series: &str) -> Result<Arc<Container>> {
        let guard = self.series.read();
        let all = guard.as_ref().ok_or(TsdbError::Closed)?;
        all.get(series)
            .cloned()
            .ok_or_else(|| TsdbError::not_found(series))
    }
}

impl TimeSeriesStore for MemoryStore {
    fn add(&self, series: &str, entries: &[TimeEntry]) -> Result<()> {
        validate_series_name(series)?;
        let mut guard = self.series.write();
        let all = guard.as_mut().ok_or(TsdbError::Closed)?;

        let container = Arc::make_mut(all.entry(series.to_string()).or_default());
        for entry in entries {
            container.insert(self.encoding.encode(entry.time), entry.value.clone());
        }

        debug!("Added {} entries to in-memory series {}", entries.len(), series);
        Ok(())
    }

    fn query(&self, query: &Query) -> Result<QueryResult> {
        query.validate()?;
        let container = self.snapshot(&query.series)?;

        let plan = ScanPlan::for_query(query);
        let seek = self.encoding.encode(plan.seek);
        let encoding = self.encoding;
        let decode = |(key, value): (&TimeKey, &Vec<u8>)| -> Result<TimeEntry> {
            Ok(TimeEntry::new(encoding.decode(key)?, value.clone()))
        };

        match plan.order {
            SortOrder::Asc => {
                query::collect_page(&plan, query.limit, container.range(seek..).map(decode))
            }
            SortOrder::Desc => query::collect_page(
                &plan,
                query.limit,
                container.range(..=seek).rev().map(decode),
            ),
        }
    }

    fn get_pages(&self, query: &Query) -> Result<PageIndex> {
        query.validate()?;
        let container = self.snapshot(&query.series)?;

        let plan = ScanPlan::for_query(query);
        let seek = self.encoding.encode(plan.seek);
        let encoding = self.encoding;
        let decode = |key: &TimeKey| -> Result<Timestamp> { encoding.decode(key) };

        match plan.order {
            SortOrder::Asc => query::index_pages(
                &plan,
                query.limit,
                container.range(seek..).map(|(k, _)| decode(k)),
            ),
            SortOrder::Desc => query::index_pages(
                &plan,
                query.limit,
                container.range(..=seek).rev().map(|(k, _)| decode(k)),
            ),
        }
    }

    fn get(&self, series: &str) -> Result<TimeSeries> {
        let container = self.snapshot(series)?;
        container
            .iter()
            .map(|(key, value)| -> Result<TimeEntry> {
                Ok(TimeEntry::new(self.encoding.decode(key)?, value.clone()))
            })
            .collect()
    }

    fn stream_series(&self, series: &str) -> Result<SeriesStream> {
        let container = self.snapshot(series)?;
        let encoding = self.encoding;

        stream::spawn(series, self.stream_buffer, move |sink| {
            let delivery = || -> Result<stream::Delivery> {
                for (key, value) in container.iter() {
                    let entry = TimeEntry::new(encoding.decode(key)?, value.clone());
                    if let Err(reason) = sink.send(entry) {
                        return Ok(Err(reason));
                    }
                }
                Ok(Ok(()))
            };
            delivery().into()
        })
    }

    fn delete(&self, series: &str) -> Result<()> {
        let mut guard = self.series.write();
        let all = guard.as_mut().ok_or(TsdbError::Closed)?;
        let existed = all.remove(series).is_some();
        debug!("Deleted in-memory series {} (existed: {})", series, existed);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.series.write().take().is_some() {
            debug!("Closed in-memory time series store");
        }
        Ok(())
    }
}
