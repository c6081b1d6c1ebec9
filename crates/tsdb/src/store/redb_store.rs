//! Persistent series store backed by redb.
//!
//! # Layout
//!
//! Every series is a redb table named after the series. Keys are the 8-byte
//! encoded timestamps produced by [`KeyEncoding`]; values are the raw entry
//! payloads.
//!
//! ```text
//! tsdb.redb
//! ├── table "sensor.temp"   [ts key] -> payload
//! ├── table "sensor.hum"    [ts key] -> payload
//! └── ...
//! ```
//!
//! Reads run inside a redb read transaction and therefore see a consistent
//! snapshot. Each `add` is one write transaction; redb serializes writers.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use redb::{Database, ReadTransaction, ReadableTable, TableDefinition, TableError};
use tracing::debug;

use crate::codec::KeyEncoding;
use crate::config::StoreConfig;
use crate::error::{Result, TsdbError};
use crate::model::{PageIndex, Query, QueryResult, SortOrder, TimeEntry, TimeSeries, Timestamp};
use crate::query::{self, ScanPlan};
use crate::store::{validate_series_name, TimeSeriesStore};
use crate::stream::{self, Delivery, SeriesStream, StreamSink};

type SeriesTable<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

fn series_table(series: &str) -> SeriesTable<'_> {
    TableDefinition::new(series)
}

/// Opens the table of `series` inside a read transaction.
fn open_series<'txn>(
    txn: &'txn ReadTransaction,
    series: &str,
) -> Result<impl ReadableTable<&'static [u8], &'static [u8]> + 'txn> {
    if series.is_empty() {
        return Err(TsdbError::not_found(series));
    }
    match txn.open_table(series_table(series)) {
        Ok(table) => Ok(table),
        Err(TableError::TableDoesNotExist(_)) => Err(TsdbError::not_found(series)),
        Err(err) => Err(err.into()),
    }
}

fn decode_entry(encoding: KeyEncoding, key: &[u8], value: &[u8]) -> Result<TimeEntry> {
    Ok(TimeEntry::new(encoding.decode(key)?, value.to_vec()))
}

/// Creates the database file with the requested permissions if missing.
fn create_db_file(path: &Path, mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(path)?;
    Ok(())
}

/// Series store persisted in a single redb file.
pub struct RedbStore {
    db: RwLock<Option<Arc<Database>>>,
    path: PathBuf,
    encoding: KeyEncoding,
    stream_buffer: usize,
}

impl RedbStore {
    /// Opens (or creates) the store described by `config`.
    ///
    /// A new file is created with `config.mode` permissions on unix.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or is not a valid
    /// redb database.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        create_db_file(&config.path, config.effective_mode())?;
        let db = Database::create(&config.path)?;
        debug!(
            "Opened time series store at {:?} (encoding {:?})",
            config.path, config.key_encoding
        );

        Ok(Self {
            db: RwLock::new(Some(Arc::new(db))),
            path: config.path.clone(),
            encoding: config.key_encoding,
            stream_buffer: config.stream_buffer,
        })
    }

    /// Returns the path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the key encoding in use.
    pub fn key_encoding(&self) -> KeyEncoding {
        self.encoding
    }

    fn database(&self) -> Result<Arc<Database>> {
        self.db.read().clone().ok_or(TsdbError::Closed)
    }
}

/// Sends every entry of `series` to `sink` from one read snapshot.
fn scan_series(
    db: &Database,
    series: &str,
    encoding: KeyEncoding,
    sink: &StreamSink,
) -> Result<Delivery> {
    let txn = db.begin_read()?;
    let table = open_series(&txn, series)?;
    for item in table.iter()? {
        let (key, value) = item?;
        let entry = decode_entry(encoding, key.value(), value.value())?;
        if let Err(reason) = sink.send(entry) {
            return Ok(Err(reason));
        }
    }
    Ok(Ok(()))
}

impl TimeSeriesStore for RedbStore {
    fn add(&self, series: &str, entries: &[TimeEntry]) -> Result<()> {
        validate_series_name(series)?;
        let db = self.database()?;

        let txn = db.begin_write()?;
        {
            let mut table = txn.open_table(series_table(series))?;
            for entry in entries {
                let key = self.encoding.encode(entry.time);
                table.insert(key.as_slice(), entry.value.as_slice())?;
            }
        }
        txn.commit()?;

        debug!("Added {} entries to series {}", entries.len(), series);
        Ok(())
    }

    fn query(&self, query: &Query) -> Result<QueryResult> {
        query.validate()?;
        let db = self.database()?;
        let txn = db.begin_read()?;
        let table = open_series(&txn, &query.series)?;

        let plan = ScanPlan::for_query(query);
        let seek = self.encoding.encode(plan.seek);
        let encoding = self.encoding;

        match plan.order {
            SortOrder::Asc => {
                let range = table.range(seek.as_slice()..)?;
                let entries = range.map(|item| -> Result<TimeEntry> {
                    let (key, value) = item?;
                    decode_entry(encoding, key.value(), value.value())
                });
                query::collect_page(&plan, query.limit, entries)
            }
            SortOrder::Desc => {
                let range = table.range(..=seek.as_slice())?;
                let entries = range.rev().map(|item| -> Result<TimeEntry> {
                    let (key, value) = item?;
                    decode_entry(encoding, key.value(), value.value())
                });
                query::collect_page(&plan, query.limit, entries)
            }
        }
    }

    fn get_pages(&self, query: &Query) -> Result<PageIndex> {
        query.validate()?;
        let db = self.database()?;
        let txn = db.begin_read()?;
        let table = open_series(&txn, &query.series)?;

        let plan = ScanPlan::for_query(query);
        let seek = self.encoding.encode(plan.seek);
        let encoding = self.encoding;

        match plan.order {
            SortOrder::Asc => {
                let range = table.range(seek.as_slice()..)?;
                let times = range.map(|item| -> Result<Timestamp> {
                    let (key, _) = item?;
                    encoding.decode(key.value())
                });
                query::index_pages(&plan, query.limit, times)
            }
            SortOrder::Desc => {
                let range = table.range(..=seek.as_slice())?;
                let times = range.rev().map(|item| -> Result<Timestamp> {
                    let (key, _) = item?;
                    encoding.decode(key.value())
                });
                query::index_pages(&plan, query.limit, times)
            }
        }
    }

    fn get(&self, series: &str) -> Result<TimeSeries> {
        let db = self.database()?;
        let txn = db.begin_read()?;
        let table = open_series(&txn, series)?;

        let mut entries = TimeSeries::new();
        for item in table.iter()? {
            let (key, value) = item?;
            entries.push(decode_entry(self.encoding, key.value(), value.value())?);
        }
        Ok(entries)
    }

    fn stream_series(&self, series: &str) -> Result<SeriesStream> {
        let db = self.database()?;
        {
            let txn = db.begin_read()?;
            open_series(&txn, series)?;
        }

        let encoding = self.encoding;
        let name = series.to_string();
        stream::spawn(series, self.stream_buffer, move |sink| {
            scan_series(&db, &name, encoding, sink).into()
        })
    }

    fn delete(&self, series: &str) -> Result<()> {
        let db = self.database()?;
        if series.is_empty() {
            return Ok(());
        }

        let txn = db.begin_write()?;
        let existed = txn.delete_table(series_table(series))?;
        txn.commit()?;

        debug!("Deleted series {} (existed: {})", series, existed);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.db.write().take().is_some() {
            debug!("Closed time series store at {:?}", self.path);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .field("closed", &self.db.read().is_none())
            .finish()
    }
}
