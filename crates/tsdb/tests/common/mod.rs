//! Shared fixtures for integration tests.

#![allow(dead_code)]

use alopex_tsdb::{MemoryStore, RedbStore, StoreConfig, TimeEntry, TimeSeries, TimeSeriesStore};
use tempfile::TempDir;

/// 2009-01-01T00:00:00Z in nanoseconds.
pub const BASE_TS: i64 = 1_230_768_000_000_000_000;

/// One second in nanoseconds.
pub const SECOND: i64 = 1_000_000_000;

/// Creates `count` entries one second apart with distinct payloads.
pub fn dummy_series(count: usize) -> TimeSeries {
    (0..count as i64)
        .map(|i| {
            let ts = BASE_TS + i * SECOND;
            TimeEntry::new(ts, format!("reading-{i}").into_bytes())
        })
        .collect()
}

pub fn times(entries: &[TimeEntry]) -> Vec<i64> {
    entries.iter().map(|e| e.time).collect()
}

/// Opens a redb store in a fresh temp dir. Keep the dir alive with the store.
pub fn redb_store(config: StoreConfig) -> (TempDir, RedbStore) {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig {
        path: temp_dir.path().join("test.redb"),
        ..config
    };
    let store = RedbStore::open(&config).unwrap();
    (temp_dir, store)
}

/// Runs `check` against every backend.
pub fn for_each_backend(check: impl Fn(&str, &dyn TimeSeriesStore)) {
    let (_dir, redb) = redb_store(StoreConfig::default());
    check("redb", &redb);

    let memory = MemoryStore::default();
    check("memory", &memory);
}
