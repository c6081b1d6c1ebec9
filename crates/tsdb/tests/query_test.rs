//! Integration tests for range queries, pagination and page indexes.
//!
//! Every test runs against both the redb and the in-memory backend.

mod common;

use alopex_tsdb::{KeyEncoding, Query, SortOrder, StoreConfig, TimeEntry, TimeSeriesStore, TsdbError};
use common::{dummy_series, for_each_backend, redb_store, times, SECOND};

// ============================================================================
// 100-entry scenario
// ============================================================================

#[test]
fn test_full_range_single_page() {
    for_each_backend(|backend, store| {
        let series = dummy_series(100);
        store.add("sensor", &series).unwrap();

        let query = Query::new("sensor", series[0].time, series[99].time).with_limit(100);
        let result = store.query(&query).unwrap();

        assert_eq!(result.entries, series, "{backend}");
        assert_eq!(result.continuation, None, "{backend}");
    });
}

#[test]
fn test_two_pages_of_fifty() {
    for_each_backend(|backend, store| {
        let series = dummy_series(100);
        store.add("sensor", &series).unwrap();

        let first = Query::new("sensor", series[0].time, series[99].time).with_limit(50);
        let page = store.query(&first).unwrap();
        assert_eq!(page.entries, series[0..50], "{backend}");
        assert_eq!(page.continuation, Some(series[50].time), "{backend}");

        let second = Query::new("sensor", series[50].time, series[99].time).with_limit(50);
        let page = store.query(&second).unwrap();
        assert_eq!(page.entries, series[50..100], "{backend}");
        assert_eq!(page.continuation, None, "{backend}");
    });
}

#[test]
fn test_page_index_of_quarter_pages() {
    for_each_backend(|backend, store| {
        let series = dummy_series(100);
        store.add("sensor", &series).unwrap();

        let query = Query::new("sensor", series[0].time, series[99].time).with_limit(25);
        let index = store.get_pages(&query).unwrap();

        let expected: Vec<i64> = [0, 25, 50, 75].iter().map(|&i| series[i].time).collect();
        assert_eq!(index.boundaries, expected, "{backend}");
        assert_eq!(index.total_count, 100, "{backend}");
        assert_eq!(index.page_count(), 4, "{backend}");
    });
}

// ============================================================================
// Direction and pagination laws
// ============================================================================

#[test]
fn test_descending_is_reverse_of_ascending() {
    for_each_backend(|backend, store| {
        let series = dummy_series(100);
        store.add("sensor", &series).unwrap();

        let asc = Query::new("sensor", series[0].time, series[99].time).with_limit(100);
        let desc = asc.clone().with_sort(SortOrder::Desc);

        let mut ascending = store.query(&asc).unwrap().entries;
        let descending = store.query(&desc).unwrap().entries;
        ascending.reverse();
        assert_eq!(descending, ascending, "{backend}");
    });
}

fn follow_pages(store: &dyn TimeSeriesStore, mut query: Query) -> Vec<TimeEntry> {
    let mut collected = Vec::new();
    loop {
        let page = store.query(&query).unwrap();
        assert!(page.entries.len() <= query.limit);
        collected.extend(page.entries.iter().cloned());
        match query.next_page(&page) {
            Some(next) => query = next,
            None => return collected,
        }
    }
}

#[test]
fn test_following_continuations_reassembles_range() {
    for_each_backend(|backend, store| {
        let series = dummy_series(97);
        store.add("sensor", &series).unwrap();

        for limit in [1, 7, 10, 96, 97] {
            let query = Query::new("sensor", series[0].time, series[96].time).with_limit(limit);
            assert_eq!(follow_pages(store, query.clone()), series, "{backend} asc {limit}");

            let mut reversed = series.clone();
            reversed.reverse();
            let query = query.with_sort(SortOrder::Desc);
            assert_eq!(follow_pages(store, query), reversed, "{backend} desc {limit}");
        }
    });
}

#[test]
fn test_page_jump_matches_sequential_pages() {
    for_each_backend(|backend, store| {
        let series = dummy_series(40);
        store.add("sensor", &series).unwrap();

        for sort in [SortOrder::Asc, SortOrder::Desc] {
            let query = Query::new("sensor", series[3].time, series[35].time)
                .with_sort(sort)
                .with_limit(6);
            let index = store.get_pages(&query).unwrap();
            assert_eq!(index.total_count, 33, "{backend} {sort}");
            assert_eq!(index.page_count(), 6, "{backend} {sort}");

            let mut sequential = query.clone();
            for page_no in 0..index.page_count() {
                let jumped = store.query(&query.page(&index, page_no).unwrap()).unwrap();
                let walked = store.query(&sequential).unwrap();
                assert_eq!(jumped, walked, "{backend} {sort} page {page_no}");
                assert_eq!(jumped.entries[0].time, index.boundaries[page_no]);
                if let Some(next) = sequential.next_page(&walked) {
                    sequential = next;
                }
            }
        }
    });
}

#[test]
fn test_bounds_are_inclusive_and_need_not_exist() {
    for_each_backend(|backend, store| {
        let series = dummy_series(10);
        store.add("sensor", &series).unwrap();

        // Bounds fall between stored timestamps.
        let query = Query::new("sensor", series[2].time - 1, series[6].time + 1);
        assert_eq!(times(&store.query(&query).unwrap().entries), times(&series[2..7]), "{backend}");

        let desc = query.with_sort(SortOrder::Desc);
        let mut expected = times(&series[2..7]);
        expected.reverse();
        assert_eq!(times(&store.query(&desc).unwrap().entries), expected, "{backend}");
    });
}

#[test]
fn test_descending_end_past_last_entry() {
    for_each_backend(|backend, store| {
        let series = dummy_series(10);
        store.add("sensor", &series).unwrap();

        let query = Query::new("sensor", series[0].time, series[9].time + 1_000 * SECOND)
            .with_sort(SortOrder::Desc)
            .with_limit(3);
        let page = store.query(&query).unwrap();
        assert_eq!(times(&page.entries), vec![series[9].time, series[8].time, series[7].time], "{backend}");
        assert_eq!(page.continuation, Some(series[6].time), "{backend}");
    });
}

// ============================================================================
// Empty results and errors
// ============================================================================

#[test]
fn test_empty_range_is_not_an_error() {
    for_each_backend(|backend, store| {
        let series = dummy_series(10);
        store.add("sensor", &series).unwrap();

        // Gap between two stored entries.
        let query = Query::new("sensor", series[3].time + 1, series[4].time - 1);
        let result = store.query(&query).unwrap();
        assert!(result.entries.is_empty(), "{backend}");
        assert_eq!(result.continuation, None, "{backend}");

        let index = store.get_pages(&query).unwrap();
        assert!(index.boundaries.is_empty(), "{backend}");
        assert_eq!(index.total_count, 0, "{backend}");
    });
}

#[test]
fn test_inverted_range_is_empty() {
    for_each_backend(|backend, store| {
        let series = dummy_series(10);
        store.add("sensor", &series).unwrap();

        for sort in [SortOrder::Asc, SortOrder::Desc] {
            let query = Query::new("sensor", series[8].time, series[2].time).with_sort(sort);
            let result = store.query(&query).unwrap();
            assert!(result.entries.is_empty(), "{backend} {sort}");
            assert_eq!(result.continuation, None, "{backend} {sort}");
        }
    });
}

#[test]
fn test_missing_series_is_not_found() {
    for_each_backend(|backend, store| {
        let query = Query::new("never-written", 0, i64::MAX);

        assert!(store.query(&query).unwrap_err().is_not_found(), "{backend}");
        assert!(store.get_pages(&query).unwrap_err().is_not_found(), "{backend}");
        assert!(store.get("never-written").unwrap_err().is_not_found(), "{backend}");
        assert!(store.delete("never-written").is_ok(), "{backend}");
        // Reads never create the series.
        assert!(store.get("never-written").unwrap_err().is_not_found(), "{backend}");
    });
}

#[test]
fn test_deleted_series_is_not_found() {
    for_each_backend(|backend, store| {
        store.add("sensor", &dummy_series(5)).unwrap();
        store.delete("sensor").unwrap();

        match store.get("sensor") {
            Err(TsdbError::NotFound { series }) => assert_eq!(series, "sensor", "{backend}"),
            other => panic!("Expected NotFound from {backend}, got: {:?}", other),
        }
    });
}

#[test]
fn test_zero_limit_is_rejected() {
    for_each_backend(|backend, store| {
        store.add("sensor", &dummy_series(5)).unwrap();
        let query = Query::new("sensor", 0, i64::MAX).with_limit(0);

        assert!(matches!(store.query(&query), Err(TsdbError::InvalidArgument(_))), "{backend}");
        assert!(matches!(store.get_pages(&query), Err(TsdbError::InvalidArgument(_))), "{backend}");
    });
}

#[test]
fn test_empty_name_is_rejected_on_add() {
    for_each_backend(|backend, store| {
        let result = store.add("", &dummy_series(1));
        assert!(matches!(result, Err(TsdbError::InvalidArgument(_))), "{backend}");
    });
}

#[test]
fn test_series_are_independent() {
    for_each_backend(|backend, store| {
        let series = dummy_series(10);
        store.add("a", &series[..4]).unwrap();
        store.add("b", &series[4..]).unwrap();

        assert_eq!(store.get("a").unwrap(), series[..4], "{backend}");
        assert_eq!(store.get("b").unwrap(), series[4..], "{backend}");

        store.delete("a").unwrap();
        assert_eq!(store.get("b").unwrap(), series[4..], "{backend}");
    });
}

// ============================================================================
// Key encoding across zero
// ============================================================================

fn signed_series() -> Vec<TimeEntry> {
    [-20, -10, 0, 10, 20]
        .into_iter()
        .map(|t| TimeEntry::new(t, vec![t as u8]))
        .collect()
}

#[test]
fn test_unsigned_encoding_sorts_negatives_last() {
    let (_dir, store) = redb_store(StoreConfig::default());
    store.add("signed", &signed_series()).unwrap();

    // Stored order follows the unsigned bit patterns.
    assert_eq!(times(&store.get("signed").unwrap()), vec![0, 10, 20, -20, -10]);

    // The scan seeks into the negative keys, which sit after all others.
    let query = Query::new("signed", -15, 15);
    assert_eq!(times(&store.query(&query).unwrap().entries), vec![-10]);
}

#[test]
fn test_sign_flipped_encoding_restores_order() {
    let config = StoreConfig::default().with_key_encoding(KeyEncoding::SignFlipped);
    let (_dir, store) = redb_store(config);
    store.add("signed", &signed_series()).unwrap();

    assert_eq!(times(&store.get("signed").unwrap()), vec![-20, -10, 0, 10, 20]);

    let query = Query::new("signed", -15, 15);
    assert_eq!(times(&store.query(&query).unwrap().entries), vec![-10, 0, 10]);

    let desc = query.with_sort(SortOrder::Desc).with_limit(2);
    let page = store.query(&desc).unwrap();
    assert_eq!(times(&page.entries), vec![10, 0]);
    assert_eq!(page.continuation, Some(-10));
}
