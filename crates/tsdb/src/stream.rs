//! Background series streaming.
//!
//! A stream is backed by a producer thread that scans the series inside its
//! own read snapshot and pushes entries through a bounded channel. The same
//! channel carries one terminal message after the last entry, so a consumer
//! always sees every delivered entry before it learns how the scan ended.
//!
//! ```text
//! producer ── Entry, Entry, ..., Done(Ok | Err) ──▶ SeriesStream (Iterator)
//! ```
//!
//! The producer blocks when the channel is full. Dropping the
//! [`SeriesStream`] disconnects the channel, which wakes a blocked producer
//! and makes it release its snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, warn};

use crate::error::{Result, TsdbError};
use crate::model::TimeEntry;

/// Cooperative cancellation flag shared with a stream producer.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

enum StreamMessage {
    Entry(TimeEntry),
    Done(Result<()>),
}

/// Why a producer stopped sending.
#[derive(Debug)]
pub(crate) enum Interrupted {
    /// The token was cancelled.
    Cancelled,
    /// The consumer dropped the stream.
    Disconnected,
}

/// Sending half handed to a producer scan.
pub(crate) struct StreamSink {
    tx: SyncSender<StreamMessage>,
    token: CancellationToken,
}

impl StreamSink {
    /// Sends one entry, blocking while the channel is full.
    pub(crate) fn send(&self, entry: TimeEntry) -> std::result::Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        self.tx
            .send(StreamMessage::Entry(entry))
            .map_err(|_| Interrupted::Disconnected)
    }
}

/// Result of delivering a scan to a sink.
pub(crate) type Delivery = std::result::Result<(), Interrupted>;

/// Outcome of a producer scan.
pub(crate) enum ScanOutcome {
    /// Every entry was sent.
    Completed,
    /// The consumer went away or cancelled.
    Interrupted(Interrupted),
    /// The scan failed.
    Failed(TsdbError),
}

impl From<Result<Delivery>> for ScanOutcome {
    fn from(result: Result<Delivery>) -> Self {
        match result {
            Ok(Ok(())) => Self::Completed,
            Ok(Err(reason)) => Self::Interrupted(reason),
            Err(err) => Self::Failed(err),
        }
    }
}

/// Spawns a producer thread running `scan` and returns the consuming stream.
///
/// `scan` runs entirely on the producer thread, so any snapshot it opens is
/// released when it returns.
pub(crate) fn spawn<F>(series: &str, capacity: usize, scan: F) -> Result<SeriesStream>
where
    F: FnOnce(&StreamSink) -> ScanOutcome + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(capacity);
    let token = CancellationToken::new();
    let sink = StreamSink {
        tx,
        token: token.clone(),
    };
    let name = series.to_string();

    thread::Builder::new()
        .name("tsdb-stream".to_string())
        .spawn(move || {
            debug!("Stream started for series {}", name);
            let done = match scan(&sink) {
                ScanOutcome::Completed => Ok(()),
                ScanOutcome::Interrupted(reason) => {
                    warn!("Stream of series {} stopped early: {:?}", name, reason);
                    return;
                }
                ScanOutcome::Failed(err) => {
                    error!("Stream of series {} failed: {:?}", name, err);
                    Err(err)
                }
            };
            // A disconnected consumer no longer cares about the status.
            let _ = sink.tx.send(StreamMessage::Done(done));
            debug!("Stream finished for series {}", name);
        })?;

    Ok(SeriesStream {
        series: series.to_string(),
        rx: Some(rx),
        token,
    })
}

/// Lazy, ordered sequence of a series' entries.
///
/// Yields `Ok(entry)` for each entry in ascending time order. If the scan
/// fails, one `Err(TsdbError::StreamFailure { .. })` follows the entries
/// already delivered. The iterator then ends.
pub struct SeriesStream {
    series: String,
    rx: Option<Receiver<StreamMessage>>,
    token: CancellationToken,
}

impl SeriesStream {
    /// Returns the name of the streamed series.
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Returns a token that cancels the producer from any thread.
    ///
    /// A cancelled producer stops at its next send. A producer blocked on a
    /// full channel is only released once the stream is drained or dropped.
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancels the producer and releases its snapshot.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.token.cancel();
        self.rx = None;
    }

    fn failure(&self, source: TsdbError) -> TsdbError {
        TsdbError::StreamFailure {
            series: self.series.clone(),
            source: Box::new(source),
        }
    }
}

impl Iterator for SeriesStream {
    type Item = Result<TimeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let rx = self.rx.as_ref()?;
        match rx.recv() {
            Ok(StreamMessage::Entry(entry)) => Some(Ok(entry)),
            Ok(StreamMessage::Done(Ok(()))) => {
                self.rx = None;
                None
            }
            Ok(StreamMessage::Done(Err(err))) => {
                self.rx = None;
                Some(Err(self.failure(err)))
            }
            Err(_) => {
                self.rx = None;
                if self.token.is_cancelled() {
                    None
                } else {
                    Some(Err(self.failure(TsdbError::ProducerLost)))
                }
            }
        }
    }
}

impl Drop for SeriesStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SeriesStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesStream")
            .field("series", &self.series)
            .field("finished", &self.rx.is_none())
            .finish()
    }
}
