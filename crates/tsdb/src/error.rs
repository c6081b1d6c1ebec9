//! Error and Result types for time series store operations.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for store operations.
pub type Result<T> = std::result::Result<T, TsdbError>;

/// The error type for time series store operations.
#[derive(Debug, Error)]
pub enum TsdbError {
    /// The requested series has never been written (or was deleted).
    #[error("Series not found: {series}")]
    NotFound {
        /// Name of the missing series.
        series: String,
    },

    /// A caller-supplied argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error surfaced unchanged from the underlying redb engine.
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A stored key is not a valid encoded timestamp.
    #[error("Invalid time key: expected 8 bytes, got {len}")]
    InvalidKey {
        /// Length of the offending key.
        len: usize,
    },

    /// A background series stream failed after delivering some entries.
    #[error("Stream of series {series} failed: {source}")]
    StreamFailure {
        /// Name of the streamed series.
        series: String,
        /// The error that stopped the scan.
        #[source]
        source: Box<TsdbError>,
    },

    /// A stream producer exited without reporting how its scan ended.
    #[error("Stream producer exited without a status")]
    ProducerLost,

    /// The store has been closed.
    #[error("Store is closed")]
    Closed,
}

impl TsdbError {
    /// Creates a `NotFound` error for the given series.
    pub fn not_found(series: impl Into<String>) -> Self {
        Self::NotFound {
            series: series.into(),
        }
    }

    /// Returns true if this error reports a missing series.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for TsdbError {
                fn from(err: $ty) -> Self {
                    Self::Storage(err.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
