//! Store configuration.

use std::path::{Path, PathBuf};

use crate::codec::KeyEncoding;

/// Default permission bits for a newly created database file.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Default capacity of the channel behind a series stream.
pub const DEFAULT_STREAM_BUFFER: usize = 10;

/// Default database file name.
pub const DEFAULT_DB_FILE: &str = "tsdb.redb";

/// Storage backend selected by [`crate::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Persistent redb file at [`StoreConfig::path`].
    #[default]
    Redb,
    /// Process-local in-memory store. `path` and `mode` are ignored.
    Memory,
}

/// Configuration for opening a time series store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Storage backend.
    pub backend: Backend,
    /// Path of the database file.
    pub path: PathBuf,
    /// Permission bits applied when the file is created. Zero means
    /// [`DEFAULT_FILE_MODE`]. Only honoured on unix.
    pub mode: u32,
    /// Time key encoding. Must match the encoding the file was written with.
    pub key_encoding: KeyEncoding,
    /// Number of entries buffered between a stream producer and its
    /// consumer before the producer blocks.
    pub stream_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: PathBuf::from(DEFAULT_DB_FILE),
            mode: DEFAULT_FILE_MODE,
            key_encoding: KeyEncoding::default(),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl StoreConfig {
    /// Creates a redb configuration for the given file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Creates an in-memory configuration.
    pub fn memory() -> Self {
        Self::default().with_backend(Backend::Memory)
    }

    /// Sets the storage backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the file permission bits.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the time key encoding.
    pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.key_encoding = encoding;
        self
    }

    /// Sets the stream channel capacity.
    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity;
        self
    }

    /// Returns the permission bits to create the file with.
    pub fn effective_mode(&self) -> u32 {
        if self.mode == 0 {
            DEFAULT_FILE_MODE
        } else {
            self.mode
        }
    }
}
