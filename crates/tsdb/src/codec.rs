//! Fixed-width time key encoding.
//!
//! Every entry of a series is stored under an 8-byte big-endian key derived
//! from its nanosecond timestamp. The store orders keys by unsigned byte
//! comparison, so the encoding decides how timestamps sort on disk.
//!
//! # Encodings
//!
//! - [`KeyEncoding::Unsigned`] writes the timestamp's two's-complement bits
//!   as-is. Non-negative timestamps sort correctly, but every negative
//!   timestamp sorts *after* every non-negative one. This is the historical
//!   on-disk format and remains the default.
//! - [`KeyEncoding::SignFlipped`] flips the sign bit before writing, which
//!   restores signed order across zero. Files written with one encoding
//!   cannot be read with the other.

use crate::error::{Result, TsdbError};

/// Length of an encoded time key in bytes.
pub const KEY_LEN: usize = 8;

/// An encoded time key.
pub type TimeKey = [u8; KEY_LEN];

const SIGN_BIT: u64 = 1 << 63;

/// Mapping between timestamps and stored keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyEncoding {
    /// Timestamp bits reinterpreted as unsigned (default, compatible).
    #[default]
    Unsigned,
    /// Sign bit flipped so signed order is preserved across zero.
    SignFlipped,
}

impl KeyEncoding {
    /// Encodes a timestamp into its stored key.
    #[inline]
    pub fn encode(self, timestamp: i64) -> TimeKey {
        let bits = timestamp as u64;
        match self {
            Self::Unsigned => bits.to_be_bytes(),
            Self::SignFlipped => (bits ^ SIGN_BIT).to_be_bytes(),
        }
    }

    /// Decodes a stored key back into its timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TsdbError::InvalidKey`] if `key` is not exactly
    /// [`KEY_LEN`] bytes long.
    #[inline]
    pub fn decode(self, key: &[u8]) -> Result<i64> {
        let bytes: TimeKey = key
            .try_into()
            .map_err(|_| TsdbError::InvalidKey { len: key.len() })?;
        let bits = u64::from_be_bytes(bytes);
        Ok(match self {
            Self::Unsigned => bits as i64,
            Self::SignFlipped => (bits ^ SIGN_BIT) as i64,
        })
    }
}

/// Encodes a timestamp with the default [`KeyEncoding::Unsigned`] scheme.
pub fn encode_time(timestamp: i64) -> TimeKey {
    KeyEncoding::Unsigned.encode(timestamp)
}

/// Decodes a key written with the default [`KeyEncoding::Unsigned`] scheme.
pub fn decode_time(key: &[u8]) -> Result<i64> {
    KeyEncoding::Unsigned.decode(key)
}
