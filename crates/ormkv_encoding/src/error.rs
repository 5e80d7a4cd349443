//! Error types for key and index codecs.

use ormkv_schema::{FieldKind, SchemaError};
use thiserror::Error;

/// Result type for codec operations.
pub type KvResult<T> = Result<T, KvError>;

/// Why a single field value could not be encoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldEncodeError {
    /// The value's runtime type differs from the field's declared type.
    #[error("expected {expected}, got {actual}")]
    KindMismatch {
        /// Declared field type.
        expected: FieldKind,
        /// Type of the supplied value.
        actual: String,
    },

    /// Timestamp nanoseconds outside `0..1_000_000_000`.
    #[error("timestamp nanos {0} out of range")]
    InvalidNanos(u32),
}

/// Why the bytes at the cursor are not a valid field encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldDecodeError {
    /// Input ends inside the field's encoding.
    #[error("input ends inside the field")]
    Truncated,

    /// Bool byte other than 0x00 or 0x01.
    #[error("invalid bool byte 0x{0:02x}")]
    InvalidBool(u8),

    /// Byte after an escaped 0x00 that is neither terminator nor escape.
    #[error("invalid escape byte 0x{0:02x} after 0x00")]
    BadEscape(u8),

    /// String bytes are not UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// Timestamp nanoseconds outside `0..1_000_000_000`.
    #[error("timestamp nanos {0} out of range")]
    InvalidNanos(u32),
}

/// Errors raised by key codecs, index codecs and table construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    /// A key value could not be encoded.
    #[error("cannot encode field `{field}`: {source}")]
    Encoding {
        /// Field being encoded.
        field: String,
        /// Cause.
        #[source]
        source: FieldEncodeError,
    },

    /// Wrong number of key values supplied.
    #[error("key takes {expected} values, got {actual}")]
    ValueCount {
        /// Number of values the key schema accepts.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// Key bytes are not a valid encoding.
    #[error("malformed key field `{field}`: {source}")]
    Decoding {
        /// Field being decoded.
        field: String,
        /// Cause.
        #[source]
        source: FieldDecodeError,
    },

    /// Key bytes do not start with the codec's prefix.
    #[error("key does not start with the expected prefix")]
    PrefixMismatch,

    /// Bytes remain after every key field was decoded.
    #[error("{count} trailing bytes after the last key field")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        count: usize,
    },

    /// An entry of the wrong variant or table was passed to a codec.
    #[error("bad entry type: {message}")]
    BadEntryType {
        /// Description of the mismatch.
        message: String,
    },

    /// A prefix key was decoded where a full key was required.
    #[error("malformed key: expected {expected} fields, decoded {decoded}")]
    MalformedKey {
        /// Number of fields in the full key.
        expected: usize,
        /// Number of fields actually decoded.
        decoded: usize,
    },

    /// A schema field cannot be part of a key.
    #[error("field `{field}` cannot be used in a key: {reason}")]
    UnsupportedKeyField {
        /// Offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Start and end values do not form a valid range.
    #[error("invalid range: {message}")]
    InvalidRange {
        /// Description of the problem.
        message: String,
    },

    /// An auto-increment sequence has handed out `u64::MAX`.
    #[error("sequence of {table} is exhausted")]
    SequenceExhausted {
        /// Table owning the sequence.
        table: String,
    },

    /// A table configuration failed validation.
    #[error("invalid table: {message}")]
    InvalidTable {
        /// Description of the problem.
        message: String,
    },

    /// Record body (de)serialization or field access failed.
    #[error("record error: {0}")]
    Schema(#[from] SchemaError),
}

impl KvError {
    /// Create a bad entry type error.
    pub fn bad_entry(message: impl Into<String>) -> Self {
        Self::BadEntryType {
            message: message.into(),
        }
    }

    /// Create an invalid table error.
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable {
            message: message.into(),
        }
    }

    /// Create an invalid range error.
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Returns true for errors that mean the stored bytes are corrupt.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            KvError::Decoding { .. }
                | KvError::PrefixMismatch
                | KvError::TrailingBytes { .. }
                | KvError::MalformedKey { .. }
                | KvError::Schema(SchemaError::MalformedBody { .. } | SchemaError::Cbor(_))
        )
    }
}
