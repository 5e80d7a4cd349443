//! Error types for the schema crate.

use ormkv_cbor::CborError;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised by descriptors, records and body serialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The field does not belong to the record's message type.
    #[error("unknown field `{field}` for message {message}")]
    UnknownField {
        /// Full name of the message.
        message: String,
        /// Name of the field that was looked up.
        field: String,
    },

    /// A value does not match the field's declared type.
    #[error("field `{field}` expects {expected}, got {actual}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Declared field type.
        expected: String,
        /// Type of the supplied value.
        actual: String,
    },

    /// A message descriptor failed validation.
    #[error("invalid descriptor: {message}")]
    InvalidDescriptor {
        /// Description of the problem.
        message: String,
    },

    /// Body bytes are valid CBOR but do not describe a record.
    #[error("malformed record body: {message}")]
    MalformedBody {
        /// Description of the problem.
        message: String,
    },

    /// Body bytes are not valid canonical CBOR.
    #[error("body codec error: {0}")]
    Cbor(#[from] CborError),
}

impl SchemaError {
    /// Create an invalid descriptor error.
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Create a malformed body error.
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }
}
