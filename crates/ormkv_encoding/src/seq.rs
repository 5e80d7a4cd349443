//! Auto-increment sequences.
//!
//! Each auto-increment table stores one row `table prefix ++ seq id -> u64`,
//! the value being the last id handed out as 8 big-endian bytes.

use ormkv_schema::MessageDescriptor;

use crate::entry::{Entry, SeqEntry};
use crate::error::{FieldDecodeError, KvError, KvResult};

const SEQ_FIELD: &str = "sequence";

/// Codec for the sequence row of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqCodec {
    table_name: String,
    prefix: Vec<u8>,
}

impl SeqCodec {
    /// Creates the codec for `descriptor`'s sequence row stored at `prefix`.
    pub fn new(descriptor: &MessageDescriptor, prefix: Vec<u8>) -> Self {
        Self {
            table_name: descriptor.full_name().to_string(),
            prefix,
        }
    }

    /// The row's key.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Encodes a sequence value.
    pub fn encode_value(&self, seq: u64) -> Vec<u8> {
        seq.to_be_bytes().to_vec()
    }

    /// The id following `current`.
    ///
    /// # Errors
    ///
    /// `SequenceExhausted` once `current` is `u64::MAX`.
    pub fn next_value(&self, current: u64) -> KvResult<u64> {
        current
            .checked_add(1)
            .ok_or_else(|| KvError::SequenceExhausted {
                table: self.table_name.clone(),
            })
    }

    /// Decodes a sequence value; a missing row reads as 0.
    ///
    /// # Errors
    ///
    /// `Decoding` for a short value, `TrailingBytes` for a long one.
    pub fn decode_value(&self, value: &[u8]) -> KvResult<u64> {
        if value.is_empty() {
            return Ok(0);
        }
        match value.len() {
            8 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(value);
                Ok(u64::from_be_bytes(bytes))
            }
            n if n < 8 => Err(KvError::Decoding {
                field: SEQ_FIELD.to_string(),
                source: FieldDecodeError::Truncated,
            }),
            n => Err(KvError::TrailingBytes { count: n - 8 }),
        }
    }

    /// Encodes a sequence entry of this table.
    ///
    /// # Errors
    ///
    /// `BadEntryType` for any other entry.
    pub fn encode_kv(&self, entry: &Entry) -> KvResult<(Vec<u8>, Vec<u8>)> {
        match entry {
            Entry::Seq(seq) if seq.table_name == self.table_name => {
                Ok((self.prefix.clone(), self.encode_value(seq.value)))
            }
            other => Err(KvError::bad_entry(format!(
                "expected the sequence of {}, got {} entry for {}",
                self.table_name,
                other.kind_name(),
                other.table_name()
            ))),
        }
    }

    /// Decodes the sequence row.
    ///
    /// # Errors
    ///
    /// `PrefixMismatch` or `TrailingBytes` if `key` is not this row's key;
    /// value errors as [`SeqCodec::decode_value`].
    pub fn decode_kv(&self, key: &[u8], value: &[u8]) -> KvResult<Entry> {
        let Some(rest) = key.strip_prefix(self.prefix.as_slice()) else {
            return Err(KvError::PrefixMismatch);
        };
        if !rest.is_empty() {
            return Err(KvError::TrailingBytes { count: rest.len() });
        }
        Ok(Entry::Seq(SeqEntry {
            table_name: self.table_name.clone(),
            value: self.decode_value(value)?,
        }))
    }
}
