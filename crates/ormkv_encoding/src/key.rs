//! Composite key encoding.
//!
//! A composite key is `prefix ++ field_1 ++ ... ++ field_n`, each field in
//! its order-preserving encoding. Keys sort bytewise in the same order as
//! their value tuples, and any leading run of fields forms a valid prefix
//! key for range scans.
//!
//! Decoding distinguishes three outcomes:
//! - every field decoded and the input exhausted: [`KeyDecode::Full`]
//! - input ends exactly on a field boundary before the last field:
//!   [`KeyDecode::Partial`]
//! - anything else: an error (`Decoding`, `PrefixMismatch`, `TrailingBytes`)

use std::cmp::Ordering;

use ormkv_schema::{FieldDescriptor, FieldValue, MessageDescriptor, Record};

use crate::error::{KvError, KvResult};
use crate::field::FieldCodec;
use crate::reader::KeyReader;

/// Result of decoding key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDecode {
    /// All key fields were present.
    Full(Vec<FieldValue>),
    /// The input ended between fields; holds the leading fields decoded.
    Partial(Vec<FieldValue>),
}

impl KeyDecode {
    /// Decoded values, full or partial.
    pub fn values(&self) -> &[FieldValue] {
        match self {
            KeyDecode::Full(values) | KeyDecode::Partial(values) => values,
        }
    }

    /// Consumes the result, returning the decoded values.
    pub fn into_values(self) -> Vec<FieldValue> {
        match self {
            KeyDecode::Full(values) | KeyDecode::Partial(values) => values,
        }
    }

    /// Returns true for a full decode.
    pub fn is_full(&self) -> bool {
        matches!(self, KeyDecode::Full(_))
    }

    /// Returns the values of a full decode.
    ///
    /// # Errors
    ///
    /// A partial decode is `MalformedKey`.
    pub fn into_full(self, expected: usize) -> KvResult<Vec<FieldValue>> {
        match self {
            KeyDecode::Full(values) => Ok(values),
            KeyDecode::Partial(values) => Err(KvError::MalformedKey {
                expected,
                decoded: values.len(),
            }),
        }
    }
}

/// Encoder/decoder for one composite key schema.
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    prefix: Vec<u8>,
    fields: Vec<FieldDescriptor>,
    codecs: Vec<FieldCodec>,
}

impl KeyCodec {
    /// Builds a codec for the named fields of `descriptor`, in the order given.
    ///
    /// # Errors
    ///
    /// Fails if a name is unknown or listed twice, or a field is repeated.
    pub fn new<S: AsRef<str>>(
        prefix: Vec<u8>,
        descriptor: &MessageDescriptor,
        field_names: &[S],
    ) -> KvResult<Self> {
        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(field_names.len());
        let mut codecs = Vec::with_capacity(field_names.len());

        for name in field_names {
            let field = descriptor.require_field(name.as_ref())?;
            if fields.iter().any(|f| f.number == field.number) {
                return Err(KvError::UnsupportedKeyField {
                    field: field.name.clone(),
                    reason: "listed more than once".to_string(),
                });
            }
            codecs.push(FieldCodec::for_field(field)?);
            fields.push(field.clone());
        }

        Ok(Self {
            prefix,
            fields,
            codecs,
        })
    }

    /// Prefix bytes shared by every key of this codec.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Key fields in key order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Key field names in key order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of key fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the key has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encodes a full key.
    ///
    /// # Errors
    ///
    /// `ValueCount` unless exactly one value per field is given; `Encoding`
    /// if a value does not match its field's type.
    pub fn encode(&self, values: &[FieldValue]) -> KvResult<Vec<u8>> {
        if values.len() != self.len() {
            return Err(KvError::ValueCount {
                expected: self.len(),
                actual: values.len(),
            });
        }
        self.encode_prefix(values)
    }

    /// Encodes the leading `values.len()` fields of a key, for prefix scans.
    ///
    /// # Errors
    ///
    /// `ValueCount` if more values than fields are given; `Encoding` if a
    /// value does not match its field's type.
    pub fn encode_prefix(&self, values: &[FieldValue]) -> KvResult<Vec<u8>> {
        if values.len() > self.len() {
            return Err(KvError::ValueCount {
                expected: self.len(),
                actual: values.len(),
            });
        }

        let mut out = Vec::with_capacity(self.compute_buffer_size(values));
        out.extend_from_slice(&self.prefix);
        for ((field, codec), value) in self.fields.iter().zip(&self.codecs).zip(values) {
            codec
                .encode(value, &mut out)
                .map_err(|source| KvError::Encoding {
                    field: field.name.clone(),
                    source,
                })?;
        }
        Ok(out)
    }

    /// Decodes key bytes, prefix included.
    ///
    /// # Errors
    ///
    /// `PrefixMismatch` if `key` does not start with the prefix, `Decoding`
    /// for malformed field bytes, `TrailingBytes` if bytes remain after the
    /// last field.
    pub fn decode(&self, key: &[u8]) -> KvResult<KeyDecode> {
        let mut reader = KeyReader::new(key);
        if !reader.strip_prefix(&self.prefix) {
            return Err(KvError::PrefixMismatch);
        }
        let decoded = self.decode_fields(&mut reader)?;
        if !reader.is_empty() {
            return Err(KvError::TrailingBytes {
                count: reader.remaining().len(),
            });
        }
        Ok(decoded)
    }

    // Fields after the prefix. Returns `Partial` when the reader runs out on
    // a field boundary; leftover bytes are for the caller to reject.
    fn decode_fields(&self, reader: &mut KeyReader<'_>) -> KvResult<KeyDecode> {
        let mut values = Vec::with_capacity(self.len());
        for (field, codec) in self.fields.iter().zip(&self.codecs) {
            if reader.is_empty() {
                return Ok(KeyDecode::Partial(values));
            }
            let value = codec.decode(reader).map_err(|source| KvError::Decoding {
                field: field.name.clone(),
                source,
            })?;
            values.push(value);
        }
        Ok(KeyDecode::Full(values))
    }

    /// Start and exclusive end of the keys extending `values`.
    ///
    /// `None` as the end means the scan is unbounded above.
    ///
    /// # Errors
    ///
    /// As [`KeyCodec::encode_prefix`].
    pub fn prefix_range(&self, values: &[FieldValue]) -> KvResult<(Vec<u8>, Option<Vec<u8>>)> {
        let start = self.encode_prefix(values)?;
        let end = prefix_end_bytes(&start);
        Ok((start, end))
    }

    /// Exact length of `encode_prefix(values)` for well-typed values.
    pub fn compute_buffer_size(&self, values: &[FieldValue]) -> usize {
        self.prefix.len()
            + self
                .codecs
                .iter()
                .zip(values)
                .map(|(codec, value)| codec.encoded_len(value))
                .sum::<usize>()
    }

    /// Compares two key value tuples the way their encodings compare.
    ///
    /// A proper prefix sorts before every key it is a prefix of.
    pub fn compare_keys(&self, a: &[FieldValue], b: &[FieldValue]) -> Ordering {
        a.cmp(b)
    }

    /// Checks that `start..end` describes a usable iteration range.
    ///
    /// Both sides are key prefixes (at most one value per field, each of the
    /// field's type) and `start` must not sort after `end`.
    ///
    /// # Errors
    ///
    /// `InvalidRange` describing the first problem found.
    pub fn check_valid_range_iteration_keys(
        &self,
        start: &[FieldValue],
        end: &[FieldValue],
    ) -> KvResult<()> {
        for (side, values) in [("start", start), ("end", end)] {
            if values.len() > self.len() {
                return Err(KvError::invalid_range(format!(
                    "{side} has {} values but the key has {} fields",
                    values.len(),
                    self.len()
                )));
            }
            for (field, value) in self.fields.iter().zip(values) {
                if value.kind() != Some(field.kind) {
                    return Err(KvError::invalid_range(format!(
                        "{side} value for `{}` is {}, expected {}",
                        field.name,
                        value.type_name(),
                        field.kind
                    )));
                }
            }
        }
        if self.compare_keys(start, end) == Ordering::Greater {
            return Err(KvError::invalid_range("start sorts after end"));
        }
        Ok(())
    }

    /// Reads the key fields of a record.
    pub fn get_key_values(&self, record: &dyn Record) -> Vec<FieldValue> {
        self.fields.iter().map(|field| record.get(field)).collect()
    }

    /// Writes key values into a record's key fields.
    ///
    /// # Errors
    ///
    /// `ValueCount` if more values than fields are given, `Schema` if the
    /// record rejects a value.
    pub fn set_key_values(&self, record: &mut dyn Record, values: &[FieldValue]) -> KvResult<()> {
        if values.len() > self.len() {
            return Err(KvError::ValueCount {
                expected: self.len(),
                actual: values.len(),
            });
        }
        for (field, value) in self.fields.iter().zip(values) {
            record.set(field, value.clone())?;
        }
        Ok(())
    }

    /// Reads a record's key fields and encodes them.
    ///
    /// # Errors
    ///
    /// As [`KeyCodec::encode`].
    pub fn encode_key_from_record(
        &self,
        record: &dyn Record,
    ) -> KvResult<(Vec<FieldValue>, Vec<u8>)> {
        let values = self.get_key_values(record);
        let key = self.encode(&values)?;
        Ok((values, key))
    }
}

/// Smallest key greater than every key that starts with `prefix`.
///
/// Returns `None` when no such key exists (empty prefix or all `0xFF`), in
/// which case a prefix scan is unbounded above.
pub fn prefix_end_bytes(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut end = prefix[..=last].to_vec();
    end[last] += 1;
    Some(end)
}
