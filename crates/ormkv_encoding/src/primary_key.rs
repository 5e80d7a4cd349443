//! The primary index: key fields to full record.
//!
//! Rows are `prefix ++ primary key fields -> record body`. Primary key fields
//! are stored only in the key: the body is marshaled from a copy with those
//! fields cleared, and decoding writes them back from the key bytes.

use std::sync::Arc;

use ormkv_schema::{body, Cardinality, DynamicRecord, FieldValue, MessageDescriptor, Record};
use tracing::debug;

use crate::codec::{ensure_table, IndexCodec, IndexKeyParts};
use crate::entry::{Entry, PrimaryKeyEntry};
use crate::error::{KvError, KvResult};
use crate::key::{KeyCodec, KeyDecode};

/// Codec for a table's primary index.
#[derive(Debug, Clone)]
pub struct PrimaryKeyCodec {
    key: KeyCodec,
    descriptor: Arc<MessageDescriptor>,
}

impl PrimaryKeyCodec {
    /// Builds the primary key codec of a table.
    ///
    /// # Errors
    ///
    /// Fails if `field_names` is empty or does not name distinct singular
    /// fields of `descriptor`. Optional fields are rejected with
    /// `UnsupportedKeyField`: a key always carries a value, so an unset
    /// field would come back set.
    pub fn new<S: AsRef<str>>(
        prefix: Vec<u8>,
        descriptor: Arc<MessageDescriptor>,
        field_names: &[S],
    ) -> KvResult<Self> {
        if field_names.is_empty() {
            return Err(KvError::invalid_table(format!(
                "{} has an empty primary key",
                descriptor.full_name()
            )));
        }
        let key = KeyCodec::new(prefix, &descriptor, field_names)?;
        if let Some(field) = key
            .fields()
            .iter()
            .find(|field| field.cardinality == Cardinality::Optional)
        {
            return Err(KvError::UnsupportedKeyField {
                field: field.name.clone(),
                reason: "optional fields cannot be primary key fields".to_string(),
            });
        }

        debug!(
            table = descriptor.full_name(),
            prefix_len = key.prefix().len(),
            fields = ?key.field_names(),
            "built primary key codec"
        );

        Ok(Self { key, descriptor })
    }

    /// Resets every primary key field of `record` to its default.
    pub fn clear_values(&self, record: &mut dyn Record) {
        for field in self.key.fields() {
            record.clear(field);
        }
    }

    /// Marshals a record body without its primary key fields.
    ///
    /// # Errors
    ///
    /// `BadEntryType` for a record of another table; body errors propagate.
    pub fn marshal(&self, record: &dyn Record) -> KvResult<Vec<u8>> {
        ensure_table(&self.descriptor, record)?;

        let mut stripped = DynamicRecord::new(self.descriptor.clone());
        for field in self.descriptor.fields() {
            if record.has(field) {
                stripped.set(field, record.get(field))?;
            }
        }
        self.clear_values(&mut stripped);

        Ok(body::marshal(&stripped)?)
    }

    /// Unmarshals `value` into `record`, then writes the key values back
    /// into the primary key fields.
    ///
    /// # Errors
    ///
    /// Body errors propagate; key values that do not fit their fields are
    /// rejected by the record.
    pub fn unmarshal(
        &self,
        key: &[FieldValue],
        value: &[u8],
        record: &mut dyn Record,
    ) -> KvResult<()> {
        ensure_table(&self.descriptor, record)?;
        body::unmarshal(value, record)?;
        self.key.set_key_values(record, key)
    }

    /// Decodes a full row straight into a new record.
    ///
    /// # Errors
    ///
    /// As [`IndexCodec::decode_kv`].
    pub fn decode_record(&self, key: &[u8], value: &[u8]) -> KvResult<DynamicRecord> {
        let values = self.key.decode(key)?.into_full(self.key.len())?;
        let mut record = DynamicRecord::new(self.descriptor.clone());
        self.unmarshal(&values, value, &mut record)?;
        Ok(record)
    }
}

impl IndexCodec for PrimaryKeyCodec {
    fn message_descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn key_codec(&self) -> &KeyCodec {
        &self.key
    }

    fn decode_index_key(&self, key: &[u8], _value: &[u8]) -> KvResult<IndexKeyParts> {
        match self.key.decode(key)? {
            KeyDecode::Full(values) => Ok(IndexKeyParts {
                primary_key: Some(values.clone()),
                index_fields: values,
            }),
            KeyDecode::Partial(values) => Ok(IndexKeyParts::prefix(values)),
        }
    }

    fn encode_kv(&self, entry: &Entry) -> KvResult<(Vec<u8>, Vec<u8>)> {
        let Entry::PrimaryKey(entry) = entry else {
            return Err(KvError::bad_entry(format!(
                "expected a primary key entry, got {}",
                entry.kind_name()
            )));
        };
        ensure_table(&self.descriptor, &entry.value)?;

        if entry.key != self.key.get_key_values(&entry.value) {
            return Err(KvError::bad_entry(
                "entry key does not match the record's primary key fields",
            ));
        }

        let key = self.key.encode(&entry.key)?;
        let value = self.marshal(&entry.value)?;
        Ok((key, value))
    }

    fn decode_kv(&self, key: &[u8], value: &[u8]) -> KvResult<Entry> {
        let values = self.key.decode(key)?.into_full(self.key.len())?;
        let mut record = DynamicRecord::new(self.descriptor.clone());
        self.unmarshal(&values, value, &mut record)?;
        Ok(Entry::PrimaryKey(PrimaryKeyEntry {
            key: values,
            value: record,
        }))
    }

    fn encode_kv_from_record(&self, record: &dyn Record) -> KvResult<(Vec<u8>, Vec<u8>)> {
        ensure_table(&self.descriptor, record)?;
        let (_, key) = self.key.encode_key_from_record(record)?;
        let value = self.marshal(record)?;
        Ok((key, value))
    }
}
