//! Non-unique secondary indexes.
//!
//! Rows are `prefix ++ index fields ++ unindexed primary key fields -> []`.
//! Appending the primary key keeps keys distinct when index values repeat.

use std::sync::Arc;

use ormkv_schema::{MessageDescriptor, Record};
use tracing::debug;

use crate::codec::{ensure_table, IndexCodec, IndexKeyParts, IndexLayout};
use crate::entry::Entry;
use crate::error::{KvError, KvResult};
use crate::key::{KeyCodec, KeyDecode};

/// Codec for a non-unique secondary index.
#[derive(Debug, Clone)]
pub struct IndexKeyCodec {
    key: KeyCodec,
    layout: IndexLayout,
    descriptor: Arc<MessageDescriptor>,
}

impl IndexKeyCodec {
    /// Builds the codec for an index over `index_fields` of a table whose
    /// primary key is `pk_fields`.
    ///
    /// # Errors
    ///
    /// Fails if either field list is empty or names unusable fields.
    pub fn new<S: AsRef<str>>(
        prefix: Vec<u8>,
        descriptor: Arc<MessageDescriptor>,
        index_fields: &[S],
        pk_fields: &[S],
    ) -> KvResult<Self> {
        let layout = IndexLayout::new(index_fields, pk_fields)?;
        let key = KeyCodec::new(prefix, &descriptor, &layout.combined_fields())?;

        debug!(
            table = descriptor.full_name(),
            prefix_len = key.prefix().len(),
            fields = ?key.field_names(),
            "built index key codec"
        );

        Ok(Self {
            key,
            layout,
            descriptor,
        })
    }

    /// Indexed field names in index order.
    pub fn index_fields(&self) -> &[String] {
        &self.layout.index_fields
    }
}

impl IndexCodec for IndexKeyCodec {
    fn message_descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn key_codec(&self) -> &KeyCodec {
        &self.key
    }

    fn decode_index_key(&self, key: &[u8], _value: &[u8]) -> KvResult<IndexKeyParts> {
        match self.key.decode(key)? {
            KeyDecode::Full(values) => Ok(IndexKeyParts {
                primary_key: Some(self.layout.primary_key(&values)),
                index_fields: values,
            }),
            KeyDecode::Partial(values) => Ok(IndexKeyParts::prefix(values)),
        }
    }

    fn encode_kv(&self, entry: &Entry) -> KvResult<(Vec<u8>, Vec<u8>)> {
        let Entry::IndexKey(entry) = entry else {
            return Err(KvError::bad_entry(format!(
                "expected an index entry, got {}",
                entry.kind_name()
            )));
        };
        let extra = self.layout.extra_values(&self.descriptor, entry, false)?;

        let mut values = entry.index_values.clone();
        values.extend(extra);
        Ok((self.key.encode(&values)?, Vec::new()))
    }

    fn decode_kv(&self, key: &[u8], _value: &[u8]) -> KvResult<Entry> {
        let values = self.key.decode(key)?.into_full(self.key.len())?;
        Ok(self.layout.entry(&self.descriptor, &values, false))
    }

    fn encode_kv_from_record(&self, record: &dyn Record) -> KvResult<(Vec<u8>, Vec<u8>)> {
        ensure_table(&self.descriptor, record)?;
        let (_, key) = self.key.encode_key_from_record(record)?;
        Ok((key, Vec::new()))
    }
}
