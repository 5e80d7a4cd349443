//! Unique secondary indexes.
//!
//! Rows are `prefix ++ index fields -> unindexed primary key fields`. The key
//! alone identifies the row, so a point lookup by index value finds at most
//! one entry.

use std::sync::Arc;

use ormkv_schema::{FieldValue, MessageDescriptor, Record};
use tracing::debug;

use crate::codec::{ensure_table, IndexCodec, IndexKeyParts, IndexLayout};
use crate::entry::Entry;
use crate::error::{KvError, KvResult};
use crate::key::{KeyCodec, KeyDecode};

/// Codec for a unique secondary index.
#[derive(Debug, Clone)]
pub struct UniqueKeyCodec {
    key: KeyCodec,
    value: KeyCodec,
    layout: IndexLayout,
    descriptor: Arc<MessageDescriptor>,
}

impl UniqueKeyCodec {
    /// Builds the codec for a unique index over `index_fields` of a table
    /// whose primary key is `pk_fields`.
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
        let key = KeyCodec::new(prefix, &descriptor, &layout.index_fields)?;
        let value = KeyCodec::new(Vec::new(), &descriptor, &layout.extra_fields)?;

        debug!(
            table = descriptor.full_name(),
            prefix_len = key.prefix().len(),
            fields = ?key.field_names(),
            value_fields = ?value.field_names(),
            "built unique key codec"
        );

        Ok(Self {
            key,
            value,
            layout,
            descriptor,
        })
    }

    /// Indexed field names in index order.
    pub fn index_fields(&self) -> &[String] {
        &self.layout.index_fields
    }

    /// Codec for the primary key fields stored in the value.
    pub fn value_codec(&self) -> &KeyCodec {
        &self.value
    }

    fn decode_combined(&self, key: &[u8], value: &[u8]) -> KvResult<Vec<FieldValue>> {
        let mut combined = self.key.decode(key)?.into_full(self.key.len())?;
        combined.extend(self.value.decode(value)?.into_full(self.value.len())?);
        Ok(combined)
    }
}

impl IndexCodec for UniqueKeyCodec {
    fn message_descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn key_codec(&self) -> &KeyCodec {
        &self.key
    }

    fn decode_index_key(&self, key: &[u8], value: &[u8]) -> KvResult<IndexKeyParts> {
        match self.key.decode(key)? {
            KeyDecode::Full(index_fields) => {
                let mut combined = index_fields.clone();
                combined.extend(self.value.decode(value)?.into_full(self.value.len())?);
                Ok(IndexKeyParts {
                    primary_key: Some(self.layout.primary_key(&combined)),
                    index_fields,
                })
            }
            KeyDecode::Partial(values) => Ok(IndexKeyParts::prefix(values)),
        }
    }

    fn encode_kv(&self, entry: &Entry) -> KvResult<(Vec<u8>, Vec<u8>)> {
        let Entry::IndexKey(entry) = entry else {
            return Err(KvError::bad_entry(format!(
                "expected a unique index entry, got {}",
                entry.kind_name()
            )));
        };
        let extra = self.layout.extra_values(&self.descriptor, entry, true)?;
        Ok((self.key.encode(&entry.index_values)?, self.value.encode(&extra)?))
    }

    fn decode_kv(&self, key: &[u8], value: &[u8]) -> KvResult<Entry> {
        let combined = self.decode_combined(key, value)?;
        Ok(self.layout.entry(&self.descriptor, &combined, true))
    }

    fn encode_kv_from_record(&self, record: &dyn Record) -> KvResult<(Vec<u8>, Vec<u8>)> {
        ensure_table(&self.descriptor, record)?;
        let (_, key) = self.key.encode_key_from_record(record)?;
        let (_, value) = self.value.encode_key_from_record(record)?;
        Ok((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::IndexKeyEntry;
    use ormkv_schema::{DynamicRecord, FieldKind};

    fn account() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("test.Account")
            .field("region", 1, FieldKind::String)
            .field("id", 2, FieldKind::Uint64)
            .field("email", 3, FieldKind::String)
            .build()
            .unwrap()
    }

    fn by_email() -> UniqueKeyCodec {
        UniqueKeyCodec::new(vec![0x01, 0x01, 0x02], account(), &["email"], &["region", "id"])
            .unwrap()
    }

    fn entry() -> Entry {
        Entry::IndexKey(IndexKeyEntry {
            table_name: "test.Account".into(),
            fields: vec!["email".into()],
            is_unique: true,
            index_values: vec!["bob@example.com".into()],
            primary_key: vec!["eu".into(), 7u64.into()],
        })
    }

    #[test]
    fn value_holds_the_primary_key() {
        let codec = by_email();
        let (key, value) = codec.encode_kv(&entry()).unwrap();
        assert_eq!(
            key,
            codec.key_codec().encode(&["bob@example.com".into()]).unwrap()
        );
        assert_eq!(
            value,
            codec
                .value_codec()
                .encode(&["eu".into(), 7u64.into()])
                .unwrap()
        );
        assert_eq!(codec.decode_kv(&key, &value).unwrap(), entry());
    }

    #[test]
    fn record_encoding_matches_entry_encoding() {
        let record = DynamicRecord::new(account())
            .with("region", "eu")
            .unwrap()
            .with("id", 7u64)
            .unwrap()
            .with("email", "bob@example.com")
            .unwrap();
        let codec = by_email();
        assert_eq!(
            codec.encode_kv_from_record(&record).unwrap(),
            codec.encode_kv(&entry()).unwrap()
        );
    }

    #[test]
    fn decode_index_key_reads_the_value() {
        let codec = by_email();
        let (key, value) = codec.encode_kv(&entry()).unwrap();

        let parts = codec.decode_index_key(&key, &value).unwrap();
        assert_eq!(parts.index_fields, vec![FieldValue::from("bob@example.com")]);
        assert_eq!(
            parts.primary_key,
            Some(vec![FieldValue::from("eu"), FieldValue::Uint64(7)])
        );

        assert!(matches!(
            codec.decode_index_key(&key, &[]),
            Err(KvError::MalformedKey { .. })
        ));
        let prefix_only = codec.key_codec().prefix().to_vec();
        assert_eq!(
            codec.decode_index_key(&prefix_only, &[]).unwrap(),
            IndexKeyParts::prefix(vec![])
        );
    }

    #[test]
    fn index_covering_the_primary_key_has_empty_value() {
        let codec =
            UniqueKeyCodec::new(vec![9], account(), &["id", "region"], &["region", "id"]).unwrap();
        assert!(codec.value_codec().is_empty());

        let entry = Entry::IndexKey(IndexKeyEntry {
            table_name: "test.Account".into(),
            fields: vec!["id".into(), "region".into()],
            is_unique: true,
            index_values: vec![7u64.into(), "eu".into()],
            primary_key: vec!["eu".into(), 7u64.into()],
        });
        let (key, value) = codec.encode_kv(&entry).unwrap();
        assert!(value.is_empty());
        assert_eq!(codec.decode_kv(&key, &value).unwrap(), entry);
    }

    #[test]
    fn rejects_non_unique_entries() {
        let codec = by_email();
        let Entry::IndexKey(mut plain) = entry() else {
            unreachable!()
        };
        plain.is_unique = false;
        assert!(matches!(
            codec.encode_kv(&Entry::IndexKey(plain)),
            Err(KvError::BadEntryType { .. })
        ));
    }
}
