//! Per-table codec sets.
//!
//! [`TableCodecs::build`] turns a [`TableDescriptor`] into the codecs for
//! every row kind of the table:
//!
//! ```text
//! primary  module ++ varint(table) ++ 0x00            ++ pk fields  -> body
//! index    module ++ varint(table) ++ varint(index)   ++ fields     -> ...
//! sequence module ++ varint(table) ++ varint(u32::MAX)              -> u64
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use ormkv_schema::{Cardinality, FieldKind, MessageDescriptor, Record};
use tracing::debug;

use crate::codec::{IndexCodec, IndexKeyParts};
use crate::config::{TableDescriptor, PRIMARY_INDEX_ID, SEQ_INDEX_ID};
use crate::entry::Entry;
use crate::error::{KvError, KvResult};
use crate::index_key::IndexKeyCodec;
use crate::key::KeyCodec;
use crate::primary_key::PrimaryKeyCodec;
use crate::seq::SeqCodec;
use crate::unique_key::UniqueKeyCodec;
use crate::varint::append_varint;

/// Any index of a table, dispatched statically.
#[derive(Debug, Clone)]
pub enum TableIndex {
    /// The primary index.
    Primary(PrimaryKeyCodec),
    /// A non-unique secondary index.
    Index(IndexKeyCodec),
    /// A unique secondary index.
    Unique(UniqueKeyCodec),
}

impl TableIndex {
    /// Returns true for unique indexes, including the primary index.
    pub fn is_unique(&self) -> bool {
        !matches!(self, TableIndex::Index(_))
    }
}

impl IndexCodec for TableIndex {
    fn message_descriptor(&self) -> &Arc<MessageDescriptor> {
        match self {
            TableIndex::Primary(c) => c.message_descriptor(),
            TableIndex::Index(c) => c.message_descriptor(),
            TableIndex::Unique(c) => c.message_descriptor(),
        }
    }

    fn key_codec(&self) -> &KeyCodec {
        match self {
            TableIndex::Primary(c) => c.key_codec(),
            TableIndex::Index(c) => c.key_codec(),
            TableIndex::Unique(c) => c.key_codec(),
        }
    }

    fn decode_index_key(&self, key: &[u8], value: &[u8]) -> KvResult<IndexKeyParts> {
        match self {
            TableIndex::Primary(c) => c.decode_index_key(key, value),
            TableIndex::Index(c) => c.decode_index_key(key, value),
            TableIndex::Unique(c) => c.decode_index_key(key, value),
        }
    }

    fn encode_kv(&self, entry: &Entry) -> KvResult<(Vec<u8>, Vec<u8>)> {
        match self {
            TableIndex::Primary(c) => c.encode_kv(entry),
            TableIndex::Index(c) => c.encode_kv(entry),
            TableIndex::Unique(c) => c.encode_kv(entry),
        }
    }

    fn decode_kv(&self, key: &[u8], value: &[u8]) -> KvResult<Entry> {
        match self {
            TableIndex::Primary(c) => c.decode_kv(key, value),
            TableIndex::Index(c) => c.decode_kv(key, value),
            TableIndex::Unique(c) => c.decode_kv(key, value),
        }
    }

    fn encode_kv_from_record(&self, record: &dyn Record) -> KvResult<(Vec<u8>, Vec<u8>)> {
        match self {
            TableIndex::Primary(c) => c.encode_kv_from_record(record),
            TableIndex::Index(c) => c.encode_kv_from_record(record),
            TableIndex::Unique(c) => c.encode_kv_from_record(record),
        }
    }
}

/// All codecs of one table.
#[derive(Debug, Clone)]
pub struct TableCodecs {
    descriptor: Arc<MessageDescriptor>,
    table_prefix: Vec<u8>,
    primary: PrimaryKeyCodec,
    indexes: Vec<(u32, TableIndex)>,
    seq: Option<SeqCodec>,
}

impl TableCodecs {
    /// Validates `table` against `descriptor` and builds its codecs.
    ///
    /// # Errors
    ///
    /// `InvalidTable` for a bad configuration; field errors from the key
    /// codecs propagate.
    pub fn build(
        module_prefix: &[u8],
        descriptor: Arc<MessageDescriptor>,
        table: &TableDescriptor,
    ) -> KvResult<Self> {
        validate(&descriptor, table)?;

        let mut table_prefix = module_prefix.to_vec();
        append_varint(&mut table_prefix, table.id);
        let index_prefix = |id: u32| {
            let mut prefix = table_prefix.clone();
            append_varint(&mut prefix, id);
            prefix
        };

        let pk_fields = &table.primary_key.fields;
        let primary = PrimaryKeyCodec::new(
            index_prefix(PRIMARY_INDEX_ID),
            descriptor.clone(),
            pk_fields,
        )?;

        let mut indexes = Vec::with_capacity(table.indexes.len() + 1);
        indexes.push((PRIMARY_INDEX_ID, TableIndex::Primary(primary.clone())));
        for index in &table.indexes {
            let prefix = index_prefix(index.id);
            let codec = if index.unique {
                TableIndex::Unique(UniqueKeyCodec::new(
                    prefix,
                    descriptor.clone(),
                    &index.fields,
                    pk_fields,
                )?)
            } else {
                TableIndex::Index(IndexKeyCodec::new(
                    prefix,
                    descriptor.clone(),
                    &index.fields,
                    pk_fields,
                )?)
            };
            indexes.push((index.id, codec));
        }

        let seq = table
            .primary_key
            .auto_increment
            .then(|| SeqCodec::new(&descriptor, index_prefix(SEQ_INDEX_ID)));

        debug!(
            table = descriptor.full_name(),
            table_id = table.id,
            indexes = table.indexes.len(),
            auto_increment = table.primary_key.auto_increment,
            "built table codecs"
        );

        Ok(Self {
            descriptor,
            table_prefix,
            primary,
            indexes,
            seq,
        })
    }

    /// Schema of the table's records.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Prefix shared by every row of the table.
    pub fn table_prefix(&self) -> &[u8] {
        &self.table_prefix
    }

    /// The primary index codec.
    pub fn primary(&self) -> &PrimaryKeyCodec {
        &self.primary
    }

    /// Looks up an index by id; id 0 is the primary index.
    pub fn index(&self, id: u32) -> Option<&TableIndex> {
        self.indexes
            .iter()
            .find(|(index_id, _)| *index_id == id)
            .map(|(_, codec)| codec)
    }

    /// Looks up a secondary index by its field list.
    pub fn index_by_fields<S: AsRef<str>>(&self, fields: &[S]) -> Option<&TableIndex> {
        self.secondary_indexes()
            .map(|(_, codec)| codec)
            .find(|codec| {
                let names = match codec {
                    TableIndex::Index(c) => c.index_fields(),
                    TableIndex::Unique(c) => c.index_fields(),
                    TableIndex::Primary(_) => return false,
                };
                names.len() == fields.len()
                    && names.iter().zip(fields).all(|(a, b)| a == b.as_ref())
            })
    }

    /// Secondary indexes with their ids, in configuration order.
    pub fn secondary_indexes(&self) -> impl Iterator<Item = (u32, &TableIndex)> {
        self.indexes
            .iter()
            .filter(|(id, _)| *id != PRIMARY_INDEX_ID)
            .map(|(id, codec)| (*id, codec))
    }

    /// The sequence codec, for auto-increment tables.
    pub fn seq(&self) -> Option<&SeqCodec> {
        self.seq.as_ref()
    }

    /// Secondary index rows for a record, in configuration order.
    ///
    /// # Errors
    ///
    /// Propagates the first encoding failure.
    pub fn index_entries(&self, record: &dyn Record) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.secondary_indexes()
            .map(|(_, codec)| codec.encode_kv_from_record(record))
            .collect()
    }

    /// Decodes any row of this table.
    ///
    /// # Errors
    ///
    /// `PrefixMismatch` if no index of the table owns the key; otherwise as
    /// the owning codec's `decode_kv`.
    pub fn decode_entry(&self, key: &[u8], value: &[u8]) -> KvResult<Entry> {
        if let Some(seq) = &self.seq {
            if key.starts_with(seq.prefix()) {
                return seq.decode_kv(key, value);
            }
        }
        self.indexes
            .iter()
            .map(|(_, codec)| codec)
            .find(|codec| key.starts_with(codec.key_codec().prefix()))
            .ok_or(KvError::PrefixMismatch)?
            .decode_kv(key, value)
    }
}

fn validate(descriptor: &MessageDescriptor, table: &TableDescriptor) -> KvResult<()> {
    let name = descriptor.full_name();
    if table.id == 0 {
        return Err(KvError::invalid_table(format!("{name}: table id must be non-zero")));
    }
    if table.primary_key.fields.is_empty() {
        return Err(KvError::invalid_table(format!("{name}: empty primary key")));
    }
    for field in &table.primary_key.fields {
        let field = descriptor.require_field(field)?;
        if field.cardinality == Cardinality::Optional {
            return Err(KvError::UnsupportedKeyField {
                field: field.name.clone(),
                reason: "optional fields cannot be primary key fields".to_string(),
            });
        }
    }

    if table.primary_key.auto_increment {
        let [field] = table.primary_key.fields.as_slice() else {
            return Err(KvError::invalid_table(format!(
                "{name}: auto-increment requires a single primary key field"
            )));
        };
        let field = descriptor.require_field(field)?;
        if field.kind != FieldKind::Uint64 {
            return Err(KvError::invalid_table(format!(
                "{name}: auto-increment field `{}` must be uint64, not {}",
                field.name, field.kind
            )));
        }
    }

    let mut seen = HashSet::new();
    for index in &table.indexes {
        if index.id == PRIMARY_INDEX_ID || index.id == SEQ_INDEX_ID {
            return Err(KvError::invalid_table(format!(
                "{name}: index id {} is reserved",
                index.id
            )));
        }
        if !seen.insert(index.id) {
            return Err(KvError::invalid_table(format!(
                "{name}: duplicate index id {}",
                index.id
            )));
        }
        if index.fields.is_empty() {
            return Err(KvError::invalid_table(format!(
                "{name}: index {} has no fields",
                index.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormkv_schema::DynamicRecord;

    fn account() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("test.Account")
            .field("region", 1, FieldKind::String)
            .field("id", 2, FieldKind::Uint64)
            .field("name", 3, FieldKind::String)
            .field("email", 4, FieldKind::String)
            .build()
            .unwrap()
    }

    fn table() -> TableDescriptor {
        TableDescriptor::new(2, ["region", "id"])
            .index(1, ["name"])
            .unique_index(2, ["email"])
    }

    fn bob() -> DynamicRecord {
        DynamicRecord::new(account())
            .with("region", "eu")
            .unwrap()
            .with("id", 7u64)
            .unwrap()
            .with("name", "bob")
            .unwrap()
            .with("email", "bob@example.com")
            .unwrap()
    }

    #[test]
    fn prefixes_follow_module_table_index_layout() {
        let codecs = TableCodecs::build(&[0xAA], account(), &table()).unwrap();
        assert_eq!(codecs.table_prefix(), &[0xAA, 0x02]);
        assert_eq!(codecs.primary().key_codec().prefix(), &[0xAA, 0x02, 0x00]);
        assert_eq!(
            codecs.index(2).unwrap().key_codec().prefix(),
            &[0xAA, 0x02, 0x02]
        );
        assert!(codecs.index(2).unwrap().is_unique());
        assert!(!codecs.index(1).unwrap().is_unique());
        assert!(codecs.index(3).is_none());
        assert!(codecs.seq().is_none());
    }

    #[test]
    fn decode_entry_dispatches_by_prefix() {
        let codecs = TableCodecs::build(&[], account(), &table()).unwrap();
        let record = bob();

        let (key, value) = codecs.primary().encode_kv_from_record(&record).unwrap();
        match codecs.decode_entry(&key, &value).unwrap() {
            Entry::PrimaryKey(entry) => assert_eq!(entry.value, record),
            other => panic!("unexpected entry {other}"),
        }

        let rows = codecs.index_entries(&record).unwrap();
        assert_eq!(rows.len(), 2);
        let kinds: Vec<&str> = rows
            .iter()
            .map(|(k, v)| codecs.decode_entry(k, v).unwrap().kind_name())
            .collect();
        assert_eq!(kinds, vec!["index", "unique index"]);

        assert_eq!(
            codecs.decode_entry(&[0x03, 0x00], &[]),
            Err(KvError::PrefixMismatch)
        );
    }

    #[test]
    fn auto_increment_adds_sequence() {
        let desc = MessageDescriptor::builder("test.Counter")
            .field("id", 1, FieldKind::Uint64)
            .build()
            .unwrap();
        let table = TableDescriptor::new(1, ["id"]).auto_increment(true);
        let codecs = TableCodecs::build(&[], desc, &table).unwrap();

        let seq = codecs.seq().unwrap();
        assert_eq!(seq.prefix(), &[0x01, 0xFB, 0xFF, 0xFF, 0xFF, 0xFF]);
        let entry = codecs.decode_entry(seq.prefix(), &5u64.to_be_bytes()).unwrap();
        assert_eq!(entry.to_string(), "SEQ test.Counter 5");
    }

    #[test]
    fn codecs_are_send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<KeyCodec>();
        check::<PrimaryKeyCodec>();
        check::<IndexKeyCodec>();
        check::<UniqueKeyCodec>();
        check::<SeqCodec>();
        check::<TableIndex>();
        check::<TableCodecs>();
    }

    #[test]
    fn index_lookup_by_fields() {
        let codecs = TableCodecs::build(&[], account(), &table()).unwrap();
        assert!(matches!(
            codecs.index_by_fields(&["email"]),
            Some(TableIndex::Unique(_))
        ));
        assert!(codecs.index_by_fields(&["region", "id"]).is_none());
    }

    #[test]
    fn invalid_configurations() {
        let cases = [
            TableDescriptor::new(0, ["id"]),
            TableDescriptor::new(1, Vec::<String>::new()),
            TableDescriptor::new(1, ["region", "id"]).auto_increment(true),
            TableDescriptor::new(1, ["region"]).auto_increment(true),
            TableDescriptor::new(1, ["id"]).index(0, ["name"]),
            TableDescriptor::new(1, ["id"]).index(u32::MAX, ["name"]),
            TableDescriptor::new(1, ["id"]).index(1, ["name"]).index(1, ["email"]),
            TableDescriptor::new(1, ["id"]).index(1, Vec::<String>::new()),
        ];
        for table in cases {
            let err = TableCodecs::build(&[], account(), &table).unwrap_err();
            assert!(matches!(err, KvError::InvalidTable { .. }), "{table:?}: {err}");
        }

        let optional = MessageDescriptor::builder("test.Opt")
            .optional("region", 1, FieldKind::String)
            .field("id", 2, FieldKind::Uint64)
            .build()
            .unwrap();
        assert!(matches!(
            TableCodecs::build(&[], optional.clone(), &TableDescriptor::new(1, ["region", "id"])),
            Err(KvError::UnsupportedKeyField { .. })
        ));
        let indexed = TableDescriptor::new(1, ["id"]).index(1, ["region"]);
        assert!(TableCodecs::build(&[], optional, &indexed).is_ok());

        let unknown = TableDescriptor::new(1, ["id"]).index(1, ["missing"]);
        assert!(matches!(
            TableCodecs::build(&[], account(), &unknown),
            Err(KvError::Schema(_))
        ));
    }
}
