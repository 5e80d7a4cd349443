//! The contract every index codec implements.

use std::sync::Arc;

use ormkv_schema::{FieldValue, MessageDescriptor, Record};

use crate::entry::{Entry, IndexKeyEntry};
use crate::error::{KvError, KvResult};
use crate::key::KeyCodec;

/// Fields recovered from an index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeyParts {
    /// Values decoded from the key bytes, in key order.
    pub index_fields: Vec<FieldValue>,
    /// The referenced primary key, or `None` for a prefix key.
    pub primary_key: Option<Vec<FieldValue>>,
}

impl IndexKeyParts {
    /// Parts of a prefix key.
    pub fn prefix(index_fields: Vec<FieldValue>) -> Self {
        Self {
            index_fields,
            primary_key: None,
        }
    }
}

/// Encoder/decoder for the rows of one index of one table.
///
/// Implementations are immutable after construction and shared freely
/// between threads.
pub trait IndexCodec {
    /// Schema of the table's records.
    fn message_descriptor(&self) -> &Arc<MessageDescriptor>;

    /// Codec for this index's key bytes.
    fn key_codec(&self) -> &KeyCodec;

    /// Decodes a stored key, and the value if needed, into index fields and
    /// the primary key they reference.
    ///
    /// A prefix key is not an error: its leading fields are returned with
    /// `primary_key = None`.
    fn decode_index_key(&self, key: &[u8], value: &[u8]) -> KvResult<IndexKeyParts>;

    /// Encodes an entry into key and value bytes.
    ///
    /// # Errors
    ///
    /// `BadEntryType` if the entry is not a row of this index.
    fn encode_kv(&self, entry: &Entry) -> KvResult<(Vec<u8>, Vec<u8>)>;

    /// Decodes key and value bytes into an entry.
    fn decode_kv(&self, key: &[u8], value: &[u8]) -> KvResult<Entry>;

    /// Encodes this index's row for a record.
    fn encode_kv_from_record(&self, record: &dyn Record) -> KvResult<(Vec<u8>, Vec<u8>)>;
}

/// Rejects records of a different table.
pub(crate) fn ensure_table(descriptor: &MessageDescriptor, record: &dyn Record) -> KvResult<()> {
    let actual = record.descriptor().full_name();
    if actual != descriptor.full_name() {
        return Err(KvError::bad_entry(format!(
            "record of type {actual} given to a codec for {}",
            descriptor.full_name()
        )));
    }
    Ok(())
}

/// How a secondary index lays out primary key fields.
///
/// Index fields come first. Primary key fields not already indexed follow,
/// in primary key order. `pk_positions[i]` is the position of primary key
/// field `i` within that combined sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexLayout {
    pub(crate) index_fields: Vec<String>,
    pub(crate) extra_fields: Vec<String>,
    pub(crate) pk_positions: Vec<usize>,
}

impl IndexLayout {
    pub(crate) fn new<S: AsRef<str>>(index_fields: &[S], pk_fields: &[S]) -> KvResult<Self> {
        if index_fields.is_empty() {
            return Err(KvError::invalid_table("index has no fields"));
        }
        if pk_fields.is_empty() {
            return Err(KvError::invalid_table("primary key has no fields"));
        }

        let index_fields: Vec<String> = index_fields.iter().map(|f| f.as_ref().to_string()).collect();
        let mut extra_fields = Vec::new();
        let mut pk_positions = Vec::with_capacity(pk_fields.len());
        for name in pk_fields {
            let name = name.as_ref();
            match index_fields.iter().position(|f| f == name) {
                Some(pos) => pk_positions.push(pos),
                None => {
                    pk_positions.push(index_fields.len() + extra_fields.len());
                    extra_fields.push(name.to_string());
                }
            }
        }

        Ok(Self {
            index_fields,
            extra_fields,
            pk_positions,
        })
    }

    /// Index fields followed by the extra primary key fields.
    pub(crate) fn combined_fields(&self) -> Vec<&str> {
        self.index_fields
            .iter()
            .chain(&self.extra_fields)
            .map(String::as_str)
            .collect()
    }

    /// Picks the primary key out of `index ++ extra` values.
    pub(crate) fn primary_key(&self, combined: &[FieldValue]) -> Vec<FieldValue> {
        self.pk_positions
            .iter()
            .map(|&pos| combined[pos].clone())
            .collect()
    }

    /// Checks an index entry against this layout and returns its extra
    /// primary key values.
    pub(crate) fn extra_values(
        &self,
        descriptor: &MessageDescriptor,
        entry: &IndexKeyEntry,
        unique: bool,
    ) -> KvResult<Vec<FieldValue>> {
        if entry.table_name != descriptor.full_name()
            || entry.is_unique != unique
            || entry.fields != self.index_fields
        {
            return Err(KvError::bad_entry(format!(
                "entry for {} index {} does not belong to {} index {} of {}",
                if entry.is_unique { "unique" } else { "non-unique" },
                entry.fields.join("/"),
                if unique { "unique" } else { "non-unique" },
                self.index_fields.join("/"),
                descriptor.full_name()
            )));
        }
        if entry.index_values.len() != self.index_fields.len() {
            return Err(KvError::ValueCount {
                expected: self.index_fields.len(),
                actual: entry.index_values.len(),
            });
        }
        if entry.primary_key.len() != self.pk_positions.len() {
            return Err(KvError::ValueCount {
                expected: self.pk_positions.len(),
                actual: entry.primary_key.len(),
            });
        }

        let mut extra = Vec::with_capacity(self.extra_fields.len());
        for (&pos, value) in self.pk_positions.iter().zip(&entry.primary_key) {
            match entry.index_values.get(pos) {
                Some(indexed) if indexed != value => {
                    return Err(KvError::bad_entry(format!(
                        "primary key value {value} disagrees with indexed value {indexed}"
                    )));
                }
                Some(_) => {}
                None => extra.push(value.clone()),
            }
        }
        Ok(extra)
    }

    /// Builds the entry for decoded `index ++ extra` values.
    pub(crate) fn entry(
        &self,
        descriptor: &MessageDescriptor,
        combined: &[FieldValue],
        unique: bool,
    ) -> Entry {
        Entry::IndexKey(IndexKeyEntry {
            table_name: descriptor.full_name().to_string(),
            fields: self.index_fields.clone(),
            is_unique: unique,
            index_values: combined[..self.index_fields.len()].to_vec(),
            primary_key: self.primary_key(combined),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_appends_unindexed_primary_key_fields() {
        let layout = IndexLayout::new(&["name", "id"], &["region", "id"]).unwrap();
        assert_eq!(layout.combined_fields(), vec!["name", "id", "region"]);
        assert_eq!(layout.pk_positions, vec![2, 1]);

        let combined = vec![
            FieldValue::from("bob"),
            FieldValue::Uint64(7),
            FieldValue::from("eu"),
        ];
        assert_eq!(
            layout.primary_key(&combined),
            vec![FieldValue::from("eu"), FieldValue::Uint64(7)]
        );
    }

    #[test]
    fn layout_requires_fields() {
        let none: [&str; 0] = [];
        assert!(IndexLayout::new(&none, &["id"]).is_err());
        assert!(IndexLayout::new(&["id"], &none).is_err());
    }
}
