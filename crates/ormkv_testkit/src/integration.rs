//! A minimal table layer over [`MemoryStore`].
//!
//! Drives the codecs the way a store-integration layer would: writes the
//! primary row plus every index row, keeps the sequence row, and serves
//! point lookups and prefix scans.

use ormkv_encoding::{Entry, IndexCodec, KvError, KvResult, TableCodecs, TableIndex};
use ormkv_schema::{DynamicRecord, FieldValue};
use tracing::debug;

use crate::store::MemoryStore;

/// One table stored in a [`MemoryStore`].
#[derive(Debug)]
pub struct TestTable<'s> {
    codecs: TableCodecs,
    store: &'s MemoryStore,
}

impl<'s> TestTable<'s> {
    /// Binds table codecs to a store.
    pub fn new(codecs: TableCodecs, store: &'s MemoryStore) -> Self {
        Self { codecs, store }
    }

    /// The table's codecs.
    pub fn codecs(&self) -> &TableCodecs {
        &self.codecs
    }

    /// Inserts or replaces a record.
    ///
    /// For auto-increment tables a zero key is replaced with the next
    /// sequence value, written back into `record`.
    ///
    /// # Errors
    ///
    /// Propagates codec errors; nothing is written on failure.
    pub fn save(&self, record: &mut DynamicRecord) -> KvResult<()> {
        let mut writes = Vec::new();

        if let Some(seq) = self.codecs.seq() {
            let pk = self.codecs.primary().key_codec();
            if pk.get_key_values(&*record) == [FieldValue::Uint64(0)] {
                let current = seq.decode_value(&self.store.get(seq.prefix()).unwrap_or_default())?;
                let next = seq.next_value(current)?;
                pk.set_key_values(record, &[FieldValue::Uint64(next)])?;
                writes.push((seq.prefix().to_vec(), seq.encode_value(next)));
            }
        }

        let (key, value) = self.codecs.primary().encode_kv_from_record(&*record)?;
        let stale = match self.store.get(&key) {
            Some(old) => {
                let old = self.codecs.primary().decode_record(&key, &old)?;
                self.codecs.index_entries(&old)?
            }
            None => Vec::new(),
        };
        let fresh = self.codecs.index_entries(&*record)?;

        debug!(
            table = self.codecs.descriptor().full_name(),
            indexes = fresh.len(),
            replaced = !stale.is_empty(),
            "saving row"
        );

        for (stale_key, _) in stale {
            self.store.delete(&stale_key);
        }
        writes.push((key, value));
        writes.extend(fresh);
        for (k, v) in writes {
            self.store.put(k, v);
        }
        Ok(())
    }

    /// Looks up a record by primary key.
    ///
    /// # Errors
    ///
    /// Propagates codec errors, including corrupt stored rows.
    pub fn get(&self, key: &[FieldValue]) -> KvResult<Option<DynamicRecord>> {
        let primary = self.codecs.primary();
        let key = primary.key_codec().encode(key)?;
        self.store
            .get(&key)
            .map(|value| primary.decode_record(&key, &value))
            .transpose()
    }

    /// Deletes a record and its index rows, returning true if it existed.
    ///
    /// # Errors
    ///
    /// Propagates codec errors.
    pub fn delete(&self, key: &[FieldValue]) -> KvResult<bool> {
        let Some(record) = self.get(key)? else {
            return Ok(false);
        };
        let (primary_key, _) = self.codecs.primary().encode_kv_from_record(&record)?;
        for (index_key, _) in self.codecs.index_entries(&record)? {
            self.store.delete(&index_key);
        }
        Ok(self.store.delete(&primary_key))
    }

    /// Entries of index `index_id` whose key starts with `prefix`, in key
    /// order. Index 0 is the primary index.
    ///
    /// # Errors
    ///
    /// `InvalidTable` for an unknown index; otherwise codec errors.
    pub fn scan(&self, index_id: u32, prefix: &[FieldValue]) -> KvResult<Vec<Entry>> {
        let index = self.index(index_id)?;
        let (start, end) = index.key_codec().prefix_range(prefix)?;
        self.store
            .iterate(&start, end.as_deref())
            .into_iter()
            .map(|(k, v)| index.decode_kv(&k, &v))
            .collect()
    }

    /// Records referenced by the rows of index `index_id` whose key starts
    /// with `prefix`, in index order.
    ///
    /// # Errors
    ///
    /// As [`TestTable::scan`]; a row whose record is missing is
    /// `MalformedKey`.
    pub fn find(&self, index_id: u32, prefix: &[FieldValue]) -> KvResult<Vec<DynamicRecord>> {
        let index = self.index(index_id)?;
        let (start, end) = index.key_codec().prefix_range(prefix)?;
        let mut records = Vec::new();
        for (k, v) in self.store.iterate(&start, end.as_deref()) {
            let parts = index.decode_index_key(&k, &v)?;
            let Some(primary_key) = parts.primary_key else {
                return Err(KvError::MalformedKey {
                    expected: index.key_codec().len(),
                    decoded: parts.index_fields.len(),
                });
            };
            let record = self.get(&primary_key)?.ok_or(KvError::MalformedKey {
                expected: primary_key.len(),
                decoded: 0,
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn index(&self, index_id: u32) -> KvResult<&TableIndex> {
        self.codecs.index(index_id).ok_or_else(|| {
            KvError::invalid_table(format!(
                "{} has no index {index_id}",
                self.codecs.descriptor().full_name()
            ))
        })
    }
}
