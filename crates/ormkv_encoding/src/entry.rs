//! Decoded table rows.

use std::fmt;

use ormkv_schema::{DynamicRecord, FieldValue, Record};

/// One decoded key/value pair of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A row of the primary index.
    PrimaryKey(PrimaryKeyEntry),
    /// A row of a secondary index.
    IndexKey(IndexKeyEntry),
    /// The auto-increment sequence of a table.
    Seq(SeqEntry),
}

impl Entry {
    /// Fully qualified name of the table the entry belongs to.
    pub fn table_name(&self) -> &str {
        match self {
            Entry::PrimaryKey(e) => e.table_name(),
            Entry::IndexKey(e) => &e.table_name,
            Entry::Seq(e) => &e.table_name,
        }
    }

    /// Short variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entry::PrimaryKey(_) => "primary key",
            Entry::IndexKey(e) if e.is_unique => "unique index",
            Entry::IndexKey(_) => "index",
            Entry::Seq(_) => "sequence",
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::PrimaryKey(e) => e.fmt(f),
            Entry::IndexKey(e) => e.fmt(f),
            Entry::Seq(e) => e.fmt(f),
        }
    }
}

/// A table row: primary key values plus the full record.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKeyEntry {
    /// Primary key values in key order.
    pub key: Vec<FieldValue>,
    /// The stored record, key fields populated.
    pub value: DynamicRecord,
}

impl PrimaryKeyEntry {
    /// Table name, taken from the record's schema.
    pub fn table_name(&self) -> &str {
        self.value.descriptor().full_name()
    }
}

impl fmt::Display for PrimaryKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PK {} ", self.table_name())?;
        write_values(f, &self.key)?;
        f.write_str(" -> {")?;
        let mut first = true;
        for field in self.value.descriptor().fields() {
            if !self.value.has(field) {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}: {}", field.name, self.value.get(field))?;
        }
        f.write_str("}")
    }
}

/// A secondary index row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeyEntry {
    /// Fully qualified table name.
    pub table_name: String,
    /// Indexed field names in index order.
    pub fields: Vec<String>,
    /// Whether the index is unique.
    pub is_unique: bool,
    /// Indexed values in index order.
    pub index_values: Vec<FieldValue>,
    /// Primary key the row refers to, in primary key order.
    pub primary_key: Vec<FieldValue>,
}

impl fmt::Display for IndexKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_unique { "UNIQ" } else { "IDX" };
        write!(f, "{tag} {} {} : ", self.table_name, self.fields.join("/"))?;
        write_values(f, &self.index_values)?;
        f.write_str(" -> ")?;
        write_values(f, &self.primary_key)
    }
}

/// The current value of a table's auto-increment sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqEntry {
    /// Fully qualified table name.
    pub table_name: String,
    /// Last value handed out.
    pub value: u64,
}

impl fmt::Display for SeqEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SEQ {} {}", self.table_name, self.value)
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[FieldValue]) -> fmt::Result {
    f.write_str("[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormkv_schema::{FieldKind, MessageDescriptor};

    #[test]
    fn display_renders_each_variant() {
        let desc = MessageDescriptor::builder("test.Account")
            .field("region", 1, FieldKind::String)
            .field("id", 2, FieldKind::Uint64)
            .field("name", 3, FieldKind::String)
            .build()
            .unwrap();
        let record = DynamicRecord::new(desc)
            .with("region", "us")
            .unwrap()
            .with("id", 3u64)
            .unwrap();

        let pk = Entry::PrimaryKey(PrimaryKeyEntry {
            key: vec!["us".into(), 3u64.into()],
            value: record,
        });
        assert_eq!(pk.to_string(), r#"PK test.Account ["us", 3] -> {region: "us", id: 3}"#);
        assert_eq!(pk.table_name(), "test.Account");

        let idx = Entry::IndexKey(IndexKeyEntry {
            table_name: "test.Account".into(),
            fields: vec!["name".into(), "id".into()],
            is_unique: false,
            index_values: vec!["bob".into()],
            primary_key: vec!["us".into(), 3u64.into()],
        });
        assert_eq!(idx.to_string(), r#"IDX test.Account name/id : ["bob"] -> ["us", 3]"#);
        assert_eq!(idx.kind_name(), "index");

        let seq = Entry::Seq(SeqEntry {
            table_name: "test.Account".into(),
            value: 12,
        });
        assert_eq!(seq.to_string(), "SEQ test.Account 12");
    }
}
