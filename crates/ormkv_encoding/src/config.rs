//! Table configuration.
//!
//! A [`TableDescriptor`] names the primary key and secondary indexes of one
//! record type. It is plain data and deserializes from any serde format.

use serde::{Deserialize, Serialize};

/// Index id of the primary index.
pub const PRIMARY_INDEX_ID: u32 = 0;

/// Index id reserved for a table's auto-increment sequence row.
pub const SEQ_INDEX_ID: u32 = u32::MAX;

/// Storage layout of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table id, unique within a module. Must be non-zero.
    pub id: u32,

    /// Primary key of the table.
    pub primary_key: PrimaryKeyDescriptor,

    /// Secondary indexes.
    #[serde(default)]
    pub indexes: Vec<SecondaryIndexDescriptor>,
}

/// Primary key fields of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDescriptor {
    /// Key fields in key order.
    pub fields: Vec<String>,

    /// Whether the single `uint64` key field is assigned from a sequence.
    #[serde(default)]
    pub auto_increment: bool,
}

/// One secondary index of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryIndexDescriptor {
    /// Index id, unique within the table. Must be non-zero.
    pub id: u32,

    /// Indexed fields in index order.
    pub fields: Vec<String>,

    /// Whether at most one row may hold each combination of values.
    #[serde(default)]
    pub unique: bool,
}

impl TableDescriptor {
    /// Creates a table with the given id and primary key and no indexes.
    #[must_use]
    pub fn new<S: Into<String>>(id: u32, primary_key: impl IntoIterator<Item = S>) -> Self {
        Self {
            id,
            primary_key: PrimaryKeyDescriptor {
                fields: primary_key.into_iter().map(Into::into).collect(),
                auto_increment: false,
            },
            indexes: Vec::new(),
        }
    }

    /// Sets whether the primary key is auto-incremented.
    #[must_use]
    pub const fn auto_increment(mut self, value: bool) -> Self {
        self.primary_key.auto_increment = value;
        self
    }

    /// Adds a non-unique secondary index.
    #[must_use]
    pub fn index<S: Into<String>>(self, id: u32, fields: impl IntoIterator<Item = S>) -> Self {
        self.with_index(id, fields, false)
    }

    /// Adds a unique secondary index.
    #[must_use]
    pub fn unique_index<S: Into<String>>(
        self,
        id: u32,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.with_index(id, fields, true)
    }

    fn with_index<S: Into<String>>(
        mut self,
        id: u32,
        fields: impl IntoIterator<Item = S>,
        unique: bool,
    ) -> Self {
        self.indexes.push(SecondaryIndexDescriptor {
            id,
            fields: fields.into_iter().map(Into::into).collect(),
            unique,
        });
        self
    }
}
