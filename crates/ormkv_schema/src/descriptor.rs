//! Message and field descriptors.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{SchemaError, SchemaResult};

/// Declared scalar type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Boolean.
    Bool,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Enum number.
    Enum,
    /// UTF-8 string.
    String,
    /// Raw bytes.
    Bytes,
    /// Seconds + nanoseconds since the Unix epoch.
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Enum => "enum",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// How many values a field holds and whether presence is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// One value; the type's zero value means "unset".
    Singular,
    /// One value with explicit presence.
    Optional,
    /// A list of values.
    Repeated,
}

/// One field of a message schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Field name, unique within the message.
    pub name: String,
    /// Field number, unique within the message and used in record bodies.
    pub number: u32,
    /// Declared type.
    pub kind: FieldKind,
    /// Singular, optional or repeated.
    pub cardinality: Cardinality,
}

impl FieldDescriptor {
    /// Creates a singular field descriptor.
    pub fn new(name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            number,
            kind,
            cardinality: Cardinality::Singular,
        }
    }

    /// Returns true if the field holds a list.
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}

/// Schema of one record type: a full name plus an ordered field list.
///
/// Descriptors are immutable once built and shared through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    full_name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    /// Starts building a descriptor for the given message name.
    pub fn builder(full_name: impl Into<String>) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            full_name: full_name.into(),
            fields: Vec::new(),
        }
    }

    /// Fully qualified message name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field by number.
    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Looks up a field by name, failing with `UnknownField`.
    pub fn require_field(&self, name: &str) -> SchemaResult<&FieldDescriptor> {
        self.field(name).ok_or_else(|| SchemaError::UnknownField {
            message: self.full_name.clone(),
            field: name.to_string(),
        })
    }
}

/// Builder for [`MessageDescriptor`].
#[derive(Debug, Clone)]
pub struct MessageDescriptorBuilder {
    full_name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptorBuilder {
    /// Adds a singular field.
    #[must_use]
    pub fn field(self, name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        self.with_field(FieldDescriptor::new(name, number, kind))
    }

    /// Adds an optional field with explicit presence.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        self.with_field(FieldDescriptor {
            cardinality: Cardinality::Optional,
            ..FieldDescriptor::new(name, number, kind)
        })
    }

    /// Adds a repeated field.
    #[must_use]
    pub fn repeated(self, name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        self.with_field(FieldDescriptor {
            cardinality: Cardinality::Repeated,
            ..FieldDescriptor::new(name, number, kind)
        })
    }

    /// Adds a prebuilt field descriptor.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and freezes the descriptor.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, a field number is zero, or a field name
    /// or number is used twice.
    pub fn build(self) -> SchemaResult<Arc<MessageDescriptor>> {
        if self.full_name.is_empty() {
            return Err(SchemaError::invalid_descriptor("message name is empty"));
        }

        let mut names = HashSet::new();
        let mut numbers = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaError::invalid_descriptor(format!(
                    "{}: field {} has an empty name",
                    self.full_name, field.number
                )));
            }
            if field.number == 0 {
                return Err(SchemaError::invalid_descriptor(format!(
                    "{}: field `{}` uses reserved number 0",
                    self.full_name, field.name
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::invalid_descriptor(format!(
                    "{}: duplicate field name `{}`",
                    self.full_name, field.name
                )));
            }
            if !numbers.insert(field.number) {
                return Err(SchemaError::invalid_descriptor(format!(
                    "{}: duplicate field number {}",
                    self.full_name, field.number
                )));
            }
        }

        Ok(Arc::new(MessageDescriptor {
            full_name: self.full_name,
            fields: self.fields,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_declaration_order() {
        let desc = MessageDescriptor::builder("test.Account")
            .field("region", 1, FieldKind::String)
            .field("id", 2, FieldKind::Uint64)
            .repeated("tags", 3, FieldKind::String)
            .build()
            .unwrap();

        let names: Vec<_> = desc.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["region", "id", "tags"]);
        assert!(desc.field("tags").unwrap().is_repeated());
        assert_eq!(desc.field_by_number(2).unwrap().name, "id");
        assert!(desc.field("missing").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = MessageDescriptor::builder("test.Dup")
            .field("a", 1, FieldKind::Bool)
            .field("a", 2, FieldKind::Bool)
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDescriptor { .. })));
    }

    #[test]
    fn duplicate_numbers_rejected() {
        let result = MessageDescriptor::builder("test.Dup")
            .field("a", 1, FieldKind::Bool)
            .field("b", 1, FieldKind::Bool)
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDescriptor { .. })));
    }

    #[test]
    fn field_number_zero_rejected() {
        let result = MessageDescriptor::builder("test.Zero")
            .field("a", 0, FieldKind::Int32)
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidDescriptor { .. })));
    }

    #[test]
    fn require_field_reports_message() {
        let desc = MessageDescriptor::builder("test.Account").build().unwrap();
        let err = desc.require_field("nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown field `nope` for message test.Account"
        );
    }
}
