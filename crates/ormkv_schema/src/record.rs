//! Reflective record access.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::descriptor::{Cardinality, FieldDescriptor, MessageDescriptor};
use crate::error::{SchemaError, SchemaResult};
use crate::value::FieldValue;

/// Reflective access to the fields of one record.
///
/// Codecs depend only on this trait, never on concrete record types. Field
/// arguments must belong to [`Record::descriptor`]; implementations reject
/// foreign fields with `UnknownField`.
pub trait Record {
    /// Schema of this record.
    fn descriptor(&self) -> &Arc<MessageDescriptor>;

    /// Returns true if the field is populated.
    ///
    /// Singular fields holding their zero value and empty repeated fields
    /// count as unpopulated.
    fn has(&self, field: &FieldDescriptor) -> bool;

    /// Reads a field, returning its default when unpopulated.
    fn get(&self, field: &FieldDescriptor) -> FieldValue;

    /// Writes a field.
    ///
    /// # Errors
    ///
    /// Fails if the field is not part of this record or the value does not
    /// fit its declared type and cardinality.
    fn set(&mut self, field: &FieldDescriptor, value: FieldValue) -> SchemaResult<()>;

    /// Resets a field to its default.
    fn clear(&mut self, field: &FieldDescriptor);
}

/// A record backed by a field-number keyed map, usable with any descriptor.
#[derive(Debug, Clone)]
pub struct DynamicRecord {
    descriptor: Arc<MessageDescriptor>,
    values: BTreeMap<u32, FieldValue>,
}

impl DynamicRecord {
    /// Creates an empty record of the given type.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
        }
    }

    /// Writes a field looked up by name.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownField` or `TypeMismatch`.
    pub fn set_by_name(&mut self, name: &str, value: FieldValue) -> SchemaResult<()> {
        let field = self.descriptor.require_field(name)?.clone();
        self.set(&field, value)
    }

    /// Builder-style variant of [`DynamicRecord::set_by_name`].
    ///
    /// # Errors
    ///
    /// Fails with `UnknownField` or `TypeMismatch`.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> SchemaResult<Self> {
        self.set_by_name(name, value.into())?;
        Ok(self)
    }

    /// Reads a field looked up by name.
    pub fn get_by_name(&self, name: &str) -> Option<FieldValue> {
        self.descriptor.field(name).map(|field| self.get(field))
    }

    /// Number of populated fields.
    pub fn populated_len(&self) -> usize {
        self.values.len()
    }

    fn owns(&self, field: &FieldDescriptor) -> bool {
        self.descriptor.field_by_number(field.number) == Some(field)
    }
}

impl Record for DynamicRecord {
    fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn has(&self, field: &FieldDescriptor) -> bool {
        self.owns(field) && self.values.contains_key(&field.number)
    }

    fn get(&self, field: &FieldDescriptor) -> FieldValue {
        match self.values.get(&field.number) {
            Some(value) if self.owns(field) => value.clone(),
            _ => FieldValue::default_for(field),
        }
    }

    fn set(&mut self, field: &FieldDescriptor, value: FieldValue) -> SchemaResult<()> {
        if !self.owns(field) {
            return Err(SchemaError::UnknownField {
                message: self.descriptor.full_name().to_string(),
                field: field.name.clone(),
            });
        }
        if !value.fits(field) {
            return Err(SchemaError::TypeMismatch {
                field: field.name.clone(),
                expected: match field.cardinality {
                    Cardinality::Repeated => format!("list of {}", field.kind),
                    _ => field.kind.to_string(),
                },
                actual: value.type_name(),
            });
        }

        let implicit_presence = field.cardinality != Cardinality::Optional;
        if implicit_presence && value.is_zero() {
            self.values.remove(&field.number);
        } else {
            self.values.insert(field.number, value);
        }
        Ok(())
    }

    fn clear(&mut self, field: &FieldDescriptor) {
        if self.owns(field) {
            self.values.remove(&field.number);
        }
    }
}

impl PartialEq for DynamicRecord {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.full_name() == other.descriptor.full_name() && self.values == other.values
    }
}

impl Eq for DynamicRecord {}
