//! # ormkv Schema
//!
//! Schema descriptors and reflective record access for ormkv.
//!
//! This crate provides:
//! - `MessageDescriptor` / `FieldDescriptor`: immutable record schemas
//! - `FieldValue`: the typed value of one field
//! - `Record`: get/set/clear access to a record keyed by field descriptor
//! - `DynamicRecord`: a data-driven `Record` over any descriptor
//! - `body`: deterministic record body serialization (canonical CBOR)
//!
//! ## Usage
//!
//! ```
//! use ormkv_schema::{body, DynamicRecord, FieldKind, FieldValue, MessageDescriptor, Record};
//!
//! let descriptor = MessageDescriptor::builder("test.Account")
//!     .field("region", 1, FieldKind::String)
//!     .field("id", 2, FieldKind::Uint64)
//!     .build()
//!     .unwrap();
//!
//! let mut record = DynamicRecord::new(descriptor.clone());
//! record.set_by_name("region", FieldValue::from("us-east")).unwrap();
//!
//! let bytes = body::marshal(&record).unwrap();
//! let mut decoded = DynamicRecord::new(descriptor);
//! body::unmarshal(&bytes, &mut decoded).unwrap();
//! assert_eq!(record, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
mod descriptor;
mod error;
mod record;
mod value;

pub use descriptor::{
    Cardinality, FieldDescriptor, FieldKind, MessageDescriptor, MessageDescriptorBuilder,
};
pub use error::{SchemaError, SchemaResult};
pub use record::{DynamicRecord, Record};
pub use value::{FieldValue, Timestamp};
