//! # ormkv Encoding
//!
//! Key/value encoding of ormkv tables over a sorted, byte-ordered store.
//!
//! This crate provides:
//! - `FieldCodec`: order-preserving encoding of one key field
//! - `KeyCodec`: composite keys with full and prefix decoding (`KeyDecode`)
//! - `IndexCodec`: the contract shared by every index codec
//! - `PrimaryKeyCodec`: table rows, key fields to record body
//! - `IndexKeyCodec` / `UniqueKeyCodec`: secondary index rows
//! - `SeqCodec`: auto-increment sequence rows
//! - `TableDescriptor` / `TableCodecs`: table configuration and codec sets
//!
//! ## Ordering
//!
//! Encoded keys sort bytewise in the same order as their value tuples, and a
//! key encoded from the leading fields only is a byte prefix of every full
//! key extending it, so range and prefix scans on the store need no
//! decoding.
//!
//! ## Usage
//!
//! ```
//! use ormkv_encoding::{IndexCodec, KeyDecode, TableCodecs, TableDescriptor};
//! use ormkv_schema::{DynamicRecord, FieldKind, FieldValue, MessageDescriptor};
//!
//! let descriptor = MessageDescriptor::builder("test.Account")
//!     .field("region", 1, FieldKind::String)
//!     .field("id", 2, FieldKind::Uint64)
//!     .field("name", 3, FieldKind::String)
//!     .build()
//!     .unwrap();
//! let table = TableDescriptor::new(1, ["region", "id"]).index(1, ["name"]);
//! let codecs = TableCodecs::build(&[0x01], descriptor.clone(), &table).unwrap();
//!
//! let record = DynamicRecord::new(descriptor)
//!     .with("region", "us-east").unwrap()
//!     .with("id", 42u64).unwrap()
//!     .with("name", "alice").unwrap();
//! let (key, value) = codecs.primary().encode_kv_from_record(&record).unwrap();
//!
//! let probe = codecs
//!     .primary()
//!     .key_codec()
//!     .encode_prefix(&[FieldValue::from("us-east")])
//!     .unwrap();
//! assert!(key.starts_with(&probe));
//! assert_eq!(
//!     codecs.primary().key_codec().decode(&probe).unwrap(),
//!     KeyDecode::Partial(vec![FieldValue::from("us-east")])
//! );
//! assert_eq!(codecs.primary().decode_record(&key, &value).unwrap(), record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod config;
mod entry;
mod error;
mod field;
mod index_key;
mod key;
mod primary_key;
mod reader;
mod seq;
mod table;
mod unique_key;
mod varint;

pub use codec::{IndexCodec, IndexKeyParts};
pub use config::{
    PrimaryKeyDescriptor, SecondaryIndexDescriptor, TableDescriptor, PRIMARY_INDEX_ID,
    SEQ_INDEX_ID,
};
pub use entry::{Entry, IndexKeyEntry, PrimaryKeyEntry, SeqEntry};
pub use error::{FieldDecodeError, FieldEncodeError, KvError, KvResult};
pub use field::FieldCodec;
pub use index_key::IndexKeyCodec;
pub use key::{prefix_end_bytes, KeyCodec, KeyDecode};
pub use primary_key::PrimaryKeyCodec;
pub use reader::KeyReader;
pub use seq::SeqCodec;
pub use table::{TableCodecs, TableIndex};
pub use unique_key::UniqueKeyCodec;
pub use varint::{append_varint, varint_len};
