//! # ormkv Testkit
//!
//! Test utilities for ormkv.
//!
//! This crate provides:
//! - `MemoryStore`: an in-memory sorted key/value store
//! - `TestTable`: a minimal table layer writing rows through the codecs
//! - Schema and table fixtures
//! - Property-based test generators using proptest
//! - Known-answer vectors for key encodings
//! - `init_tracing` for opting into log output with `RUST_LOG`
//!
//! ## Usage
//!
//! ```rust
//! use ormkv_testkit::prelude::*;
//!
//! let store = MemoryStore::new();
//! let table = TestTable::new(account_codecs(), &store);
//! table.save(&mut account("eu", 7, "bob")).unwrap();
//! assert_eq!(store.len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod store;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::store::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use store::*;
pub use vectors::*;
