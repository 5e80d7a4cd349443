//! Schema and table fixtures shared by tests and benches.

use std::sync::Arc;
use std::sync::Once;

use ormkv_encoding::{TableCodecs, TableDescriptor};
use ormkv_schema::{DynamicRecord, FieldKind, MessageDescriptor, Timestamp};
use tracing_subscriber::EnvFilter;

/// Module prefix used by fixture tables.
pub const TEST_MODULE_PREFIX: &[u8] = &[0x0F];

/// Installs a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// `test.Account`: keyed by `(region, id)`, indexed by `name` and uniquely
/// by `email`.
pub fn account_descriptor() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("test.Account")
        .field("region", 1, FieldKind::String)
        .field("id", 2, FieldKind::Uint64)
        .field("name", 3, FieldKind::String)
        .field("email", 4, FieldKind::String)
        .field("created", 5, FieldKind::Timestamp)
        .optional("balance", 6, FieldKind::Int64)
        .repeated("tags", 7, FieldKind::String)
        .build()
        .expect("account descriptor is valid")
}

/// Table configuration for `test.Account`.
pub fn account_table() -> TableDescriptor {
    TableDescriptor::new(1, ["region", "id"])
        .index(1, ["name"])
        .unique_index(2, ["email"])
}

/// Codecs for `test.Account` under [`TEST_MODULE_PREFIX`].
pub fn account_codecs() -> TableCodecs {
    TableCodecs::build(TEST_MODULE_PREFIX, account_descriptor(), &account_table())
        .expect("account table is valid")
}

/// An account with the given key and name; email derives from the name.
pub fn account(region: &str, id: u64, name: &str) -> DynamicRecord {
    DynamicRecord::new(account_descriptor())
        .with("region", region)
        .and_then(|r| r.with("id", id))
        .and_then(|r| r.with("name", name))
        .and_then(|r| r.with("email", format!("{name}@example.com")))
        .and_then(|r| r.with("created", Timestamp::new(1_700_000_000, 0)))
        .expect("account fields match the descriptor")
}

/// `test.Counter`: a single auto-increment `uint64` key.
pub fn counter_descriptor() -> Arc<MessageDescriptor> {
    MessageDescriptor::builder("test.Counter")
        .field("id", 1, FieldKind::Uint64)
        .field("label", 2, FieldKind::String)
        .build()
        .expect("counter descriptor is valid")
}

/// Table configuration for `test.Counter`.
pub fn counter_table() -> TableDescriptor {
    TableDescriptor::new(2, ["id"]).auto_increment(true).index(1, ["label"])
}

/// Codecs for `test.Counter` under [`TEST_MODULE_PREFIX`].
pub fn counter_codecs() -> TableCodecs {
    TableCodecs::build(TEST_MODULE_PREFIX, counter_descriptor(), &counter_table())
        .expect("counter table is valid")
}

/// A descriptor with one singular field per kind, named `f0`, `f1`, ...
pub fn descriptor_for_kinds(kinds: &[FieldKind]) -> Arc<MessageDescriptor> {
    kinds
        .iter()
        .zip(1u32..)
        .fold(MessageDescriptor::builder("test.Key"), |builder, (kind, number)| {
            builder.field(format!("f{}", number - 1), number, *kind)
        })
        .build()
        .expect("generated descriptor is valid")
}

/// Field names of [`descriptor_for_kinds`] in order.
pub fn field_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("f{i}")).collect()
}
