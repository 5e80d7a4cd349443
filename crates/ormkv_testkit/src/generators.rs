//! Property-based test generators using proptest.
//!
//! Strategies produce well-typed values for key fields and whole key
//! schemas, so properties can range over every field kind at once.

use ormkv_schema::{DynamicRecord, FieldKind, FieldValue, SchemaResult, Timestamp};
use proptest::prelude::*;

use crate::fixtures::account_descriptor;

/// Every kind usable in a key.
pub const KEY_KINDS: [FieldKind; 9] = [
    FieldKind::Bool,
    FieldKind::Int32,
    FieldKind::Int64,
    FieldKind::Uint32,
    FieldKind::Uint64,
    FieldKind::Enum,
    FieldKind::String,
    FieldKind::Bytes,
    FieldKind::Timestamp,
];

/// Strategy for one key field kind.
pub fn key_kind_strategy() -> impl Strategy<Value = FieldKind> {
    prop::sample::select(KEY_KINDS.to_vec())
}

/// Strategy for a composite key schema of 1 to 4 fields.
pub fn key_schema_strategy() -> impl Strategy<Value = Vec<FieldKind>> {
    prop::collection::vec(key_kind_strategy(), 1..=4)
}

/// Strategy for valid timestamps.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (any::<i64>(), 0..Timestamp::NANOS_PER_SECOND).prop_map(|(s, n)| Timestamp::new(s, n))
}

/// Strategy for byte strings rich in the bytes the escaping cares about.
fn escaped_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(0x00u8), Just(0x01u8), Just(0xFFu8), any::<u8>()],
        0..12,
    )
}

/// Strategy for a value of `kind`.
pub fn field_value_strategy(kind: FieldKind) -> BoxedStrategy<FieldValue> {
    match kind {
        FieldKind::Bool => any::<bool>().prop_map(FieldValue::Bool).boxed(),
        FieldKind::Int32 => any::<i32>().prop_map(FieldValue::Int32).boxed(),
        FieldKind::Int64 => any::<i64>().prop_map(FieldValue::Int64).boxed(),
        FieldKind::Uint32 => any::<u32>().prop_map(FieldValue::Uint32).boxed(),
        FieldKind::Uint64 => any::<u64>().prop_map(FieldValue::Uint64).boxed(),
        FieldKind::Enum => any::<i32>().prop_map(FieldValue::Enum).boxed(),
        FieldKind::String => prop_oneof![
            "[a-c\\x00]{0,6}",
            ".{0,8}",
        ]
        .prop_map(FieldValue::String)
        .boxed(),
        FieldKind::Bytes => escaped_bytes_strategy().prop_map(FieldValue::Bytes).boxed(),
        FieldKind::Timestamp => timestamp_strategy().prop_map(FieldValue::Timestamp).boxed(),
    }
}

/// Strategy for one value per kind, in order.
pub fn key_values_strategy(kinds: &[FieldKind]) -> BoxedStrategy<Vec<FieldValue>> {
    kinds
        .iter()
        .map(|&kind| field_value_strategy(kind))
        .collect::<Vec<_>>()
        .boxed()
}

/// Strategy for a key schema together with two keys of that schema.
pub fn key_pair_strategy() -> impl Strategy<Value = (Vec<FieldKind>, Vec<FieldValue>, Vec<FieldValue>)>
{
    key_schema_strategy().prop_flat_map(|kinds| {
        let a = key_values_strategy(&kinds);
        let b = key_values_strategy(&kinds);
        (Just(kinds), a, b)
    })
}

/// Strategy for `test.Account` records with arbitrary populated fields.
pub fn account_record_strategy() -> impl Strategy<Value = DynamicRecord> {
    (
        field_value_strategy(FieldKind::String),
        any::<u64>(),
        ".{0,8}",
        prop::option::of(any::<i64>()),
        prop::collection::vec("[a-z]{1,4}", 0..3),
        timestamp_strategy(),
    )
        .prop_map(|(region, id, name, balance, tags, created)| {
            let build = || -> SchemaResult<DynamicRecord> {
                let tags = tags.into_iter().map(FieldValue::String).collect();
                let mut record = DynamicRecord::new(account_descriptor())
                    .with("region", region)?
                    .with("id", id)?
                    .with("name", name)?
                    .with("created", created)?
                    .with("tags", FieldValue::List(tags))?;
                if let Some(balance) = balance {
                    record = record.with("balance", balance)?;
                }
                Ok(record)
            };
            build().expect("generated account fields match the descriptor")
        })
}
