//! Deterministic record body serialization.
//!
//! A body is a canonical CBOR map from field number to field value holding
//! only the populated fields. Canonical map ordering makes the bytes a pure
//! function of the record's field values, so field-equal records always
//! serialize identically.
//!
//! | Field kind | CBOR item |
//! |------------|-----------|
//! | bool | bool |
//! | int32, int64, uint32, uint64, enum | integer |
//! | string | text |
//! | bytes | byte string |
//! | timestamp | `[seconds, nanos]` |
//! | repeated | array of the element items |

use ormkv_cbor::{from_cbor, to_canonical_cbor, Value};

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::error::{SchemaError, SchemaResult};
use crate::record::Record;
use crate::value::{FieldValue, Timestamp};

/// Serializes the populated fields of a record.
///
/// # Errors
///
/// Propagates CBOR encoding failures.
pub fn marshal(record: &dyn Record) -> SchemaResult<Vec<u8>> {
    let pairs = record
        .descriptor()
        .fields()
        .iter()
        .filter(|field| record.has(field))
        .map(|field| {
            (
                Value::from(field.number),
                value_to_cbor(&record.get(field)),
            )
        })
        .collect();
    Ok(to_canonical_cbor(&Value::Map(pairs))?)
}

/// Replaces the contents of `record` with the fields stored in `bytes`.
///
/// Every field is cleared first. Field numbers unknown to the record's
/// descriptor are skipped so bodies written by a wider schema still load.
///
/// # Errors
///
/// Fails with `Cbor` for invalid CBOR and `MalformedBody` when the CBOR does
/// not match the descriptor.
pub fn unmarshal(bytes: &[u8], record: &mut dyn Record) -> SchemaResult<()> {
    let descriptor = record.descriptor().clone();
    let root = from_cbor(bytes)?;
    let pairs = root
        .as_map()
        .ok_or_else(|| SchemaError::malformed_body(format!("expected map, got {}", root.type_name())))?;

    for field in descriptor.fields() {
        record.clear(field);
    }

    for (key, item) in pairs {
        let number = key
            .as_integer()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| SchemaError::malformed_body("field key is not a field number"))?;
        let Some(field) = descriptor.field_by_number(number) else {
            continue;
        };
        let value = cbor_to_value(field, item)?;
        record.set(field, value)?;
    }
    Ok(())
}

fn value_to_cbor(value: &FieldValue) -> Value {
    match value {
        FieldValue::Bool(v) => Value::Bool(*v),
        FieldValue::Int32(v) | FieldValue::Enum(v) => Value::from(*v),
        FieldValue::Int64(v) => Value::from(*v),
        FieldValue::Uint32(v) => Value::from(*v),
        FieldValue::Uint64(v) => Value::from(*v),
        FieldValue::String(v) => Value::Text(v.clone()),
        FieldValue::Bytes(v) => Value::Bytes(v.clone()),
        FieldValue::Timestamp(ts) => {
            Value::Array(vec![Value::from(ts.seconds), Value::from(ts.nanos)])
        }
        FieldValue::List(items) => Value::Array(items.iter().map(value_to_cbor).collect()),
    }
}

fn cbor_to_value(field: &FieldDescriptor, item: &Value) -> SchemaResult<FieldValue> {
    if field.is_repeated() {
        let items = item.as_array().ok_or_else(|| mismatch(field, item))?;
        return items
            .iter()
            .map(|element| cbor_to_scalar(field, element))
            .collect::<SchemaResult<Vec<_>>>()
            .map(FieldValue::List);
    }
    cbor_to_scalar(field, item)
}

fn cbor_to_scalar(field: &FieldDescriptor, item: &Value) -> SchemaResult<FieldValue> {
    let value = match field.kind {
        FieldKind::Bool => item.as_bool().map(FieldValue::Bool),
        FieldKind::Int32 => integer(item).map(FieldValue::Int32),
        FieldKind::Int64 => integer(item).map(FieldValue::Int64),
        FieldKind::Uint32 => integer(item).map(FieldValue::Uint32),
        FieldKind::Uint64 => integer(item).map(FieldValue::Uint64),
        FieldKind::Enum => integer(item).map(FieldValue::Enum),
        FieldKind::String => item.as_text().map(|s| FieldValue::String(s.to_string())),
        FieldKind::Bytes => item.as_bytes().map(|b| FieldValue::Bytes(b.to_vec())),
        FieldKind::Timestamp => timestamp(item).map(FieldValue::Timestamp),
    };
    value.ok_or_else(|| mismatch(field, item))
}

fn integer<T: TryFrom<i128>>(item: &Value) -> Option<T> {
    item.as_integer().and_then(|n| T::try_from(n).ok())
}

fn timestamp(item: &Value) -> Option<Timestamp> {
    match item.as_array()? {
        [seconds, nanos] => {
            let ts = Timestamp::new(integer(seconds)?, integer(nanos)?);
            ts.is_valid().then_some(ts)
        }
        _ => None,
    }
}

fn mismatch(field: &FieldDescriptor, item: &Value) -> SchemaError {
    SchemaError::malformed_body(format!(
        "field `{}` ({}) cannot hold CBOR {}",
        field.name,
        field.kind,
        item.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MessageDescriptor;
    use crate::record::DynamicRecord;
    use std::sync::Arc;

    fn account() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("test.Account")
            .field("region", 1, FieldKind::String)
            .field("id", 2, FieldKind::Uint64)
            .field("name", 3, FieldKind::String)
            .field("balance", 4, FieldKind::Int64)
            .field("created", 5, FieldKind::Timestamp)
            .repeated("tags", 6, FieldKind::String)
            .field("avatar", 7, FieldKind::Bytes)
            .build()
            .unwrap()
    }

    fn sample() -> DynamicRecord {
        DynamicRecord::new(account())
            .with("region", "us-east")
            .unwrap()
            .with("id", 42u64)
            .unwrap()
            .with("name", "alice")
            .unwrap()
            .with("balance", -17i64)
            .unwrap()
            .with("created", Timestamp::new(1_700_000_000, 5))
            .unwrap()
            .with(
                "tags",
                FieldValue::List(vec!["admin".into(), "beta".into()]),
            )
            .unwrap()
            .with("avatar", vec![0u8, 255])
            .unwrap()
    }

    #[test]
    fn marshal_unmarshal_roundtrip() {
        let record = sample();
        let bytes = marshal(&record).unwrap();
        let mut decoded = DynamicRecord::new(account());
        unmarshal(&bytes, &mut decoded).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn marshal_is_deterministic() {
        let a = sample();
        // Same values populated in a different order.
        let b = DynamicRecord::new(account())
            .with("avatar", vec![0u8, 255])
            .unwrap()
            .with(
                "tags",
                FieldValue::List(vec!["admin".into(), "beta".into()]),
            )
            .unwrap()
            .with("created", Timestamp::new(1_700_000_000, 5))
            .unwrap()
            .with("balance", -17i64)
            .unwrap()
            .with("name", "alice")
            .unwrap()
            .with("id", 42u64)
            .unwrap()
            .with("region", "us-east")
            .unwrap();
        assert_eq!(marshal(&a).unwrap(), marshal(&b).unwrap());
    }

    #[test]
    fn empty_record_is_empty_map() {
        let record = DynamicRecord::new(account());
        assert_eq!(marshal(&record).unwrap(), vec![0xa0]);
    }

    #[test]
    fn unmarshal_replaces_previous_contents() {
        let mut record = sample();
        let only_name = DynamicRecord::new(account()).with("name", "bob").unwrap();
        unmarshal(&marshal(&only_name).unwrap(), &mut record).unwrap();
        assert_eq!(record, only_name);
    }

    #[test]
    fn unknown_field_numbers_are_skipped() {
        let bytes = to_canonical_cbor(&Value::Map(vec![
            (Value::from(3u32), Value::from("carol")),
            (Value::from(99u32), Value::from(true)),
        ]))
        .unwrap();
        let mut record = DynamicRecord::new(account());
        unmarshal(&bytes, &mut record).unwrap();
        assert_eq!(record.get_by_name("name"), Some(FieldValue::from("carol")));
        assert_eq!(record.populated_len(), 1);
    }

    #[test]
    fn kind_mismatch_is_malformed_body() {
        let bytes =
            to_canonical_cbor(&Value::Map(vec![(Value::from(2u32), Value::from("x"))])).unwrap();
        let mut record = DynamicRecord::new(account());
        assert!(matches!(
            unmarshal(&bytes, &mut record),
            Err(SchemaError::MalformedBody { .. })
        ));
    }

    #[test]
    fn out_of_range_integer_is_malformed_body() {
        let bytes =
            to_canonical_cbor(&Value::Map(vec![(Value::from(2u32), Value::from(-1i64))])).unwrap();
        let mut record = DynamicRecord::new(account());
        assert!(matches!(
            unmarshal(&bytes, &mut record),
            Err(SchemaError::MalformedBody { .. })
        ));
    }

    #[test]
    fn corrupt_body_propagates_cbor_error() {
        let mut record = DynamicRecord::new(account());
        assert!(matches!(
            unmarshal(&[0xa1, 0x01], &mut record),
            Err(SchemaError::Cbor(_))
        ));
    }
}
