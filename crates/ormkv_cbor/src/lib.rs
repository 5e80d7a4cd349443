//! # ormkv CBOR
//!
//! Canonical CBOR encoding/decoding for ormkv record bodies.
//!
//! Record bodies stored under a primary key must serialize deterministically:
//! two field-equal records always produce identical bytes, so the stored
//! content stays stable and byte-level hashes or diffs remain meaningful.
//!
//! ## Canonical CBOR Rules
//!
//! - Maps are sorted by key (length-first, then bytewise on the encoded key)
//! - Integers use the shortest encoding
//! - No floats
//! - Strings must be UTF-8
//! - No indefinite-length items and no tags
//! - A buffer holds exactly one top-level item
//!
//! ## Usage
//!
//! ```
//! use ormkv_cbor::{from_cbor, to_canonical_cbor, Value};
//!
//! let value = Value::Map(vec![(Value::Integer(1), Value::Text("alice".into()))]);
//! let bytes = to_canonical_cbor(&value).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CborError, CborResult};
pub use value::{Value, MAX_INTEGER, MIN_INTEGER};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (MIN_INTEGER..=MAX_INTEGER).prop_map(Value::Integer),
            prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
            ".{0,16}".prop_map(Value::Text),
        ]
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            items in prop::collection::vec(leaf_strategy(), 0..8),
            field in 0u32..1000,
        ) {
            let value = Value::Map(vec![(Value::from(field), Value::Array(items))]);
            let bytes = to_canonical_cbor(&value).unwrap();
            prop_assert_eq!(from_cbor(&bytes).unwrap(), value);
        }
    }

    fn roundtrip(value: Value) {
        let bytes = to_canonical_cbor(&value).unwrap();
        let decoded = from_cbor(&bytes).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn roundtrip_integer_extremes() {
        roundtrip(Value::Integer(0));
        roundtrip(Value::Integer(-100));
        roundtrip(Value::Integer(i128::from(u64::MAX)));
        roundtrip(Value::Integer(MIN_INTEGER));
    }

    #[test]
    fn roundtrip_record_body_shape() {
        roundtrip(Value::Map(vec![
            (Value::Integer(1), Value::Text("us-east".into())),
            (Value::Integer(2), Value::Integer(42)),
            (
                Value::Integer(3),
                Value::Array(vec![Value::Bytes(vec![0, 1]), Value::Bool(true)]),
            ),
        ]));
    }

    #[test]
    fn map_insertion_order_does_not_change_bytes() {
        let a = Value::Map(vec![
            (Value::Integer(10), Value::Null),
            (Value::Integer(2), Value::Bool(false)),
        ]);
        let b = Value::Map(vec![
            (Value::Integer(2), Value::Bool(false)),
            (Value::Integer(10), Value::Null),
        ]);
        assert_eq!(to_canonical_cbor(&a).unwrap(), to_canonical_cbor(&b).unwrap());
    }
}
