//! Property tests for composite key encoding.

use std::cmp::Ordering;

use ormkv_encoding::{KeyCodec, KeyDecode, KvError};
use ormkv_schema::{FieldKind, FieldValue};
use ormkv_testkit::{
    descriptor_for_kinds, field_names, field_value_strategy, key_kind_strategy,
    key_pair_strategy, key_schema_strategy, key_values_strategy,
};
use proptest::prelude::*;

const PREFIX: &[u8] = &[0x0F, 0x01, 0x00];

fn codec_for(kinds: &[FieldKind]) -> KeyCodec {
    KeyCodec::new(PREFIX.to_vec(), &descriptor_for_kinds(kinds), &field_names(kinds.len()))
        .unwrap()
}

/// Byte offsets at which each field's encoding ends.
fn field_boundaries(codec: &KeyCodec, values: &[FieldValue]) -> Vec<usize> {
    (0..=values.len())
        .map(|k| codec.compute_buffer_size(&values[..k]))
        .collect()
}

fn schema_and_values() -> impl Strategy<Value = (Vec<FieldKind>, Vec<FieldValue>)> {
    key_schema_strategy().prop_flat_map(|kinds| {
        let values = key_values_strategy(&kinds);
        (Just(kinds), values)
    })
}

proptest! {
    #[test]
    fn single_field_order_is_preserved(
        (kind, a, b) in key_kind_strategy().prop_flat_map(|kind| {
            (Just(kind), field_value_strategy(kind), field_value_strategy(kind))
        })
    ) {
        let codec = codec_for(&[kind]);
        let ea = codec.encode(&[a.clone()]).unwrap();
        let eb = codec.encode(&[b.clone()]).unwrap();
        prop_assert_eq!(ea.cmp(&eb), a.cmp(&b));
    }

    #[test]
    fn composite_order_matches_tuple_order((kinds, a, b) in key_pair_strategy()) {
        let codec = codec_for(&kinds);
        let ea = codec.encode(&a).unwrap();
        let eb = codec.encode(&b).unwrap();
        prop_assert_eq!(ea.cmp(&eb), codec.compare_keys(&a, &b));
    }

    #[test]
    fn decode_inverts_encode((kinds, values) in schema_and_values()) {
        let codec = codec_for(&kinds);
        let bytes = codec.encode(&values).unwrap();
        prop_assert_eq!(bytes.len(), codec.compute_buffer_size(&values));
        prop_assert_eq!(codec.decode(&bytes).unwrap(), KeyDecode::Full(values));
    }

    #[test]
    fn leading_fields_decode_as_partial((kinds, values) in schema_and_values()) {
        let codec = codec_for(&kinds);
        let full = codec.encode(&values).unwrap();
        for k in 0..values.len() {
            let probe = codec.encode_prefix(&values[..k]).unwrap();
            prop_assert!(full.starts_with(&probe));
            prop_assert_eq!(
                codec.decode(&probe).unwrap(),
                KeyDecode::Partial(values[..k].to_vec())
            );
        }
    }

    #[test]
    fn truncation_inside_a_field_is_detected((kinds, values) in schema_and_values()) {
        let codec = codec_for(&kinds);
        let full = codec.encode(&values).unwrap();
        let boundaries = field_boundaries(&codec, &values);

        for cut in PREFIX.len()..full.len() {
            let result = codec.decode(&full[..cut]);
            if boundaries.contains(&cut) {
                prop_assert!(matches!(result, Ok(KeyDecode::Partial(_))));
            } else {
                prop_assert!(
                    matches!(result, Err(KvError::Decoding { .. })),
                    "cut at {} of {}: {:?}", cut, full.len(), result
                );
            }
        }
    }

    #[test]
    fn prefix_scan_bounds_contain_extensions((kinds, values) in schema_and_values()) {
        let codec = codec_for(&kinds);
        let full = codec.encode(&values).unwrap();
        for k in 0..=values.len() {
            let (start, end) = codec.prefix_range(&values[..k]).unwrap();
            prop_assert!(start.as_slice() <= full.as_slice());
            if let Some(end) = end {
                prop_assert!(full < end);
            }
        }
    }

    #[test]
    fn proper_prefix_sorts_first((kinds, values) in schema_and_values()) {
        let codec = codec_for(&kinds);
        let k = values.len() - 1;
        prop_assert_eq!(codec.compare_keys(&values[..k], &values), Ordering::Less);
        prop_assert!(codec.encode_prefix(&values[..k]).unwrap() < codec.encode(&values).unwrap());
    }
}
