//! Known-answer vectors for key field encodings.
//!
//! Pin the exact bytes of each encoding so a change to the key layout,
//! which would orphan every stored row, shows up as a test failure.

use ormkv_schema::{FieldKind, FieldValue, Timestamp};

/// One field value and its expected key encoding.
#[derive(Debug, Clone)]
pub struct KeyVector {
    /// Unique identifier for this vector.
    pub id: &'static str,
    /// Kind of the key field.
    pub kind: FieldKind,
    /// Value to encode.
    pub value: FieldValue,
    /// Expected encoding (hex).
    pub expected_hex: &'static str,
}

/// Key field encoding vectors.
pub fn key_vectors() -> Vec<KeyVector> {
    use FieldKind as K;
    use FieldValue as V;

    vec![
        vector("bool_false", K::Bool, V::Bool(false), "00"),
        vector("bool_true", K::Bool, V::Bool(true), "01"),
        vector("int32_min", K::Int32, V::Int32(i32::MIN), "00000000"),
        vector("int32_neg1", K::Int32, V::Int32(-1), "7fffffff"),
        vector("int32_0", K::Int32, V::Int32(0), "80000000"),
        vector("int64_1", K::Int64, V::Int64(1), "8000000000000001"),
        vector("uint32_258", K::Uint32, V::Uint32(258), "00000102"),
        vector("uint64_42", K::Uint64, V::Uint64(42), "000000000000002a"),
        vector("enum_3", K::Enum, V::Enum(3), "80000003"),
        vector("string_empty", K::String, V::from(""), "0000"),
        vector("string_abc", K::String, V::from("abc"), "6162630000"),
        vector("string_nul", K::String, V::from("a\0b"), "6100ff620000"),
        vector("bytes_ff00", K::Bytes, V::Bytes(vec![0xFF, 0x00]), "ff00ff0000"),
        vector(
            "timestamp_1s_5ns",
            K::Timestamp,
            V::Timestamp(Timestamp::new(1, 5)),
            "800000000000000100000005",
        ),
        vector(
            "timestamp_neg1s",
            K::Timestamp,
            V::Timestamp(Timestamp::new(-1, 0)),
            "7fffffffffffffff00000000",
        ),
    ]
}

fn vector(id: &'static str, kind: FieldKind, value: FieldValue, expected_hex: &'static str) -> KeyVector {
    KeyVector {
        id,
        kind,
        value,
        expected_hex,
    }
}

/// Lowercase hex encoding.
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormkv_encoding::{FieldCodec, KeyReader};

    #[test]
    fn vectors_match_encoder() {
        for v in key_vectors() {
            let codec = FieldCodec::for_kind(v.kind);
            let mut out = Vec::new();
            codec.encode(&v.value, &mut out).unwrap();
            assert_eq!(hex_encode(&out), v.expected_hex, "vector {}", v.id);

            let mut reader = KeyReader::new(&out);
            assert_eq!(codec.decode(&mut reader).unwrap(), v.value, "vector {}", v.id);
            assert!(reader.is_empty(), "vector {}", v.id);
        }
    }

    #[test]
    fn vector_ids_are_unique() {
        let mut ids: Vec<_> = key_vectors().iter().map(|v| v.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), key_vectors().len());
    }

    #[test]
    fn hex() {
        assert_eq!(hex_encode(&[0x00, 0xab, 0x10]), "00ab10");
    }
}
