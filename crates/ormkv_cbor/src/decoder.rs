//! Canonical CBOR decoder.

use std::cmp::Ordering;

use crate::error::{CborError, CborResult};
use crate::value::Value;

/// Decode exactly one value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid canonical CBOR, contain
/// forbidden constructs (floats, tags, indefinite-length items), or carry
/// trailing bytes after the value.
pub fn from_cbor(bytes: &[u8]) -> CborResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CborError::TrailingBytes {
            count: decoder.remaining().len(),
        });
    }
    Ok(value)
}

/// A canonical CBOR decoder.
///
/// This decoder validates that input follows canonical CBOR rules
/// and rejects forbidden constructs.
pub struct CanonicalDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Maximum allowed element count for arrays and maps.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum allowed byte/string length.
const MAX_BYTES_LENGTH: u64 = 256 * 1024 * 1024;

/// Maximum nesting depth of arrays and maps.
const MAX_DEPTH: usize = 64;

impl<'a> CanonicalDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> CborResult<Value> {
        self.decode_at_depth(0)
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    fn decode_at_depth(&mut self, depth: usize) -> CborResult<Value> {
        if depth > MAX_DEPTH {
            return Err(CborError::invalid_structure("nesting too deep"));
        }

        let initial_byte = self.read_byte()?;
        let major_type = initial_byte >> 5;
        let additional_info = initial_byte & 0x1f;

        match major_type {
            0 => self
                .decode_argument(additional_info)
                .map(|n| Value::Integer(i128::from(n))),
            1 => self
                .decode_argument(additional_info)
                .map(|n| Value::Integer(-1 - i128::from(n))),
            2 => {
                let bytes = self.decode_string_body(additional_info)?;
                Ok(Value::Bytes(bytes.to_vec()))
            }
            3 => {
                let bytes = self.decode_string_body(additional_info)?;
                let text = std::str::from_utf8(bytes).map_err(|_| CborError::InvalidUtf8)?;
                Ok(Value::Text(text.to_string()))
            }
            4 => self.decode_array(additional_info, depth),
            5 => self.decode_map(additional_info, depth),
            6 => Err(CborError::unsupported_type("tagged value")),
            7 => self.decode_simple(additional_info),
            _ => Err(CborError::invalid_structure("invalid major type")),
        }
    }

    #[inline]
    fn read_byte(&mut self) -> CborResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CborError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CborResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CborError::UnexpectedEof)?;
        let bytes = self.data.get(self.pos..end).ok_or(CborError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> CborResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn decode_argument(&mut self, additional_info: u8) -> CborResult<u64> {
        let (value, shorter_fits) = match additional_info {
            0..=23 => return Ok(u64::from(additional_info)),
            24 => {
                let byte = self.read_byte()?;
                (u64::from(byte), byte < 24)
            }
            25 => {
                let value = u16::from_be_bytes(self.read_array()?);
                (u64::from(value), u8::try_from(value).is_ok())
            }
            26 => {
                let value = u32::from_be_bytes(self.read_array()?);
                (u64::from(value), u16::try_from(value).is_ok())
            }
            27 => {
                let value = u64::from_be_bytes(self.read_array()?);
                (value, u32::try_from(value).is_ok())
            }
            31 => return Err(CborError::IndefiniteLengthForbidden),
            _ => return Err(CborError::invalid_structure("reserved additional info")),
        };
        if shorter_fits {
            return Err(CborError::invalid_structure(
                "non-canonical: value could be encoded in fewer bytes",
            ));
        }
        Ok(value)
    }

    fn decode_length(&mut self, additional_info: u8, max_allowed: u64) -> CborResult<usize> {
        let claimed = self.decode_argument(additional_info)?;
        if claimed > max_allowed {
            return Err(CborError::SizeLimitExceeded {
                claimed,
                max_allowed,
            });
        }
        usize::try_from(claimed).map_err(|_| CborError::IntegerOverflow)
    }

    fn decode_string_body(&mut self, additional_info: u8) -> CborResult<&'a [u8]> {
        let len = self.decode_length(additional_info, MAX_BYTES_LENGTH)?;
        self.read_bytes(len)
    }

    fn decode_array(&mut self, additional_info: u8, depth: usize) -> CborResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity(len.min(self.remaining().len()));
        for _ in 0..len {
            items.push(self.decode_at_depth(depth + 1)?);
        }
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, additional_info: u8, depth: usize) -> CborResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut pairs = Vec::with_capacity(len.min(self.remaining().len() / 2));
        let mut prev_key: Option<&'a [u8]> = None;

        for _ in 0..len {
            let key_start = self.pos;
            let key = self.decode_at_depth(depth + 1)?;
            let key_bytes = &self.data[key_start..self.pos];

            if let Some(prev) = prev_key {
                if compare_cbor_bytes(prev, key_bytes) != Ordering::Less {
                    return Err(CborError::invalid_structure(
                        "non-canonical: map keys not in sorted order",
                    ));
                }
            }
            prev_key = Some(key_bytes);

            let value = self.decode_at_depth(depth + 1)?;
            pairs.push((key, value));
        }

        Ok(Value::Map(pairs))
    }

    fn decode_simple(&mut self, additional_info: u8) -> CborResult<Value> {
        match additional_info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            24 => {
                let simple = self.read_byte()?;
                Err(CborError::unsupported_type(format!("simple value {simple}")))
            }
            25..=27 => Err(CborError::FloatForbidden),
            31 => Err(CborError::invalid_structure("break without indefinite")),
            _ => Err(CborError::unsupported_type(format!(
                "simple value {additional_info}"
            ))),
        }
    }
}

/// Length-first, then bytewise comparison of encoded map keys.
fn compare_cbor_bytes(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{MAX_INTEGER, MIN_INTEGER};

    #[test]
    fn decode_integers() {
        assert_eq!(from_cbor(&[0x17]).unwrap(), Value::Integer(23));
        assert_eq!(from_cbor(&[0x18, 24]).unwrap(), Value::Integer(24));
        assert_eq!(from_cbor(&[0x19, 0x01, 0x00]).unwrap(), Value::Integer(256));
        assert_eq!(from_cbor(&[0x20]).unwrap(), Value::Integer(-1));
        assert_eq!(from_cbor(&[0x38, 99]).unwrap(), Value::Integer(-100));
    }

    #[test]
    fn decode_full_integer_range_without_saturation() {
        let max = [0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(from_cbor(&max).unwrap(), Value::Integer(MAX_INTEGER));
        let min = [0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(from_cbor(&min).unwrap(), Value::Integer(MIN_INTEGER));
    }

    #[test]
    fn decode_text_and_map() {
        assert_eq!(
            from_cbor(&[0x61, b'a']).unwrap(),
            Value::Text("a".to_string())
        );
        assert_eq!(
            from_cbor(&[0xa1, 0x01, 0x61, b'a']).unwrap(),
            Value::Map(vec![(Value::Integer(1), Value::Text("a".to_string()))])
        );
    }

    #[test]
    fn reject_float() {
        assert!(matches!(
            from_cbor(&[0xf9, 0x00, 0x00]),
            Err(CborError::FloatForbidden)
        ));
        assert!(matches!(
            from_cbor(&[0xfb, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(CborError::FloatForbidden)
        ));
    }

    #[test]
    fn reject_indefinite_length() {
        assert!(matches!(
            from_cbor(&[0x5f, 0x41, b'a', 0xff]),
            Err(CborError::IndefiniteLengthForbidden)
        ));
        assert!(matches!(
            from_cbor(&[0x9f, 0x01, 0xff]),
            Err(CborError::IndefiniteLengthForbidden)
        ));
    }

    #[test]
    fn reject_tags() {
        assert!(matches!(
            from_cbor(&[0xc1, 0x01]),
            Err(CborError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn reject_non_shortest_encoding() {
        assert!(matches!(
            from_cbor(&[0x18, 23]),
            Err(CborError::InvalidStructure { .. })
        ));
        assert!(matches!(
            from_cbor(&[0x19, 0x00, 0xff]),
            Err(CborError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn reject_unsorted_map_keys() {
        assert!(matches!(
            from_cbor(&[0xa2, 0x02, 0x01, 0x01, 0x02]),
            Err(CborError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn reject_trailing_bytes() {
        assert_eq!(
            from_cbor(&[0x01, 0x02]),
            Err(CborError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn unexpected_eof() {
        assert!(matches!(from_cbor(&[]), Err(CborError::UnexpectedEof)));
        assert!(matches!(from_cbor(&[0x18]), Err(CborError::UnexpectedEof)));
        assert!(matches!(from_cbor(&[0x62, b'a']), Err(CborError::UnexpectedEof)));
    }

    #[test]
    fn huge_length_claims_are_rejected() {
        assert!(matches!(
            from_cbor(&[0x5b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
            Err(CborError::SizeLimitExceeded { .. })
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert!(matches!(
            from_cbor(&[0x62, 0xff, 0xfe]),
            Err(CborError::InvalidUtf8)
        ));
    }
}
