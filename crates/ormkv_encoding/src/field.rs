//! Order-preserving encodings for single field values.
//!
//! Every encoding is self-delimiting and monotonic: for two values `a < b`
//! of the same kind, `encode(a) < encode(b)` bytewise. Concatenating
//! encodings therefore yields composite keys whose byte order is tuple order.
//!
//! ```text
//! bool              0x00 | 0x01
//! uint32 / uint64   big-endian, fixed width
//! int32 / int64     big-endian with the sign bit flipped, fixed width
//! enum              as int32
//! string / bytes    bytes with 0x00 escaped as 0x00 0xFF, then 0x00 0x00
//! timestamp         seconds as int64, then nanos as uint32
//! ```
//!
//! The terminator of string and bytes sorts below the escape, so a value
//! sorts before every value it is a proper prefix of, and a buffer that ends
//! inside a field is always reported as truncated.

use ormkv_schema::{Cardinality, FieldDescriptor, FieldKind, FieldValue, Timestamp};

use crate::error::{FieldDecodeError, FieldEncodeError, KvError, KvResult};
use crate::reader::KeyReader;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x00;

/// Codec for one key field, selected by the field's declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCodec {
    /// One byte, 0 or 1.
    Bool,
    /// Four bytes, sign bit flipped.
    Int32,
    /// Eight bytes, sign bit flipped.
    Int64,
    /// Four bytes.
    Uint32,
    /// Eight bytes.
    Uint64,
    /// Enum number, encoded like `Int32`.
    Enum,
    /// Escaped and terminated UTF-8.
    String,
    /// Escaped and terminated bytes.
    Bytes,
    /// `Int64` seconds then `Uint32` nanos.
    Timestamp,
}

impl FieldCodec {
    /// Selects the codec for a key field.
    ///
    /// # Errors
    ///
    /// Repeated fields have no total order and are rejected with
    /// `UnsupportedKeyField`.
    pub fn for_field(field: &FieldDescriptor) -> KvResult<Self> {
        if field.cardinality == Cardinality::Repeated {
            return Err(KvError::UnsupportedKeyField {
                field: field.name.clone(),
                reason: "repeated fields are not orderable".to_string(),
            });
        }
        Ok(Self::for_kind(field.kind))
    }

    /// Codec for a scalar kind.
    pub const fn for_kind(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => FieldCodec::Bool,
            FieldKind::Int32 => FieldCodec::Int32,
            FieldKind::Int64 => FieldCodec::Int64,
            FieldKind::Uint32 => FieldCodec::Uint32,
            FieldKind::Uint64 => FieldCodec::Uint64,
            FieldKind::Enum => FieldCodec::Enum,
            FieldKind::String => FieldCodec::String,
            FieldKind::Bytes => FieldCodec::Bytes,
            FieldKind::Timestamp => FieldCodec::Timestamp,
        }
    }

    /// Kind of value this codec accepts.
    pub const fn kind(self) -> FieldKind {
        match self {
            FieldCodec::Bool => FieldKind::Bool,
            FieldCodec::Int32 => FieldKind::Int32,
            FieldCodec::Int64 => FieldKind::Int64,
            FieldCodec::Uint32 => FieldKind::Uint32,
            FieldCodec::Uint64 => FieldKind::Uint64,
            FieldCodec::Enum => FieldKind::Enum,
            FieldCodec::String => FieldKind::String,
            FieldCodec::Bytes => FieldKind::Bytes,
            FieldCodec::Timestamp => FieldKind::Timestamp,
        }
    }

    /// Encoded width for fixed-size kinds, `None` for strings and bytes.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            FieldCodec::Bool => Some(1),
            FieldCodec::Int32 | FieldCodec::Uint32 | FieldCodec::Enum => Some(4),
            FieldCodec::Int64 | FieldCodec::Uint64 => Some(8),
            FieldCodec::Timestamp => Some(12),
            FieldCodec::String | FieldCodec::Bytes => None,
        }
    }

    /// Exact number of bytes [`FieldCodec::encode`] appends for `value`.
    pub fn encoded_len(self, value: &FieldValue) -> usize {
        if let Some(size) = self.fixed_size() {
            return size;
        }
        let raw: &[u8] = match value {
            FieldValue::String(s) => s.as_bytes(),
            FieldValue::Bytes(b) => b,
            _ => &[],
        };
        raw.len() + bytecount_zero(raw) + 2
    }

    /// Appends the encoding of `value` to `out`.
    ///
    /// # Errors
    ///
    /// Fails if `value` is not of this codec's kind, or is a timestamp with
    /// out-of-range nanoseconds. Nothing is appended on failure.
    pub fn encode(self, value: &FieldValue, out: &mut Vec<u8>) -> Result<(), FieldEncodeError> {
        match (self, value) {
            (FieldCodec::Bool, FieldValue::Bool(v)) => out.push(u8::from(*v)),
            (FieldCodec::Int32, FieldValue::Int32(v)) | (FieldCodec::Enum, FieldValue::Enum(v)) => {
                out.extend_from_slice(&flip_i32(*v).to_be_bytes());
            }
            (FieldCodec::Int64, FieldValue::Int64(v)) => {
                out.extend_from_slice(&flip_i64(*v).to_be_bytes());
            }
            (FieldCodec::Uint32, FieldValue::Uint32(v)) => {
                out.extend_from_slice(&v.to_be_bytes());
            }
            (FieldCodec::Uint64, FieldValue::Uint64(v)) => {
                out.extend_from_slice(&v.to_be_bytes());
            }
            (FieldCodec::String, FieldValue::String(s)) => encode_escaped(s.as_bytes(), out),
            (FieldCodec::Bytes, FieldValue::Bytes(b)) => encode_escaped(b, out),
            (FieldCodec::Timestamp, FieldValue::Timestamp(ts)) => {
                if !ts.is_valid() {
                    return Err(FieldEncodeError::InvalidNanos(ts.nanos));
                }
                out.extend_from_slice(&flip_i64(ts.seconds).to_be_bytes());
                out.extend_from_slice(&ts.nanos.to_be_bytes());
            }
            (codec, other) => {
                return Err(FieldEncodeError::KindMismatch {
                    expected: codec.kind(),
                    actual: other.type_name(),
                })
            }
        }
        Ok(())
    }

    /// Decodes one value, advancing `reader` past it.
    ///
    /// # Errors
    ///
    /// Fails if the input ends inside the field or the bytes are not a
    /// valid encoding for this kind.
    pub fn decode(self, reader: &mut KeyReader<'_>) -> Result<FieldValue, FieldDecodeError> {
        Ok(match self {
            FieldCodec::Bool => match reader.read_byte()? {
                0 => FieldValue::Bool(false),
                1 => FieldValue::Bool(true),
                other => return Err(FieldDecodeError::InvalidBool(other)),
            },
            FieldCodec::Int32 => FieldValue::Int32(unflip_i32(read_u32(reader)?)),
            FieldCodec::Enum => FieldValue::Enum(unflip_i32(read_u32(reader)?)),
            FieldCodec::Int64 => FieldValue::Int64(unflip_i64(read_u64(reader)?)),
            FieldCodec::Uint32 => FieldValue::Uint32(read_u32(reader)?),
            FieldCodec::Uint64 => FieldValue::Uint64(read_u64(reader)?),
            FieldCodec::String => {
                let bytes = decode_escaped(reader)?;
                let text = String::from_utf8(bytes).map_err(|_| FieldDecodeError::InvalidUtf8)?;
                FieldValue::String(text)
            }
            FieldCodec::Bytes => FieldValue::Bytes(decode_escaped(reader)?),
            FieldCodec::Timestamp => {
                let seconds = unflip_i64(read_u64(reader)?);
                let nanos = read_u32(reader)?;
                let ts = Timestamp::new(seconds, nanos);
                if !ts.is_valid() {
                    return Err(FieldDecodeError::InvalidNanos(nanos));
                }
                FieldValue::Timestamp(ts)
            }
        })
    }
}

fn read_u32(reader: &mut KeyReader<'_>) -> Result<u32, FieldDecodeError> {
    reader.read_array().map(u32::from_be_bytes)
}

fn read_u64(reader: &mut KeyReader<'_>) -> Result<u64, FieldDecodeError> {
    reader.read_array().map(u64::from_be_bytes)
}

#[allow(clippy::cast_sign_loss)]
fn flip_i32(v: i32) -> u32 {
    (v as u32) ^ 0x8000_0000
}

#[allow(clippy::cast_possible_wrap)]
fn unflip_i32(v: u32) -> i32 {
    (v ^ 0x8000_0000) as i32
}

#[allow(clippy::cast_sign_loss)]
fn flip_i64(v: i64) -> u64 {
    (v as u64) ^ 0x8000_0000_0000_0000
}

#[allow(clippy::cast_possible_wrap)]
fn unflip_i64(v: u64) -> i64 {
    (v ^ 0x8000_0000_0000_0000) as i64
}

fn bytecount_zero(raw: &[u8]) -> usize {
    raw.iter().filter(|&&b| b == ESCAPE).count()
}

fn encode_escaped(raw: &[u8], out: &mut Vec<u8>) {
    out.reserve(raw.len() + bytecount_zero(raw) + 2);
    for &b in raw {
        out.push(b);
        if b == ESCAPE {
            out.push(ESCAPED_ZERO);
        }
    }
    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}

fn decode_escaped(reader: &mut KeyReader<'_>) -> Result<Vec<u8>, FieldDecodeError> {
    let mut out = Vec::new();
    loop {
        match reader.read_byte()? {
            ESCAPE => match reader.read_byte()? {
                TERMINATOR => return Ok(out),
                ESCAPED_ZERO => out.push(0),
                other => return Err(FieldDecodeError::BadEscape(other)),
            },
            b => out.push(b),
        }
    }
}
