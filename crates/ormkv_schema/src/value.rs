//! Typed field values.

use std::fmt;

use crate::descriptor::{FieldDescriptor, FieldKind};

/// A point in time as seconds and nanoseconds since the Unix epoch.
///
/// Ordering is chronological: seconds first, then nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    /// Whole seconds, may be negative.
    pub seconds: i64,
    /// Sub-second nanoseconds, `0..1_000_000_000`.
    pub nanos: u32,
}

impl Timestamp {
    /// Largest valid nanosecond component plus one.
    pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

    /// Creates a timestamp.
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Returns true if the nanosecond component is in range.
    pub const fn is_valid(&self) -> bool {
        self.nanos < Self::NANOS_PER_SECOND
    }
}

/// The value of one record field.
///
/// Values of the same kind order naturally (numbers numerically, strings and
/// bytes bytewise, timestamps chronologically, lists lexicographically).
/// Values of different kinds order by variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldValue {
    /// Boolean.
    Bool(bool),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 32-bit integer.
    Uint32(u32),
    /// Unsigned 64-bit integer.
    Uint64(u64),
    /// Enum number.
    Enum(i32),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Timestamp.
    Timestamp(Timestamp),
    /// Elements of a repeated field.
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Zero value for a scalar kind.
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::Int32 => FieldValue::Int32(0),
            FieldKind::Int64 => FieldValue::Int64(0),
            FieldKind::Uint32 => FieldValue::Uint32(0),
            FieldKind::Uint64 => FieldValue::Uint64(0),
            FieldKind::Enum => FieldValue::Enum(0),
            FieldKind::String => FieldValue::String(String::new()),
            FieldKind::Bytes => FieldValue::Bytes(Vec::new()),
            FieldKind::Timestamp => FieldValue::Timestamp(Timestamp::default()),
        }
    }

    /// Value an unset field reads as: an empty list for repeated fields,
    /// the kind's zero value otherwise.
    pub fn default_for(field: &FieldDescriptor) -> Self {
        if field.is_repeated() {
            FieldValue::List(Vec::new())
        } else {
            Self::zero(field.kind)
        }
    }

    /// Scalar kind of this value, `None` for lists.
    pub fn kind(&self) -> Option<FieldKind> {
        Some(match self {
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Int32(_) => FieldKind::Int32,
            FieldValue::Int64(_) => FieldKind::Int64,
            FieldValue::Uint32(_) => FieldKind::Uint32,
            FieldValue::Uint64(_) => FieldKind::Uint64,
            FieldValue::Enum(_) => FieldKind::Enum,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Bytes(_) => FieldKind::Bytes,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::List(_) => return None,
        })
    }

    /// Returns true if this value can be stored in `field`.
    pub fn fits(&self, field: &FieldDescriptor) -> bool {
        match self {
            FieldValue::List(items) => {
                field.is_repeated() && items.iter().all(|v| v.kind() == Some(field.kind))
            }
            scalar => !field.is_repeated() && scalar.kind() == Some(field.kind),
        }
    }

    /// Returns true for the zero value of a scalar and for empty lists.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::List(items) => items.is_empty(),
            scalar => scalar.kind().map(Self::zero).as_ref() == Some(scalar),
        }
    }

    /// Short type name, for error messages.
    pub fn type_name(&self) -> String {
        match self.kind() {
            Some(kind) => kind.to_string(),
            None => "list".to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Int32(v) | FieldValue::Enum(v) => write!(f, "{v}"),
            FieldValue::Int64(v) => write!(f, "{v}"),
            FieldValue::Uint32(v) => write!(f, "{v}"),
            FieldValue::Uint64(v) => write!(f, "{v}"),
            FieldValue::String(v) => write!(f, "{v:?}"),
            FieldValue::Bytes(v) => {
                f.write_str("0x")?;
                v.iter().try_for_each(|b| write!(f, "{b:02x}"))
            }
            FieldValue::Timestamp(ts) => write!(f, "{}.{:09}", ts.seconds, ts.nanos),
            FieldValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int32(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int64(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Uint32(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Uint64(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(v: Timestamp) -> Self {
        FieldValue::Timestamp(v)
    }
}
