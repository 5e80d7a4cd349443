//! Order-preserving variable-length integers for table and index ids.
//!
//! Prefix bytes of every row are `module prefix ++ varint(table id) ++
//! varint(index id)`. The encoding is self-delimiting, so distinct ids never
//! produce one prefix that is a prefix of another, and encoded ids sort in
//! numeric order.
//!
//! | Value Range           | Bytes | Format                            |
//! |-----------------------|-------|-----------------------------------|
//! | 0 - 240               | 1     | `[value]`                         |
//! | 241 - 2287            | 2     | `[241 + (v-240)>>8, (v-240)&FF]`  |
//! | 2288 - 67823          | 3     | `[249, (v-2288)>>8, (v-2288)&FF]` |
//! | 67824 - 16777215      | 4     | `[250, v>>16, v>>8, v]`           |
//! | 16777216 - u32::MAX   | 5     | `[251, v>>24, v>>16, v>>8, v]`    |

/// Number of bytes [`append_varint`] writes for `value`.
pub fn varint_len(value: u32) -> usize {
    match value {
        0..=240 => 1,
        241..=2287 => 2,
        2288..=67823 => 3,
        67824..=0xFF_FFFF => 4,
        _ => 5,
    }
}

/// Appends the encoding of `value` to `out`.
#[allow(clippy::cast_possible_truncation)]
pub fn append_varint(out: &mut Vec<u8>, value: u32) {
    match value {
        0..=240 => out.push(value as u8),
        241..=2287 => {
            let v = value - 240;
            out.push(((v >> 8) + 241) as u8);
            out.push(v as u8);
        }
        2288..=67823 => {
            let v = value - 2288;
            out.extend_from_slice(&[249, (v >> 8) as u8, v as u8]);
        }
        67824..=0xFF_FFFF => {
            out.extend_from_slice(&[250, (value >> 16) as u8, (value >> 8) as u8, value as u8]);
        }
        _ => {
            out.push(251);
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
}
