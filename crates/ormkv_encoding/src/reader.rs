//! Cursor over key bytes.

use crate::error::FieldDecodeError;

/// A forward-only cursor over an encoded key.
///
/// Field codecs pull bytes from the cursor; running out of bytes inside a
/// field is `Truncated`, while the key codec checks [`KeyReader::is_empty`]
/// between fields to detect a prefix key.
#[derive(Debug, Clone)]
pub struct KeyReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> KeyReader<'a> {
    /// Creates a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns true once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Consumes `prefix` if the remaining bytes start with it.
    pub fn strip_prefix(&mut self, prefix: &[u8]) -> bool {
        if self.remaining().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Reads one byte.
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8, FieldDecodeError> {
        let byte = *self.data.get(self.pos).ok_or(FieldDecodeError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly `N` bytes.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FieldDecodeError> {
        let end = self.pos + N;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(FieldDecodeError::Truncated)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }
}
