//! # Read Cursor
//!
//! A forward-only cursor over a borrowed byte slice. Every read checks the
//! remaining length first, so a truncated buffer yields
//! [`DecodeError::UnexpectedEof`] instead of a panic or a partial value.
//! The underlying slice is never modified.

use crate::core::tag;
use crate::error::DecodeError;

/// Bounds-checked cursor used by all decoders.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEof {
                needed: 1,
                remaining: 0,
            })
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Consume exactly `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(DecodeError::UnexpectedEof {
                needed: len,
                remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Consume a fixed-size array, e.g. a big-endian integer body.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Consume a tag byte, failing unless it equals `expected`.
    pub fn expect_tag(&mut self, expected: u8) -> Result<(), DecodeError> {
        let found = self.peek_u8()?;
        if found == expected {
            self.pos += 1;
            Ok(())
        } else if tag::is_known(found) {
            Err(DecodeError::UnexpectedTag { expected, found })
        } else {
            Err(DecodeError::UnknownTag(found))
        }
    }

    /// Fail if any input is left over.
    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}
