//! # Typed Encoding
//!
//! [`Pack`] maps Rust types onto the pack109 wire encoding.
//!
//! Arrays are the one place where the element type changes the layout:
//! `Vec<u8>` is written as a count followed by raw bytes, while every other
//! `Vec<T>` writes each element with its own tag. The choice is made through
//! [`Pack::pack_slice`] and [`Pack::unpack_elements`], which `u8` overrides.
//!
//! ```rust
//! use pack109_protocol::core::pack::{pack, unpack};
//!
//! let bytes = pack(&vec![1u8, 2, 3]).unwrap();
//! assert_eq!(bytes, [0xAC, 0x03, 0x01, 0x02, 0x03]);
//! assert_eq!(unpack::<Vec<u8>>(&bytes).unwrap(), vec![1, 2, 3]);
//! ```

use bytes::BufMut;
use std::collections::BTreeMap;

use crate::core::reader::Reader;
use crate::core::tag;
use crate::error::{DecodeError, ProtocolError, Result};

/// A type with a pack109 encoding.
pub trait Pack: Sized {
    /// Append the tagged encoding of `self` to `out`.
    fn pack_into(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Decode one tagged value, advancing `reader` past it.
    fn unpack_from(reader: &mut Reader<'_>) -> Result<Self>;

    /// Append `count` and the elements of an array body.
    fn pack_slice(items: &[Self], out: &mut Vec<u8>) -> Result<()> {
        put_len(out, "array", items.len())?;
        for item in items {
            item.pack_into(out)?;
        }
        Ok(())
    }

    /// Decode `count` array elements.
    fn unpack_elements(reader: &mut Reader<'_>, count: usize) -> Result<Vec<Self>> {
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(Self::unpack_from(reader)?);
        }
        Ok(items)
    }
}

/// Encode a value into a fresh buffer.
pub fn pack<T: Pack>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    value.pack_into(&mut out)?;
    Ok(out)
}

/// Decode a buffer holding exactly one value of type `T`.
pub fn unpack<T: Pack>(bytes: &[u8]) -> Result<T> {
    let mut reader = Reader::new(bytes);
    let value = T::unpack_from(&mut reader)?;
    reader.finish()?;
    Ok(value)
}

pub(crate) fn put_len(out: &mut Vec<u8>, what: &'static str, len: usize) -> Result<()> {
    let len = u8::try_from(len).map_err(|_| ProtocolError::LengthExceeded {
        what,
        len,
        max: tag::MAX_LEN,
    })?;
    out.put_u8(len);
    Ok(())
}

/// Encode a string slice without requiring an owned `String`.
pub fn pack_str(value: &str, out: &mut Vec<u8>) -> Result<()> {
    out.put_u8(tag::STRING);
    put_len(out, "string", value.len())?;
    out.put_slice(value.as_bytes());
    Ok(())
}

pub fn unpack_string(reader: &mut Reader<'_>) -> Result<String> {
    reader.expect_tag(tag::STRING)?;
    let len = reader.read_u8()? as usize;
    let bytes = reader.take(len)?;
    let value = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    Ok(value.to_owned())
}

impl Pack for bool {
    fn pack_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.put_u8(if *self { tag::TRUE } else { tag::FALSE });
        Ok(())
    }

    fn unpack_from(reader: &mut Reader<'_>) -> Result<Self> {
        let found = reader.peek_u8()?;
        let value = match found {
            tag::TRUE => true,
            tag::FALSE => false,
            _ if tag::is_known(found) => {
                return Err(DecodeError::UnexpectedTag {
                    expected: tag::TRUE,
                    found,
                }
                .into())
            }
            _ => return Err(DecodeError::UnknownTag(found).into()),
        };
        reader.read_u8()?;
        Ok(value)
    }
}

impl Pack for u8 {
    fn pack_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.put_u8(tag::U8);
        out.put_u8(*self);
        Ok(())
    }

    fn unpack_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.expect_tag(tag::U8)?;
        Ok(reader.read_u8()?)
    }

    // Byte arrays carry no per-element tag.
    fn pack_slice(items: &[Self], out: &mut Vec<u8>) -> Result<()> {
        put_len(out, "byte array", items.len())?;
        out.put_slice(items);
        Ok(())
    }

    fn unpack_elements(reader: &mut Reader<'_>, count: usize) -> Result<Vec<Self>> {
        Ok(reader.take(count)?.to_vec())
    }
}

macro_rules! impl_pack_number {
    ($($ty:ty => $tag:path),* $(,)?) => {
        $(
            impl Pack for $ty {
                fn pack_into(&self, out: &mut Vec<u8>) -> Result<()> {
                    out.put_u8($tag);
                    out.put_slice(&self.to_be_bytes());
                    Ok(())
                }

                fn unpack_from(reader: &mut Reader<'_>) -> Result<Self> {
                    reader.expect_tag($tag)?;
                    Ok(<$ty>::from_be_bytes(reader.read_array()?))
                }
            }
        )*
    };
}

impl_pack_number! {
    u32 => tag::U32,
    u64 => tag::U64,
    i8 => tag::I8,
    i32 => tag::I32,
    i64 => tag::I64,
    f32 => tag::F32,
    f64 => tag::F64,
}

impl Pack for String {
    fn pack_into(&self, out: &mut Vec<u8>) -> Result<()> {
        pack_str(self, out)
    }

    fn unpack_from(reader: &mut Reader<'_>) -> Result<Self> {
        unpack_string(reader)
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.put_u8(tag::ARRAY);
        T::pack_slice(self, out)
    }

    fn unpack_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.expect_tag(tag::ARRAY)?;
        let count = reader.read_u8()? as usize;
        T::unpack_elements(reader, count)
    }
}

impl<T: Pack> Pack for BTreeMap<String, T> {
    fn pack_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.put_u8(tag::MAP);
        put_len(out, "map", self.len())?;
        for (key, value) in self {
            pack_str(key, out)?;
            value.pack_into(out)?;
        }
        Ok(())
    }

    fn unpack_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.expect_tag(tag::MAP)?;
        let count = reader.read_u8()? as usize;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = unpack_string(reader)?;
            let value = T::unpack_from(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}
