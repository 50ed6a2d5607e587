//! # Dynamic Values
//!
//! [`Value`] is a closed tagged union with one variant per codec type. Its
//! encoding is fully determined by the variant. Decoding is driven by a
//! [`Kind`]: every type except arrays is identified by its leading tag, but a
//! byte array and a generic array share the array tag, so the expected
//! element kind must be supplied. [`Kind::Any`] decodes whatever tag comes
//! next and reads arrays as tagged elements.
//!
//! ```rust
//! use pack109_protocol::core::value::{Kind, Value};
//!
//! let bytes = Value::from("test").encode().unwrap();
//! assert_eq!(bytes, [0xAA, 0x04, b't', b'e', b's', b't']);
//! assert_eq!(Value::decode(&bytes, &Kind::Any).unwrap(), Value::from("test"));
//! ```

use bytes::BufMut;
use std::collections::BTreeMap;

use crate::core::pack::{pack_str, put_len, unpack_string, Pack};
use crate::core::reader::Reader;
use crate::core::tag;
use crate::error::{DecodeError, Result};

/// Deepest nesting of arrays and maps accepted on decode.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U32(u32),
    U64(u64),
    I8(i8),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    /// Array of `u8`, encoded without element tags.
    Bytes(Vec<u8>),
    /// Array of tagged values.
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// Expected shape of an encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Any,
    Bool,
    U8,
    U32,
    U64,
    I8,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Array(Box<Kind>),
    Map(Box<Kind>),
}

impl Kind {
    /// The kind a leading tag selects when nothing more is known.
    pub fn of_tag(tag: u8) -> Option<Kind> {
        let kind = match tag {
            tag::TRUE | tag::FALSE => Kind::Bool,
            tag::U8 => Kind::U8,
            tag::U32 => Kind::U32,
            tag::U64 => Kind::U64,
            tag::I8 => Kind::I8,
            tag::I32 => Kind::I32,
            tag::I64 => Kind::I64,
            tag::F32 => Kind::F32,
            tag::F64 => Kind::F64,
            tag::STRING => Kind::String,
            tag::ARRAY => Kind::Array(Box::new(Kind::Any)),
            tag::MAP => Kind::Map(Box::new(Kind::Any)),
            _ => return None,
        };
        Some(kind)
    }
}

impl Value {
    /// Leading wire tag of this value.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Bool(true) => tag::TRUE,
            Value::Bool(false) => tag::FALSE,
            Value::U8(_) => tag::U8,
            Value::U32(_) => tag::U32,
            Value::U64(_) => tag::U64,
            Value::I8(_) => tag::I8,
            Value::I32(_) => tag::I32,
            Value::I64(_) => tag::I64,
            Value::F32(_) => tag::F32,
            Value::F64(_) => tag::F64,
            Value::String(_) => tag::STRING,
            Value::Bytes(_) | Value::Array(_) => tag::ARRAY,
            Value::Map(_) => tag::MAP,
        }
    }

    /// The kind that decodes this value's encoding back into an equal value.
    ///
    /// Arrays and maps whose elements disagree on kind report `Any` for the
    /// elements, which cannot recover nested byte arrays.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::U8(_) => Kind::U8,
            Value::U32(_) => Kind::U32,
            Value::U64(_) => Kind::U64,
            Value::I8(_) => Kind::I8,
            Value::I32(_) => Kind::I32,
            Value::I64(_) => Kind::I64,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
            Value::String(_) => Kind::String,
            Value::Bytes(_) => Kind::Bytes,
            Value::Array(items) => Kind::Array(Box::new(common_kind(items.iter()))),
            Value::Map(map) => Kind::Map(Box::new(common_kind(map.values()))),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Bool(v) => v.pack_into(out),
            Value::U8(v) => v.pack_into(out),
            Value::U32(v) => v.pack_into(out),
            Value::U64(v) => v.pack_into(out),
            Value::I8(v) => v.pack_into(out),
            Value::I32(v) => v.pack_into(out),
            Value::I64(v) => v.pack_into(out),
            Value::F32(v) => v.pack_into(out),
            Value::F64(v) => v.pack_into(out),
            Value::String(v) => pack_str(v, out),
            Value::Bytes(v) => v.pack_into(out),
            Value::Array(items) => {
                out.put_u8(tag::ARRAY);
                put_len(out, "array", items.len())?;
                items.iter().try_for_each(|item| item.encode_into(out))
            }
            Value::Map(map) => {
                out.put_u8(tag::MAP);
                put_len(out, "map", map.len())?;
                for (key, value) in map {
                    pack_str(key, out)?;
                    value.encode_into(out)?;
                }
                Ok(())
            }
        }
    }

    /// Decode a buffer holding exactly one value.
    pub fn decode(bytes: &[u8], kind: &Kind) -> Result<Value> {
        let mut reader = Reader::new(bytes);
        let value = Self::decode_from(&mut reader, kind)?;
        reader.finish()?;
        Ok(value)
    }

    pub fn decode_from(reader: &mut Reader<'_>, kind: &Kind) -> Result<Value> {
        Self::decode_nested(reader, kind, 0)
    }

    fn decode_nested(reader: &mut Reader<'_>, kind: &Kind, depth: usize) -> Result<Value> {
        let value = match kind {
            Kind::Any => {
                let found = reader.peek_u8()?;
                let kind = Kind::of_tag(found).ok_or(DecodeError::UnknownTag(found))?;
                return Self::decode_nested(reader, &kind, depth);
            }
            Kind::Bool => Value::Bool(bool::unpack_from(reader)?),
            Kind::U8 => Value::U8(u8::unpack_from(reader)?),
            Kind::U32 => Value::U32(u32::unpack_from(reader)?),
            Kind::U64 => Value::U64(u64::unpack_from(reader)?),
            Kind::I8 => Value::I8(i8::unpack_from(reader)?),
            Kind::I32 => Value::I32(i32::unpack_from(reader)?),
            Kind::I64 => Value::I64(i64::unpack_from(reader)?),
            Kind::F32 => Value::F32(f32::unpack_from(reader)?),
            Kind::F64 => Value::F64(f64::unpack_from(reader)?),
            Kind::String => Value::String(unpack_string(reader)?),
            Kind::Bytes => Value::Bytes(Vec::<u8>::unpack_from(reader)?),
            Kind::Array(element) => {
                check_depth(depth)?;
                reader.expect_tag(tag::ARRAY)?;
                let count = reader.read_u8()? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(Self::decode_nested(reader, element, depth + 1)?);
                }
                Value::Array(items)
            }
            Kind::Map(element) => {
                check_depth(depth)?;
                reader.expect_tag(tag::MAP)?;
                let count = reader.read_u8()? as usize;
                let mut map = BTreeMap::new();
                for _ in 0..count {
                    let key = unpack_string(reader)?;
                    map.insert(key, Self::decode_nested(reader, element, depth + 1)?);
                }
                Value::Map(map)
            }
        };
        Ok(value)
    }
}

fn common_kind<'a>(mut values: impl Iterator<Item = &'a Value>) -> Kind {
    let Some(first) = values.next().map(Value::kind) else {
        return Kind::Any;
    };
    if values.all(|v| v.kind() == first) {
        first
    } else {
        Kind::Any
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    u8 => U8,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    Vec<Value> => Array,
    BTreeMap<String, Value> => Map,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::NestingTooDeep(MAX_DEPTH).into());
    }
    Ok(())
}
