//! Wire tags for the pack109 value encoding.

pub const TRUE: u8 = 0xA0;
pub const FALSE: u8 = 0xA1;
pub const U8: u8 = 0xA2;
pub const U32: u8 = 0xA3;
pub const U64: u8 = 0xA4;
pub const I8: u8 = 0xA5;
pub const I32: u8 = 0xA6;
pub const I64: u8 = 0xA7;
pub const F32: u8 = 0xA8;
pub const F64: u8 = 0xA9;
pub const STRING: u8 = 0xAA;
/// Reserved for 16-bit strings, never emitted.
pub const RESERVED_STRING16: u8 = 0xAB;
pub const ARRAY: u8 = 0xAC;
/// Reserved for 16-bit arrays, never emitted.
pub const RESERVED_ARRAY16: u8 = 0xAD;
pub const MAP: u8 = 0xAE;

/// Largest length or count expressible in a one-byte prefix.
pub const MAX_LEN: usize = u8::MAX as usize;

/// Whether `tag` starts a value this codec can decode.
pub fn is_known(tag: u8) -> bool {
    matches!(
        tag,
        TRUE | FALSE | U8 | U32 | U64 | I8 | I32 | I64 | F32 | F64 | STRING | ARRAY | MAP
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_tags_are_unknown() {
        assert!(!is_known(RESERVED_STRING16));
        assert!(!is_known(RESERVED_ARRAY16));
        assert!(!is_known(0x00));
        assert!(!is_known(0xAF));
        for tag in TRUE..=F64 {
            assert!(is_known(tag));
        }
    }
}
