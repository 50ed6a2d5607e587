//! Property-based tests using proptest
//!
//! These tests check codec and protocol invariants over randomly generated
//! inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::{Bytes, BytesMut};
use pack109_protocol::core::codec::FrameCodec;
use pack109_protocol::core::pack::{pack, unpack};
use pack109_protocol::core::value::{Kind, Value};
use pack109_protocol::protocol::dispatcher::dispatch;
use pack109_protocol::protocol::message::{File, Message, Request, Status};
use pack109_protocol::store::Store;
use pack109_protocol::utils::obfuscation::obfuscate;
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

fn filename() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._-]{0,64}"
}

// Property: any message decodes back to itself
proptest! {
    #[test]
    fn prop_message_roundtrip(
        name in filename(),
        data in prop::collection::vec(any::<u8>(), 0..4096),
        code in any::<i32>(),
    ) {
        let messages = [
            Message::from(File::new(name.clone(), data)),
            Message::from(Request::new(name.clone())),
            Message::from(Status::new(code, name)),
        ];
        for message in messages {
            let bytes = message.encode().unwrap();
            prop_assert_eq!(Message::decode(&bytes).unwrap(), message);
        }
    }
}

// Property: decoding never panics on arbitrary input
proptest! {
    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = Message::decode(&bytes);
        let _ = unpack::<String>(&bytes);
        let _ = unpack::<Vec<u64>>(&bytes);
        let _ = Value::decode(&bytes, &Kind::Any);
    }
}

// Property: every proper prefix of an encoding is rejected
proptest! {
    #[test]
    fn prop_prefixes_rejected(values in prop::collection::vec(any::<i64>(), 0..32)) {
        let bytes = pack(&values).unwrap();
        for cut in 0..bytes.len() {
            prop_assert!(unpack::<Vec<i64>>(&bytes[..cut]).is_err());
        }
        prop_assert_eq!(unpack::<Vec<i64>>(&bytes).unwrap(), values);
    }
}

// Property: obfuscation is an involution for every key
proptest! {
    #[test]
    fn prop_obfuscation_involution(
        data in prop::collection::vec(any::<u8>(), 0..2048),
        key in any::<u8>(),
    ) {
        prop_assert_eq!(obfuscate(&obfuscate(&data, key), key), data);
    }
}

// Property: frames reassemble regardless of how the stream is split
proptest! {
    #[test]
    fn prop_frames_reassemble(
        payload in prop::collection::vec(any::<u8>(), 0..8192),
        chunk in 1usize..512,
    ) {
        let mut codec = FrameCodec::default();
        let mut wire = BytesMut::new();
        codec.encode(Bytes::from(payload.clone()), &mut wire).unwrap();

        let mut buf = BytesMut::new();
        let mut decoded = None;
        for piece in wire.chunks(chunk) {
            buf.extend_from_slice(piece);
            if let Some(frame) = codec.decode(&mut buf).unwrap() {
                decoded = Some(frame);
            }
        }
        prop_assert_eq!(decoded.unwrap().to_vec(), payload);
        prop_assert!(buf.is_empty());
    }
}

// Property: the dispatcher answers every payload without panicking
proptest! {
    #[test]
    fn prop_dispatch_total(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut store = Store::in_memory();
        let outcome = dispatch(&mut store, &bytes);
        prop_assert!(outcome.response.encode().is_ok());
        prop_assert_eq!(outcome.mutated, !store.is_empty());
    }
}
