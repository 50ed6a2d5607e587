//! # Frame Codec
//!
//! Length-prefixed framing for [`tokio_util::codec::Framed`].
//!
//! A frame is a 4-byte big-endian length followed by exactly that many
//! payload bytes. The decoder buffers partial reads until a whole frame is
//! available and rejects a declared length above the configured maximum as
//! soon as the header arrives, before reserving space for the body.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::config::MAX_FRAME_SIZE;
use crate::error::ProtocolError;

/// Size of the frame length prefix.
pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&src[..HEADER_LEN]);
        let len = u32::from_be_bytes(header) as usize;

        if len > self.max_frame_len {
            warn!(len, max = self.max_frame_len, "Rejecting oversized frame");
            return Err(ProtocolError::OversizedFrame(len));
        }

        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        debug!(len, "Frame received");
        Ok(Some(src.split_to(len)))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = item.len();
        if len > self.max_frame_len {
            return Err(ProtocolError::OversizedFrame(len));
        }
        // max_frame_len is a usize; guard the wire width too.
        let wire_len = u32::try_from(len).map_err(|_| ProtocolError::OversizedFrame(len))?;

        dst.reserve(HEADER_LEN + len);
        dst.put_u32(wire_len);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn encode_frame(payload: &[u8]) -> BytesMut {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec
            .encode(Bytes::copy_from_slice(payload), &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_frame_roundtrip_boundary_lengths() {
        for len in [0usize, 1, 65_535] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut buf = encode_frame(&payload);
            assert_eq!(buf.len(), HEADER_LEN + len);
            assert_eq!(&buf[..4], &(len as u32).to_be_bytes());

            let frame = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
            assert_eq!(&frame[..], &payload[..]);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let full = encode_frame(b"hello");
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();

        for (i, byte) in full.iter().enumerate() {
            buf.put_u8(*byte);
            let decoded = codec.decode(&mut buf).unwrap();
            if i + 1 < full.len() {
                assert!(decoded.is_none(), "decoded early at byte {i}");
            } else {
                assert_eq!(&decoded.unwrap()[..], b"hello");
            }
        }
    }

    #[test]
    fn test_oversized_header_rejected_without_body() {
        let mut codec = FrameCodec::new(70_000);
        let mut buf = BytesMut::new();
        buf.put_u32(70_001);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::OversizedFrame(70_001))
        ));
    }

    #[test]
    fn test_max_length_accepted() {
        let mut codec = FrameCodec::new(16);
        assert_eq!(codec.max_frame_len(), 16);
        assert_eq!(FrameCodec::default().max_frame_len(), 70_000);
        let mut buf = BytesMut::new();
        codec.encode(Bytes::from(vec![7u8; 16]), &mut buf).unwrap();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 16);

        assert!(matches!(
            codec.encode(Bytes::from(vec![7u8; 17]), &mut buf),
            Err(ProtocolError::OversizedFrame(17))
        ));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut buf = encode_frame(b"one");
        buf.extend_from_slice(&encode_frame(b"two"));
        let mut codec = FrameCodec::default();
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"one");
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"two");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
