//! # Core Protocol Components
//!
//! The pack109 tagged binary codec and the length-prefixed frame codec.
//!
//! This module provides the foundation for the protocol: encoding and decoding
//! of tagged values, and framing of payloads over a byte stream.
//!
//! ## Components
//! - **Tag**: one-byte wire tags for every value type
//! - **Reader**: bounds-checked cursor shared by every decoder
//! - **Pack**: statically typed encode/decode for Rust values
//! - **Value**: dynamic tagged union with a [`value::Kind`] descriptor
//! - **Codec**: Tokio codec for framing over byte streams
//!
//! ## Value Wire Format
//! ```text
//! [Tag(1)] [Payload(N)]          numerics: big-endian at natural width
//! [0xAA] [Len(1)] [Bytes(Len)]   string
//! [0xAC] [Count(1)] [Elems...]   array (u8 elements untagged, others tagged)
//! [0xAE] [Count(1)] [Pairs...]   map (string key + tagged value)
//! ```
//!
//! ## Frame Wire Format
//! ```text
//! [Length(4, big-endian)] [Payload(Length)]
//! ```
//!
//! ## Security
//! - Decoders never read past the end of their input
//! - Frame length validated before any body allocation

pub mod codec;
pub mod pack;
pub mod reader;
pub mod tag;
pub mod value;
