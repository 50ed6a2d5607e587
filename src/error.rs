//! # Error Types
//!
//! Error handling for the codec, the transfer protocol and the file store.
//!
//! ## Error Categories
//! - **Decode errors**: truncated input, unknown tags, bad UTF-8, wrong message type
//! - **Transport errors**: socket I/O failures, oversized frames, peers hanging up
//! - **Store errors**: snapshot read/write failures
//! - **Not found**: a lookup miss, reported as a normal outcome by the server
//!
//! The server converts a [`DecodeError`] on an incoming request into an error
//! status response. Transport errors abort the exchange they occurred in.
//!
//! ## Example Usage
//! ```rust
//! use pack109_protocol::core::pack::unpack;
//! use pack109_protocol::error::{DecodeError, ProtocolError};
//!
//! match unpack::<u32>(&[0xA3, 0xDE, 0xAD]) {
//!     Err(ProtocolError::Decode(DecodeError::UnexpectedEof { needed, remaining })) => {
//!         assert_eq!((needed, remaining), (4, 2));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error message constants for responses the server sends back.
pub mod constants {
    pub const MSG_FILE_RECEIVED: &str = "File received successfully";
    pub const MSG_FILE_NOT_FOUND: &str = "File not found";
    pub const MSG_UNEXPECTED_MESSAGE: &str = "Unexpected message type";
}

/// Reasons a byte buffer could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Unknown tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("Expected tag 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag { expected: u8, found: u8 },

    #[error("String is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unknown message type 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("Expected message type 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedMessageType { expected: u8, found: u8 },

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    #[error("Arrays and maps nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

// ProtocolError is the primary error type for all crate operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("{what} length {len} exceeds maximum of {max}")]
    LengthExceeded {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Store I/O error on {}: {source}", path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unexpected message type 0x{0:02x}")]
    UnexpectedMessage(u8),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// True for errors raised while moving frames over a stream.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(_) | ProtocolError::OversizedFrame(_) | ProtocolError::ConnectionClosed
        )
    }

    /// True for malformed or truncated input.
    pub fn is_decode(&self) -> bool {
        matches!(self, ProtocolError::Decode(_))
    }

    pub(crate) fn store_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProtocolError::StoreIo {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
