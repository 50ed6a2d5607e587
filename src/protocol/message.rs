//! # Message Envelopes
//!
//! The three message shapes exchanged by client and server, each serialized as
//! a one-byte discriminator followed by codec-encoded fields.
//!
//! ## Wire Format
//! ```text
//! File:    [0x01] [String filename] [Len(4, big-endian)] [Data(Len)]
//! Request: [0x02] [String filename]
//! Status:  [0x03] [I32 code] [String message]
//! ```
//!
//! File content can run to tens of kilobytes, past the one-byte count of a
//! codec array, so the data field carries its own 4-byte length and no tag.
//! Decoding consumes the whole buffer; leftover bytes are an error.

use bytes::BufMut;

use crate::config::MAX_FILENAME_LEN;
use crate::core::pack::{pack_str, unpack_string, Pack};
use crate::core::reader::Reader;
use crate::error::{DecodeError, ProtocolError, Result};

pub const FILE_MESSAGE: u8 = 0x01;
pub const REQUEST_MESSAGE: u8 = 0x02;
pub const STATUS_MESSAGE: u8 = 0x03;

/// Status codes carried by [`Status`].
pub mod status_code {
    pub const OK: i32 = 200;
    pub const FILE_CREATED: i32 = 201;
    pub const FILE_UPDATED: i32 = 202;
    pub const MALFORMED_MESSAGE: i32 = 400;
    pub const FILE_NOT_FOUND: i32 = 404;
    pub const ERROR: i32 = 500;
    pub const MEMORY_ERROR: i32 = 507;
}

/// A named file and its contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct File {
    pub filename: String,
    pub data: Vec<u8>,
}

/// A lookup of a stored file by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    pub filename: String,
}

/// Result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    File(File),
    Request(Request),
    Status(Status),
}

impl File {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        check_filename(&self.filename)?;
        let data_len = u32::try_from(self.data.len()).map_err(|_| ProtocolError::LengthExceeded {
            what: "file data",
            len: self.data.len(),
            max: u32::MAX as usize,
        })?;

        let mut out = Vec::with_capacity(1 + 2 + self.filename.len() + 4 + self.data.len());
        out.put_u8(FILE_MESSAGE);
        pack_str(&self.filename, &mut out)?;
        out.put_u32(data_len);
        out.put_slice(&self.data);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_exact(bytes, FILE_MESSAGE, Self::decode_fields)
    }

    fn decode_fields(reader: &mut Reader<'_>) -> Result<Self> {
        let filename = unpack_string(reader)?;
        let len = reader.read_u32_be()? as usize;
        let data = reader.take(len)?.to_vec();
        Ok(Self { filename, data })
    }
}

impl Request {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        check_filename(&self.filename)?;
        let mut out = Vec::with_capacity(1 + 2 + self.filename.len());
        out.put_u8(REQUEST_MESSAGE);
        pack_str(&self.filename, &mut out)?;
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_exact(bytes, REQUEST_MESSAGE, |reader| {
            Ok(Self {
                filename: unpack_string(reader)?,
            })
        })
    }
}

impl Status {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Build a status whose message is cut to fit the one-byte string prefix.
    pub fn truncated(code: i32, message: &str) -> Self {
        let mut end = message.len().min(crate::core::tag::MAX_LEN);
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        Self::new(code, &message[..end])
    }

    pub fn is_ok(&self) -> bool {
        self.code == status_code::OK
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(1 + 5 + 2 + self.message.len());
        out.put_u8(STATUS_MESSAGE);
        self.code.pack_into(&mut out)?;
        pack_str(&self.message, &mut out)?;
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_exact(bytes, STATUS_MESSAGE, |reader| {
            let code = i32::unpack_from(reader)?;
            let message = unpack_string(reader)?;
            Ok(Self { code, message })
        })
    }
}

impl Message {
    /// Leading discriminator byte.
    pub fn message_type(&self) -> u8 {
        match self {
            Message::File(_) => FILE_MESSAGE,
            Message::Request(_) => REQUEST_MESSAGE,
            Message::Status(_) => STATUS_MESSAGE,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Message::File(file) => file.encode(),
            Message::Request(request) => request.encode(),
            Message::Status(status) => status.encode(),
        }
    }

    /// Decode any message, dispatching on the leading discriminator.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let discriminator = Reader::new(bytes).peek_u8()?;
        match discriminator {
            FILE_MESSAGE => File::decode(bytes).map(Message::File),
            REQUEST_MESSAGE => Request::decode(bytes).map(Message::Request),
            STATUS_MESSAGE => Status::decode(bytes).map(Message::Status),
            other => Err(DecodeError::UnknownMessageType(other).into()),
        }
    }
}

impl From<File> for Message {
    fn from(file: File) -> Self {
        Message::File(file)
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Status> for Message {
    fn from(status: Status) -> Self {
        Message::Status(status)
    }
}

fn check_filename(filename: &str) -> Result<()> {
    if filename.len() > MAX_FILENAME_LEN {
        return Err(ProtocolError::LengthExceeded {
            what: "filename",
            len: filename.len(),
            max: MAX_FILENAME_LEN,
        });
    }
    Ok(())
}

fn decode_exact<T>(
    bytes: &[u8],
    expected: u8,
    fields: impl FnOnce(&mut Reader<'_>) -> Result<T>,
) -> Result<T> {
    let mut reader = Reader::new(bytes);
    let found = reader.read_u8()?;
    if found != expected {
        return Err(DecodeError::UnexpectedMessageType { expected, found }.into());
    }
    let value = fields(&mut reader)?;
    reader.finish()?;
    Ok(value)
}
