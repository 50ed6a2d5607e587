//! Flat snapshot file for the store.
//!
//! ```text
//! [Count(4)] then per entry: [NameLen(4)] [Name] [DataLen(4)] [Data]
//! ```
//!
//! All lengths are big-endian. There is no checksum or version field.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bytes::BufMut;
use tracing::debug;

use crate::core::reader::Reader;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::File;

/// Serialize entries into snapshot bytes.
pub fn encode<'a>(entries: impl ExactSizeIterator<Item = &'a File>) -> io::Result<Vec<u8>> {
    let count = to_u32(entries.len())?;
    let mut out = Vec::new();
    out.put_u32(count);
    for file in entries {
        out.put_u32(to_u32(file.filename.len())?);
        out.put_slice(file.filename.as_bytes());
        out.put_u32(to_u32(file.data.len())?);
        out.put_slice(&file.data);
    }
    Ok(out)
}

/// Parse snapshot bytes. Truncation or a non-UTF-8 name is `InvalidData`.
pub fn decode(bytes: &[u8]) -> io::Result<Vec<File>> {
    let mut reader = Reader::new(bytes);
    let count = reader.read_u32_be().map_err(invalid)?;

    let mut files = Vec::new();
    for _ in 0..count {
        let name_len = reader.read_u32_be().map_err(invalid)? as usize;
        let name = reader.take(name_len).map_err(invalid)?;
        let filename = std::str::from_utf8(name)
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "snapshot filename is not UTF-8"))?
            .to_string();
        let data_len = reader.read_u32_be().map_err(invalid)? as usize;
        let data = reader.take(data_len).map_err(invalid)?.to_vec();
        files.push(File { filename, data });
    }
    reader.finish().map_err(invalid)?;
    Ok(files)
}

/// Read a snapshot from disk. A missing file yields `None`.
pub fn load(path: &Path) -> Result<Option<Vec<File>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ProtocolError::store_io(path, e)),
    };
    let files = decode(&bytes).map_err(|e| ProtocolError::store_io(path, e))?;
    debug!(path = %path.display(), entries = files.len(), "Loaded snapshot");
    Ok(Some(files))
}

/// Write a snapshot next to `path`, then rename it into place.
pub fn save<'a>(path: &Path, entries: impl ExactSizeIterator<Item = &'a File>) -> Result<()> {
    let bytes = encode(entries).map_err(|e| ProtocolError::store_io(path, e))?;
    let tmp = temp_path(path);

    let written = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(ProtocolError::store_io(path, e));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "Saved snapshot");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn to_u32(len: usize) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| io::Error::new(ErrorKind::InvalidInput, "snapshot field too large"))
}

fn invalid(e: crate::error::DecodeError) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, format!("corrupt snapshot: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let files = [File::new("a", b"xy".to_vec())];
        let bytes = encode(files.iter()).unwrap();
        assert_eq!(
            bytes,
            [0, 0, 0, 1, 0, 0, 0, 1, b'a', 0, 0, 0, 2, b'x', b'y']
        );
        assert_eq!(decode(&bytes).unwrap(), files);
    }

    #[test]
    fn test_empty_snapshot() {
        let bytes = encode([].iter()).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0]);
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_snapshot_is_invalid_data() {
        let files = [File::new("notes.txt", b"abc".to_vec())];
        let bytes = encode(files.iter()).unwrap();
        for cut in 0..bytes.len() {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData, "cut at {cut}");
        }
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.bin")).unwrap().is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let files = [File::new("b", vec![0u8; 16])];
        save(&path, files.iter()).unwrap();
        assert!(path.exists());
        assert!(!temp_path(&path).exists());
        assert_eq!(load(&path).unwrap().unwrap(), files);
    }
}
