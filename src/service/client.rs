//! # File Client
//!
//! One request per connection: connect, send, wait for the single response,
//! close. There is no retry.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::config::{ClientConfig, TransportConfig, MAX_FILENAME_LEN};
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{File, Message, Request, Status};
use crate::transport::connect;

#[derive(Debug, Clone)]
pub struct Client {
    address: String,
    download_dir: PathBuf,
    transport: TransportConfig,
}

impl Client {
    pub fn new(config: &ClientConfig, transport: &TransportConfig) -> Self {
        Self {
            address: config.address.clone(),
            download_dir: config.download_dir.clone(),
            transport: transport.clone(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Send one message on a fresh connection and return the reply.
    #[instrument(skip(self, message), fields(address = %self.address))]
    pub async fn exchange(&self, message: &Message) -> Result<Message> {
        let mut channel = connect(self.address.as_str(), &self.transport).await?;
        channel.send(message).await?;
        let reply = channel.recv().await?;
        debug!(reply = reply.message_type(), "Received reply");
        Ok(reply)
    }

    /// Upload the file at `path` under its final path component.
    pub async fn send_file(&self, path: impl AsRef<Path>) -> Result<Status> {
        let path = path.as_ref();
        let filename = final_component(path)?;
        check_filename_len(&filename)?;

        let size = tokio::fs::metadata(path).await?.len();
        self.check_data_len(usize::try_from(size).unwrap_or(usize::MAX))?;
        let data = tokio::fs::read(path).await?;
        // The file may have grown since the metadata call.
        self.check_data_len(data.len())?;

        info!(filename = %filename, bytes = data.len(), "Sending file");
        match self.exchange(&File::new(filename, data).into()).await? {
            Message::Status(status) => Ok(status),
            other => Err(ProtocolError::UnexpectedMessage(other.message_type())),
        }
    }

    /// Ask for a stored file. The reply is either the file or a status.
    pub async fn request_file(&self, filename: &str) -> Result<Message> {
        check_filename_len(filename)?;
        info!(filename = %filename, "Requesting file");
        let request = Message::from(Request::new(filename));
        match self.exchange(&request).await? {
            reply @ (Message::File(_) | Message::Status(_)) => Ok(reply),
            other => Err(ProtocolError::UnexpectedMessage(other.message_type())),
        }
    }

    /// Write `file` into the download directory.
    pub async fn save_file(&self, file: &File) -> Result<PathBuf> {
        save_file(file, &self.download_dir).await
    }

    fn check_data_len(&self, len: usize) -> Result<()> {
        if len > self.transport.max_file_size {
            return Err(ProtocolError::LengthExceeded {
                what: "file data",
                len,
                max: self.transport.max_file_size,
            });
        }
        Ok(())
    }
}

fn check_filename_len(filename: &str) -> Result<()> {
    if filename.len() > MAX_FILENAME_LEN {
        return Err(ProtocolError::LengthExceeded {
            what: "filename",
            len: filename.len(),
            max: MAX_FILENAME_LEN,
        });
    }
    Ok(())
}

/// Write `file` into `dir` using only the final component of its name, so a
/// server cannot direct the write outside `dir`.
pub async fn save_file(file: &File, dir: &Path) -> Result<PathBuf> {
    let name = final_component(Path::new(&file.filename))?;
    let target = dir.join(name);
    tokio::fs::write(&target, &file.data).await?;
    info!(path = %target.display(), bytes = file.data.len(), "Saved file");
    Ok(target)
}

fn final_component(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            io::Error::new(
                ErrorKind::InvalidInput,
                format!("no usable file name in {}", path.display()),
            )
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_file_stays_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::new("../../etc/passwd", b"x".to_vec());
        let target = save_file(&file, dir.path()).await.unwrap();
        assert_eq!(target, dir.path().join("passwd"));
        assert_eq!(std::fs::read(&target).unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_save_file_rejects_unnamed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", "..", "/"] {
            let err = save_file(&File::new(name, Vec::new()), dir.path())
                .await
                .unwrap_err();
            assert!(matches!(err, ProtocolError::Io(_)), "{name:?}");
        }
    }

    #[tokio::test]
    async fn test_send_file_rejects_oversized_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![0u8; 65_536]).unwrap();

        // Nothing listens on this address; the size check must fire first.
        let config = ClientConfig {
            address: "127.0.0.1:1".to_string(),
            ..ClientConfig::default()
        };
        let client = Client::new(&config, &TransportConfig::default());
        assert!(matches!(
            client.send_file(&path).await,
            Err(ProtocolError::LengthExceeded { what: "file data", .. })
        ));
    }

    #[tokio::test]
    async fn test_request_file_rejects_long_name_before_connecting() {
        let config = ClientConfig {
            address: "127.0.0.1:1".to_string(),
            ..ClientConfig::default()
        };
        let client = Client::new(&config, &TransportConfig::default());
        assert!(matches!(
            client.request_file(&"n".repeat(256)).await,
            Err(ProtocolError::LengthExceeded { what: "filename", len: 256, .. })
        ));
    }

    #[tokio::test]
    async fn test_save_file_uses_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            download_dir: dir.path().to_path_buf(),
            ..ClientConfig::default()
        };
        let client = Client::new(&config, &TransportConfig::default());
        assert_eq!(client.download_dir(), dir.path());

        let target = client
            .save_file(&File::new("fetched.txt", b"data".to_vec()))
            .await
            .unwrap();
        assert_eq!(target, client.download_dir().join("fetched.txt"));
    }
}
