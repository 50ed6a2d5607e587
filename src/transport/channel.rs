use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tracing::{debug, instrument};

use crate::config::TransportConfig;
use crate::core::codec::FrameCodec;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::Message;
use crate::utils::obfuscation::Obfuscator;

/// Framed, obfuscated message stream over any byte transport.
///
/// Outgoing messages are encoded, XORed with the key and framed. Incoming
/// frames go through the same steps in reverse.
pub struct Channel<S> {
    framed: Framed<S, FrameCodec>,
    obfuscator: Obfuscator,
}

impl<S> Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: &TransportConfig) -> Self {
        Self::with_codec(
            stream,
            FrameCodec::new(config.max_frame_size),
            Obfuscator::new(config.obfuscation_key),
        )
    }

    pub fn with_codec(stream: S, codec: FrameCodec, obfuscator: Obfuscator) -> Self {
        Self {
            framed: Framed::new(stream, codec),
            obfuscator,
        }
    }

    pub async fn send(&mut self, message: &Message) -> Result<()> {
        let payload = message.encode()?;
        self.send_payload(payload).await
    }

    /// Obfuscate and frame an already encoded payload.
    pub async fn send_payload(&mut self, mut payload: Vec<u8>) -> Result<()> {
        self.obfuscator.apply(&mut payload);
        debug!(len = payload.len(), "Sending frame");
        self.framed.send(Bytes::from(payload)).await
    }

    /// Next frame, de-obfuscated but not decoded.
    ///
    /// A peer that closes without sending anything yields
    /// [`ProtocolError::ConnectionClosed`]; one that stops mid-frame is an I/O
    /// error.
    pub async fn recv_payload(&mut self) -> Result<Vec<u8>> {
        let mut frame = match self.framed.next().await {
            Some(frame) => frame?,
            None => return Err(ProtocolError::ConnectionClosed),
        };
        self.obfuscator.apply(&mut frame);
        debug!(len = frame.len(), "Received frame");
        Ok(frame.to_vec())
    }

    pub async fn recv(&mut self) -> Result<Message> {
        let payload = self.recv_payload().await?;
        Message::decode(&payload)
    }
}

/// Open a TCP connection and wrap it in a [`Channel`].
#[instrument(skip(addr, config))]
pub async fn connect<A: ToSocketAddrs>(
    addr: A,
    config: &TransportConfig,
) -> Result<Channel<TcpStream>> {
    let stream = TcpStream::connect(addr).await?;
    if let Ok(peer) = stream.peer_addr() {
        debug!(%peer, "Connected");
    }
    Ok(Channel::new(stream, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{File, Request, Status};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_message_crosses_channel() {
        let config = TransportConfig::default();
        let (a, b) = duplex(1024);
        let mut left = Channel::new(a, &config);
        let mut right = Channel::new(b, &config);

        let sent = Message::from(Request::new("notes.txt"));
        left.send(&sent).await.unwrap();
        assert_eq!(right.recv().await.unwrap(), sent);

        let reply = Message::from(Status::new(200, "File received successfully"));
        right.send(&reply).await.unwrap();
        assert_eq!(left.recv().await.unwrap(), reply);
    }

    #[tokio::test]
    async fn test_wire_bytes_are_obfuscated() {
        let config = TransportConfig::default();
        let (a, mut raw) = duplex(1024);
        let mut channel = Channel::new(a, &config);
        channel.send(&Request::new("a").into()).await.unwrap();

        let mut wire = [0u8; 8];
        raw.read_exact(&mut wire).await.unwrap();
        assert_eq!(wire, [0, 0, 0, 4, 0x02 ^ 42, 0xAA ^ 42, 1 ^ 42, b'a' ^ 42]);
    }

    #[tokio::test]
    async fn test_closed_peer() {
        let config = TransportConfig::default();
        let (a, mut raw) = duplex(64);
        let mut channel = Channel::new(a, &config);
        raw.write_all(&[0, 0, 0, 10, 1, 2]).await.unwrap();
        drop(raw);
        assert!(channel.recv_payload().await.is_err());

        let (a, raw) = duplex(64);
        let mut channel = Channel::new(a, &config);
        drop(raw);
        assert!(matches!(
            channel.recv_payload().await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_large_file_frame() {
        let config = TransportConfig::default();
        let (a, b) = duplex(1 << 17);
        let mut left = Channel::new(a, &config);
        let mut right = Channel::new(b, &config);
        let file = Message::from(File::new("big.bin", vec![0x5A; 65_535]));
        let (sent, received) = tokio::join!(left.send(&file), right.recv());
        sent.unwrap();
        assert_eq!(received.unwrap(), file);
    }
}
