#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Malformed and hostile input against a live server.

use std::net::SocketAddr;
use std::time::Duration;

use pack109_protocol::config::{ServerConfig, TransportConfig};
use pack109_protocol::error::{DecodeError, ProtocolError};
use pack109_protocol::protocol::message::{status_code, File, Message, Request, Status};
use pack109_protocol::service::Server;
use pack109_protocol::store::Store;
use pack109_protocol::transport::{connect, Channel};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

async fn spawn_server() -> (SocketAddr, mpsc::Sender<()>) {
    let config = ServerConfig {
        address: "127.0.0.1:0".to_string(),
        persist_path: None,
    };
    let server = pack109_protocol::service::Server::bind(&config, &TransportConfig::default())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(server.run(rx));
    (addr, tx)
}

async fn raw_exchange(addr: SocketAddr, payload: &[u8]) -> Status {
    let mut channel = connect(addr, &TransportConfig::default()).await.unwrap();
    channel.send_payload(payload.to_vec()).await.unwrap();
    match channel.recv().await.unwrap() {
        Message::Status(status) => status,
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_discriminator_gets_error_status() {
    let (addr, _shutdown) = spawn_server().await;
    let status = raw_exchange(addr, &[0x09, 0xAA, 0x00]).await;
    assert_eq!(status.code, status_code::ERROR);
    assert!(status.message.contains("0x09"), "{}", status.message);
}

#[tokio::test]
async fn test_truncated_message_gets_error_status() {
    let (addr, _shutdown) = spawn_server().await;
    for payload in [&[][..], &[0x01], &[0x01, 0xAA, 5, b'a'], &[0x02, 0xA3]] {
        let status = raw_exchange(addr, payload).await;
        assert_eq!(status.code, status_code::ERROR);
    }
}

#[tokio::test]
async fn test_wrong_field_tag_gets_error_status() {
    let (addr, _shutdown) = spawn_server().await;
    let status = raw_exchange(addr, &[0x02, 0xA2, 0x05]).await;
    assert_eq!(status.code, status_code::ERROR);
    assert!(!status.message.is_empty());
}

#[tokio::test]
async fn test_oversized_frame_drops_connection_only() {
    let (addr, _shutdown) = spawn_server().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&100_000u32.to_be_bytes()).await.unwrap();
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("server should close the connection");
    assert!(matches!(read, Ok(0) | Err(_)));

    // The next client is still served.
    let mut channel = connect(addr, &TransportConfig::default()).await.unwrap();
    channel.send(&Request::new("missing.txt").into()).await.unwrap();
    match channel.recv().await.unwrap() {
        Message::Status(status) => assert_eq!(status.code, status_code::FILE_NOT_FOUND),
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn test_client_hanging_up_does_not_stop_server() {
    let (addr, _shutdown) = spawn_server().await;
    drop(TcpStream::connect(addr).await.unwrap());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&[0, 0, 0, 9]).await.unwrap();
    drop(stream);

    let status = raw_exchange(addr, &Request::new("x").encode().unwrap()).await;
    assert_eq!(status.code, status_code::FILE_NOT_FOUND);
}

#[tokio::test]
async fn test_mismatched_key_is_rejected_as_malformed() {
    let (addr, _shutdown) = spawn_server().await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let wrong_key = TransportConfig {
        obfuscation_key: 7,
        ..TransportConfig::default()
    };
    let mut channel = Channel::new(stream, &wrong_key);
    channel.send(&Request::new("a").into()).await.unwrap();

    // The reply is obfuscated with the server's key, so this side cannot
    // decode it either.
    match channel.recv().await {
        Err(ProtocolError::Decode(DecodeError::UnknownMessageType(_))) => {}
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn test_unsendable_stored_file_gets_error_status() {
    let mut store = Store::in_memory();
    store.insert("long-name", File::new("x".repeat(300), b"data".to_vec()));
    store.insert("huge", File::new("huge", vec![0u8; 70_000]));
    store.insert("small", File::new("small", b"ok".to_vec()));

    let config = ServerConfig {
        address: "127.0.0.1:0".to_string(),
        persist_path: None,
    };
    let server = Server::with_store(&config, &TransportConfig::default(), store)
        .await
        .unwrap();
    assert!(server.store().contains("huge"));
    assert!(server.store().path().is_none());
    let addr = server.local_addr().unwrap();
    let (_shutdown, rx) = mpsc::channel::<()>(1);
    tokio::spawn(server.run(rx));

    let status = raw_exchange(addr, &Request::new("long-name").encode().unwrap()).await;
    assert_eq!(status.code, status_code::ERROR);
    assert!(status.message.contains("filename"), "{}", status.message);

    let status = raw_exchange(addr, &Request::new("huge").encode().unwrap()).await;
    assert_eq!(status.code, status_code::ERROR);
    assert!(status.message.contains("70"), "{}", status.message);

    // The server keeps serving afterwards.
    let mut channel = connect(addr, &TransportConfig::default()).await.unwrap();
    channel.send(&Request::new("small").into()).await.unwrap();
    match channel.recv().await.unwrap() {
        Message::File(file) => assert_eq!(file.data, b"ok"),
        other => panic!("unexpected reply {other:?}"),
    }
}
