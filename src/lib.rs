//! # pack109-protocol
//!
//! A small file transfer service built on the pack109 tagged binary codec.
//!
//! A client uploads a named file or asks for one back. Every message is a
//! one-byte discriminator followed by codec-encoded fields, XORed with a
//! single-byte key, and sent as a frame carrying a 4-byte big-endian length.
//! The server keeps files in a hash table and can persist them to a snapshot
//! file that survives restarts.
//!
//! ## Layout
//! - [`crate::core`]: value codec and frame codec
//! - [`protocol`]: message envelopes and request dispatch
//! - [`store`]: in-memory file store with snapshot persistence
//! - [`transport`]: framed, obfuscated channels over TCP
//! - [`service`]: server accept loop and client operations
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging
//!
//! ## Quick Start
//! ```no_run
//! use pack109_protocol::config::NetworkConfig;
//! use pack109_protocol::service::{Client, Server};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> pack109_protocol::error::Result<()> {
//! let config = NetworkConfig::default();
//! let server = Server::bind(&config.server, &config.transport).await?;
//! let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
//! tokio::spawn(server.run(shutdown_rx));
//!
//! let client = Client::new(&config.client, &config.transport);
//! let status = client.send_file("notes.txt").await?;
//! assert!(status.is_ok());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod store;
pub mod transport;
pub mod utils;

pub use crate::core::pack::{pack, unpack, Pack};
pub use crate::core::value::{Kind, Value};
pub use crate::error::{DecodeError, ProtocolError, Result};
pub use crate::protocol::message::{File, Message, Request, Status};
