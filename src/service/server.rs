//! # File Server
//!
//! Accepts TCP connections one at a time. Each connection carries exactly one
//! request frame and one response frame and is served to completion before the
//! next accept, so the [`Store`] needs no locking.
//!
//! Shutdown arrives on an `mpsc` channel. A pending accept is abandoned, a
//! connection already being served finishes, and the store is saved one last
//! time.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{NetworkConfig, ServerConfig, TransportConfig};
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::dispatch;
use crate::protocol::message::{status_code, Message, Status};
use crate::store::Store;
use crate::transport::Channel;

pub struct Server {
    listener: TcpListener,
    store: Store,
    transport: TransportConfig,
}

impl Server {
    /// Load the store and bind the listener. A snapshot that cannot be read
    /// is fatal.
    pub async fn bind(config: &ServerConfig, transport: &TransportConfig) -> Result<Self> {
        let store = match &config.persist_path {
            Some(path) => Store::open(path)?,
            None => Store::in_memory(),
        };
        Self::with_store(config, transport, store).await
    }

    pub async fn with_store(
        config: &ServerConfig,
        transport: &TransportConfig,
        store: Store,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.address).await?;
        info!(address = %listener.local_addr()?, files = store.len(), "Listening");
        Ok(Self {
            listener,
            store,
            transport: transport.clone(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Serve until a message arrives on `shutdown_rx` or every sender is
    /// dropped. Returns the store after the final save.
    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<Store> {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server");
                    break;
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            handle_connection(stream, peer, &mut self.store, &self.transport).await;
                        }
                        Err(e) => {
                            error!(error = %e, "Error accepting connection");
                        }
                    }
                }
            }
        }

        drop(self.listener);
        self.store.save()?;
        info!(files = self.store.len(), "Server stopped");
        Ok(self.store)
    }
}

#[instrument(skip_all, fields(peer = %peer))]
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    store: &mut Store,
    transport: &TransportConfig,
) {
    debug!("Accepted connection");
    let mut channel = Channel::new(stream, transport);

    let payload = match channel.recv_payload().await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Dropping connection before a request arrived");
            return;
        }
    };

    let outcome = dispatch(store, &payload);
    if outcome.mutated {
        if let Err(e) = store.save() {
            warn!(error = %e, "Failed to save store");
        }
    }

    let framed = frame_response(&outcome.response, transport.max_frame_size).or_else(|e| {
        warn!(error = %e, "Response does not fit a frame, replying with an error status");
        Status::truncated(status_code::ERROR, &e.to_string()).encode()
    });
    let payload = match framed {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Failed to encode response");
            return;
        }
    };

    if let Err(e) = channel.send_payload(payload).await {
        warn!(error = %e, "Failed to send response");
        return;
    }
    debug!("Connection served");
}

/// Encode `response` and check that it fits in one frame.
fn frame_response(response: &Message, max_frame_size: usize) -> Result<Vec<u8>> {
    let payload = response.encode()?;
    if payload.len() > max_frame_size {
        return Err(ProtocolError::OversizedFrame(payload.len()));
    }
    Ok(payload)
}

/// Bind from `config`, run until Ctrl-C, and return the saved store.
#[instrument(skip(config), fields(address = %config.server.address))]
pub async fn start_server(config: &NetworkConfig) -> Result<Store> {
    let server = Server::bind(&config.server, &config.transport).await?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
            Err(e) => {
                // Dropping the sender would stop the server.
                error!(error = %e, "Unable to listen for CTRL+C");
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    server.run(shutdown_rx).await
}
