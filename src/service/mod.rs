//! # Service Layer
//!
//! Server and client orchestration. Each connection carries a single
//! request and its response.

pub mod client;
pub mod server;

pub use client::Client;
pub use server::{start_server, Server};
