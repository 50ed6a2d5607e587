//! # Utility Modules
//!
//! Supporting utilities shared by the server and client.
//!
//! ## Components
//! - **Logging**: Structured logging configuration
//! - **Obfuscation**: Single-byte XOR applied to every frame payload
//!
//! ## Security
//! The obfuscator hides nothing from an attacker. Deployments that need
//! confidentiality should run over an encrypted tunnel.

pub mod logging;
pub mod obfuscation;

pub use obfuscation::Obfuscator;
