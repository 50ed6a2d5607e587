//! Message transport over TCP streams.

pub mod channel;

pub use channel::{connect, Channel};
