//! Message envelopes and server-side request handling.

pub mod dispatcher;
pub mod message;
