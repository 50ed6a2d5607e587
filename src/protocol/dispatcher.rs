use tracing::{debug, warn};

use crate::error::constants::{MSG_FILE_NOT_FOUND, MSG_FILE_RECEIVED, MSG_UNEXPECTED_MESSAGE};
use crate::error::ProtocolError;
use crate::protocol::message::{status_code, Message, Status};
use crate::store::Store;

/// Outcome of handling one request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub response: Message,
    /// Whether the store changed and needs saving.
    pub mutated: bool,
}

impl Dispatch {
    fn reply(response: impl Into<Message>) -> Self {
        Self {
            response: response.into(),
            mutated: false,
        }
    }
}

/// Decode a de-obfuscated request payload and apply it to `store`.
///
/// Never fails: malformed input becomes an error status for the peer.
pub fn dispatch(store: &mut Store, payload: &[u8]) -> Dispatch {
    let message = match Message::decode(payload) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, len = payload.len(), "Rejecting malformed request");
            return Dispatch::reply(Status::truncated(status_code::ERROR, &e.to_string()));
        }
    };

    match message {
        Message::File(file) => {
            let replaced = store.insert(file.filename.clone(), file);
            debug!(replaced, files = store.len(), "Stored file");
            Dispatch {
                response: Status::new(status_code::OK, MSG_FILE_RECEIVED).into(),
                mutated: true,
            }
        }
        Message::Request(request) => match store.lookup(&request.filename) {
            Ok(file) => Dispatch::reply(file.clone()),
            Err(ProtocolError::NotFound(name)) => {
                debug!(filename = %name, "Requested file missing");
                Dispatch::reply(Status::new(status_code::FILE_NOT_FOUND, MSG_FILE_NOT_FOUND))
            }
            Err(e) => Dispatch::reply(Status::truncated(status_code::ERROR, &e.to_string())),
        },
        Message::Status(status) => {
            warn!(code = status.code, "Client sent a status message");
            Dispatch::reply(Status::new(status_code::ERROR, MSG_UNEXPECTED_MESSAGE))
        }
    }
}
