#![no_main]

use libfuzzer_sys::fuzz_target;
use pack109_protocol::protocol::dispatcher::dispatch;
use pack109_protocol::protocol::message::Message;
use pack109_protocol::store::Store;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must re-encode to the same bytes.
    if let Ok(message) = Message::decode(data) {
        if let Ok(bytes) = message.encode() {
            assert_eq!(bytes, data);
        }
    }

    let mut store = Store::in_memory();
    let _ = dispatch(&mut store, data);
});
