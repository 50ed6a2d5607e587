#![no_main]

use libfuzzer_sys::fuzz_target;
use pack109_protocol::core::value::{Kind, Value};

fuzz_target!(|data: &[u8]| {
    for kind in [Kind::Any, Kind::Bytes, Kind::Map(Box::new(Kind::Any))] {
        let _ = Value::decode(data, &kind);
    }
});
