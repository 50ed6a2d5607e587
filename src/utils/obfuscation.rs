//! # Payload Obfuscation
//!
//! Single-byte XOR over a serialized payload. Applying it twice with the same
//! key restores the input.
//!
//! ## Security
//! This is **not** encryption. A one-byte key is recovered from a single
//! known plaintext byte, and every message type starts with a known
//! discriminator. It only keeps payloads from being readable at a glance.

/// XOR key applied to every payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obfuscator {
    key: u8,
}

impl Obfuscator {
    pub fn new(key: u8) -> Self {
        Self { key }
    }

    pub fn key(&self) -> u8 {
        self.key
    }

    /// Transform `data` in place. Obfuscation and its inverse are the same call.
    pub fn apply(&self, data: &mut [u8]) {
        obfuscate_in_place(data, self.key);
    }
}

pub fn obfuscate_in_place(data: &mut [u8], key: u8) {
    for byte in data.iter_mut() {
        *byte ^= key;
    }
}

/// Return an obfuscated copy of `data`.
pub fn obfuscate(data: &[u8], key: u8) -> Vec<u8> {
    data.iter().map(|byte| byte ^ key).collect()
}
