//! Fuzz target for ServerEvent::decode
//!
//! This fuzzer tests inbound envelope decoding with arbitrary text frames:
//! - Malformed or truncated JSON
//! - Unknown or missing type tags
//! - Type confusion (wrong field types for a known tag)
//! - Deeply nested or oversized structures
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use driftroom_proto::ServerEvent;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The transport only forwards text frames, so non-UTF-8 input never
    // reaches the decoder
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = ServerEvent::decode(raw);
    }
});
