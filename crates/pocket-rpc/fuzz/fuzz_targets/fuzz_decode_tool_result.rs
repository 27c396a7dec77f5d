#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any JSON value is a possible tools/call result; decoding must never panic
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = pocket_rpc::decode_tool_result(value);
    }
});
