#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(serde_json::Value::Object(envelope)) = serde_json::from_slice(data) {
        let _ = pocket_rpc::protocol::envelope_id(&envelope);
        let _ = pocket_rpc::protocol::into_result(envelope);
    }
});
