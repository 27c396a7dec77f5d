//! Test module for pocket-rpc
//!
//! These tests run the client against in-process mock servers:
//! - HTTP dispatch, retries, error classification and health polling
//! - WebSocket correlation, poisoning and reconnection
//! - Argument validation before any network activity
//! - Capability wrapper payloads

// Payload assertions compare exact floats
#![allow(clippy::float_cmp)]

mod fixtures;
