//! Shared helpers for integration tests driving the clients against a
//! wiremock stub server.

// Each integration test binary compiles this module independently and uses
// only one family's helper.
#![allow(dead_code)]

use falcon_client::{ClientBuilder, HostClient, IntelClient};
use wiremock::MockServer;

pub const TEST_ID: &str = "id";
pub const TEST_KEY: &str = "key";

/// Creates an Intelligence client pointed at the mock server.
pub fn intel_client(server: &MockServer) -> IntelClient {
    ClientBuilder::new()
        .credentials(TEST_ID, TEST_KEY)
        .base_url(&server.uri())
        .build_intel()
        .expect("client should build")
}

/// Creates a Host client pointed at the mock server.
pub fn host_client(server: &MockServer) -> HostClient {
    ClientBuilder::new()
        .credentials(TEST_ID, TEST_KEY)
        .base_url(&server.uri())
        .build_host()
        .expect("client should build")
}
