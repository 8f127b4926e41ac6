// Copyright (c) 2025 sqlgate Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Offline integration tests for the public session client surface.

use sqlgate::{Endpoint, Session};
use std::time::Duration;

#[test]
fn test_connect_malformed_endpoint_fails_fast() {
    let err = Session::builder("not-an-endpoint").get_or_create().unwrap_err();
    assert!(err.is_connection());

    let err = Session::builder("ftp://localhost:50051")
        .get_or_create()
        .unwrap_err();
    assert!(err.is_connection());
}

#[test]
fn test_connect_unreachable_endpoint_fails_with_connection_error() {
    // Loopback discard port; connect attempts are refused quickly with
    // retries disabled and a short timeout.
    let err = Session::builder("sc://127.0.0.1:9")
        .connect_timeout(Duration::from_millis(200))
        .read_timeout(Duration::from_millis(500))
        .max_retries(0)
        .get_or_create()
        .unwrap_err();

    assert!(err.is_connection(), "expected Connection error, got {:?}", err);
}

#[test]
fn test_endpoint_parse_round_trip() {
    let ep = Endpoint::parse("sc://localhost:50051").unwrap();
    assert_eq!(ep.to_string(), "sc://localhost:50051");
    assert_eq!(ep.host(), "localhost");
    assert_eq!(ep.port(), 50051);
    assert_eq!(ep.base_url(), "http://localhost:50051");
}

#[test]
fn test_session_options_defaults() {
    use sqlgate::SessionOptions;

    let options = SessionOptions::default();
    assert_eq!(options.http.connect_timeout, Duration::from_secs(30));
    assert_eq!(options.rest.poll_interval, Duration::from_millis(500));
    assert_eq!(options.max_result_bytes, None);
    assert!(options.session_config.is_empty());
}
