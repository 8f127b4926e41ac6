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

//! Client implementations for communicating with remote query engines.
//!
//! This module provides:
//! - `EngineClient` trait: abstract interface the session layer talks to
//! - `HttpClient`: low-level HTTP client with retry logic
//! - `RestClient`: implementation over the statement-execution REST API

pub mod http;
pub mod rest;

use crate::error::Result;
use crate::types::{ResultManifest, StatementStatus};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub use http::{HttpClient, HttpClientConfig};
pub use rest::{RestClient, RestClientConfig};

/// Session information returned from session creation.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
}

/// Terminal outcome of a statement execution.
#[derive(Debug, Clone)]
pub struct StatementOutcome {
    pub statement_id: String,
    pub status: StatementStatus,
    pub manifest: Option<ResultManifest>,
    /// Inline Arrow IPC result bytes, when the statement produced rows.
    pub attachment: Option<Vec<u8>>,
}

/// Abstract interface for remote query engine backends.
///
/// This is the seam the session layer depends on. Implementations own all
/// protocol-specific details, including completion polling: `execute` only
/// returns once the statement has reached a terminal state.
#[async_trait]
pub trait EngineClient: Send + Sync + std::fmt::Debug {
    /// Create a new session with the given configuration.
    async fn create_session(&self, config: BTreeMap<String, String>) -> Result<SessionInfo>;

    /// Delete/close a session (best-effort cleanup).
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Execute a SQL statement within a session, blocking until the engine
    /// reports a terminal state. All-or-nothing: no partial results.
    async fn execute(&self, session_id: &str, sql: &str) -> Result<StatementOutcome>;
}
