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

//! Error types for the session client.
//!
//! The taxonomy mirrors the three failure classes of the session contract:
//! connection failures, engine-reported query failures, and local resource
//! exhaustion during materialization. `Protocol` covers responses the engine
//! returned but this client could not decode.

use thiserror::Error as ThisError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the session client.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The endpoint is malformed or unreachable, or the session is gone.
    #[error("connection error: {0}")]
    Connection(String),

    /// The engine rejected or failed the statement (malformed SQL, unknown
    /// identifier, evaluation failure, canceled statement).
    #[error("query error: {message}")]
    Query {
        /// Engine-reported error code, when present.
        code: Option<String>,
        message: String,
    },

    /// Materialization exceeded the configured memory budget.
    #[error("resource error: {0}")]
    Resource(String),

    /// The engine returned a response this client could not decode.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub(crate) fn query(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Query {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn resource(message: impl Into<String>) -> Self {
        Self::Resource(message.into())
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns true for connection-class errors.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns true for engine-reported query failures.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

impl From<arrow_schema::ArrowError> for Error {
    fn from(e: arrow_schema::ArrowError) -> Self {
        Self::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_class() {
        let e = Error::connection("endpoint unreachable");
        assert_eq!(e.to_string(), "connection error: endpoint unreachable");

        let e = Error::query(Some("SYNTAX_ERROR".into()), "mismatched input");
        assert_eq!(e.to_string(), "query error: mismatched input");
    }

    #[test]
    fn test_predicates() {
        assert!(Error::connection("x").is_connection());
        assert!(!Error::connection("x").is_query());
        assert!(Error::query(None, "x").is_query());
        assert!(!Error::resource("x").is_query());
    }
}
