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

//! Endpoint address parsing.
//!
//! Endpoints are URIs of the form `scheme://host:port`. The engine's native
//! `sc` scheme maps to plain HTTP transport; `http` and `https` are accepted
//! directly.

use crate::error::{Error, Result};
use std::fmt;

/// A parsed remote query endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
}

/// Accepted endpoint schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// The engine's native scheme; carried over HTTP.
    Sc,
    Http,
    Https,
}

impl Scheme {
    fn as_str(&self) -> &'static str {
        match self {
            Scheme::Sc => "sc",
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Transport scheme used for actual HTTP requests.
    fn transport(&self) -> &'static str {
        match self {
            Scheme::Sc | Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl Endpoint {
    /// Parse an endpoint URI.
    ///
    /// Fails with [`Error::Connection`] on anything other than
    /// `scheme://host:port` with a known scheme and a valid port.
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri.split_once("://").ok_or_else(|| {
            Error::connection(format!("malformed endpoint '{}': missing scheme", uri))
        })?;

        let scheme = match scheme {
            "sc" => Scheme::Sc,
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(Error::connection(format!(
                    "malformed endpoint '{}': unsupported scheme '{}'",
                    uri, other
                )))
            }
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = rest.rsplit_once(':').ok_or_else(|| {
            Error::connection(format!("malformed endpoint '{}': missing port", uri))
        })?;

        if host.is_empty() {
            return Err(Error::connection(format!(
                "malformed endpoint '{}': empty host",
                uri
            )));
        }

        let port: u16 = port.parse().map_err(|_| {
            Error::connection(format!(
                "malformed endpoint '{}': invalid port '{}'",
                uri, port
            ))
        })?;

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }

    /// Returns the host component.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port component.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL for HTTP requests, e.g. `http://localhost:50051`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme.transport(), self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}
