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

//! Blocking session client for remote analytics SQL engines.
//!
//! `sqlgate` implements the minimal remote query session pattern: connect
//! to an endpoint, run a query, materialize the result into a local Arrow
//! table, disconnect.
//!
//! ## Overview
//!
//! - [`Session`] - Active logical connection; connect with
//!   [`Session::builder`], which reuses an existing live session for the
//!   same endpoint and options.
//! - [`QueryResult`] - Row-oriented output of a statement, prior to local
//!   materialization.
//! - [`Table`] - Fully realized, read-only tabular value with a fixed
//!   schema; prints as a human-readable grid.
//!
//! ## Example
//!
//! ```ignore
//! use sqlgate::Session;
//!
//! let session = Session::builder("sc://localhost:50051").get_or_create()?;
//! let table = session
//!     .execute("SELECT format_string('Hello World %d %s', 100, 'days') AS result")?
//!     .materialize()?;
//! println!("{table}");
//! session.close();
//! ```
//!
//! ## Errors
//!
//! All operations return [`Result`]. [`Error::Connection`] covers malformed
//! or unreachable endpoints and closed sessions; [`Error::Query`] covers
//! engine-reported statement failures; [`Error::Resource`] covers
//! materialization beyond the configured memory budget.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod reader;
pub mod result;
pub mod session;
pub mod types;

// Re-export main types
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use result::{QueryResult, Table};
pub use session::{Session, SessionBuilder, SessionOptions};

// Re-export client types for custom transports
pub use client::{EngineClient, HttpClient, HttpClientConfig, RestClient, RestClientConfig};
