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

//! Connect to a local engine, run one query, print the table, disconnect.
//!
//! ```bash
//! cargo run --example hello_world
//! ```
//!
//! Requires an engine listening on `sc://localhost:50051` (override with
//! the `SQLGATE_ENDPOINT` environment variable). Exits non-zero on any
//! failure.

use sqlgate::Session;

fn main() -> sqlgate::Result<()> {
    sqlgate::logging::init();

    let endpoint =
        std::env::var("SQLGATE_ENDPOINT").unwrap_or_else(|_| "sc://localhost:50051".to_string());

    let session = Session::builder(endpoint).get_or_create()?;

    let table = session
        .execute("SELECT format_string('Hello World %d %s', 100, 'days') AS result")?
        .materialize()?;
    println!("{table}");

    session.close();
    Ok(())
}
