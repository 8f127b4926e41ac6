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

//! Logging initialization.
//!
//! Initializes a `tracing-subscriber` writing to stderr. The filter comes
//! from the `RUST_LOG` environment variable, defaulting to `sqlgate=warn`.
//!
//! ```bash
//! RUST_LOG=sqlgate=debug ./my_app
//! ```

use std::sync::OnceLock;
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the tracing subscriber with the `RUST_LOG`-derived filter.
///
/// Uses `OnceLock` to ensure this runs at most once per process; later
/// calls are no-ops.
pub fn init() {
    init_with(None);
}

/// Initialize with explicit filter directives, e.g. `"sqlgate=debug"`.
pub fn init_with(directives: Option<&str>) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let filter = match directives {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sqlgate=warn")),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_timer(SystemTime),
            )
            .try_init()
            .ok();
    });
}
