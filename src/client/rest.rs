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

//! `EngineClient` implementation over the statement-execution REST API.
//!
//! Endpoints live under `{base}/api/1.0`:
//! - `POST /sessions`, `DELETE /sessions/{id}`
//! - `POST /statements`, `GET /statements/{id}`, `DELETE /statements/{id}`
//!
//! Statement submission may return a pending/running state; this client
//! polls until a terminal state is reached and maps engine-reported
//! failures to [`Error::Query`].

use crate::client::{EngineClient, HttpClient, SessionInfo, StatementOutcome};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::types::{
    CreateSessionRequest, CreateSessionResponse, ExecuteStatementRequest, StatementResponse,
    StatementState,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Polling configuration for statement completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestClientConfig {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Maximum time to wait for statement completion.
    pub poll_timeout: Duration,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            poll_timeout: Duration::from_secs(600),
        }
    }
}

/// REST client for a remote query engine endpoint.
#[derive(Debug)]
pub struct RestClient {
    http_client: Arc<HttpClient>,
    endpoint: Endpoint,
    config: RestClientConfig,
}

impl RestClient {
    /// Create a new REST client for the given endpoint.
    pub fn new(http_client: Arc<HttpClient>, endpoint: Endpoint, config: RestClientConfig) -> Self {
        Self {
            http_client,
            endpoint,
            config,
        }
    }

    /// Build the base URL for API requests.
    fn base_url(&self) -> String {
        format!("{}/api/1.0", self.endpoint.base_url())
    }

    /// Issue a request and decode the JSON response body.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let mut builder = self.http_client.inner().request(method, url);
        if let Some(body) = body {
            builder = builder.header("Content-Type", "application/json").json(&body);
        }
        let request = builder
            .build()
            .map_err(|e| Error::connection(format!("failed to build request: {}", e)))?;

        let response = self.http_client.execute(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::connection(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            Error::protocol(format!("failed to parse response: {} - body: {}", e, body))
        })
    }

    /// Poll for statement status.
    async fn get_statement_status(&self, statement_id: &str) -> Result<StatementResponse> {
        let url = format!("{}/statements/{}", self.base_url(), statement_id);
        debug!("Getting statement status at {}", url);
        self.request_json(Method::GET, &url, None).await
    }

    /// Close/cleanup a statement (release server resources, best-effort).
    async fn close_statement(&self, statement_id: &str) {
        let url = format!("{}/statements/{}", self.base_url(), statement_id);
        debug!("Closing statement at {}", url);

        let request = self.http_client.inner().request(Method::DELETE, &url).build();
        if let Ok(request) = request {
            let _ = self.http_client.execute(request).await;
        }
    }

    /// Wait for the statement to reach a terminal state, polling status.
    async fn wait_for_completion(
        &self,
        response: StatementResponse,
    ) -> Result<StatementResponse> {
        let start = std::time::Instant::now();
        let mut current = response;

        loop {
            match current.status.state {
                StatementState::Succeeded => return Ok(current),
                StatementState::Failed => {
                    let (code, message) = match current.status.error {
                        Some(e) => (
                            e.error_code,
                            e.message.unwrap_or_else(|| "unknown error".to_string()),
                        ),
                        None => (None, "unknown error".to_string()),
                    };
                    return Err(Error::query(code, message));
                }
                StatementState::Canceled => {
                    return Err(Error::query(None, "statement was canceled"));
                }
                StatementState::Closed => {
                    // Closed with result data is valid for inline results: the
                    // engine delivers the data and immediately closes the
                    // statement since no further fetching is needed.
                    if current.result.is_some() {
                        debug!("Statement closed with inline result data, treating as success");
                        return Ok(current);
                    }
                    return Err(Error::query(None, "statement was closed by the engine"));
                }
                StatementState::Pending | StatementState::Running => {
                    if start.elapsed() > self.config.poll_timeout {
                        return Err(Error::connection("statement execution timed out"));
                    }

                    tokio::time::sleep(self.config.poll_interval).await;

                    debug!("Polling statement status: {}", current.statement_id);
                    current = self.get_statement_status(&current.statement_id).await?;
                }
            }
        }
    }

    /// Convert a terminal statement response into an outcome.
    fn convert_response(response: StatementResponse) -> StatementOutcome {
        StatementOutcome {
            statement_id: response.statement_id,
            status: response.status,
            manifest: response.manifest,
            attachment: response.result.and_then(|r| r.attachment),
        }
    }
}

#[async_trait]
impl EngineClient for RestClient {
    async fn create_session(&self, config: BTreeMap<String, String>) -> Result<SessionInfo> {
        let url = format!("{}/sessions", self.base_url());
        debug!("Creating session at {}", url);

        let body = serde_json::to_value(CreateSessionRequest {
            session_config: config,
        })
        .map_err(|e| Error::protocol(format!("failed to encode session request: {}", e)))?;

        let response: CreateSessionResponse =
            self.request_json(Method::POST, &url, Some(body)).await?;

        debug!("Created session: {}", response.session_id);

        Ok(SessionInfo {
            session_id: response.session_id,
        })
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = format!("{}/sessions/{}", self.base_url(), session_id);
        debug!("Deleting session at {}", url);

        // Best-effort cleanup: ignore errors on session deletion.
        let request = self.http_client.inner().request(Method::DELETE, &url).build();
        if let Ok(request) = request {
            let _ = self.http_client.execute(request).await;
        }

        debug!("Deleted session: {}", session_id);
        Ok(())
    }

    async fn execute(&self, session_id: &str, sql: &str) -> Result<StatementOutcome> {
        let url = format!("{}/statements", self.base_url());

        let body = serde_json::to_value(ExecuteStatementRequest {
            session_id: session_id.to_string(),
            statement: sql.to_string(),
            format: "ARROW_STREAM".to_string(),
        })
        .map_err(|e| Error::protocol(format!("failed to encode statement request: {}", e)))?;

        debug!("Executing statement at {}: {}", url, sql);

        let response: StatementResponse =
            self.request_json(Method::POST, &url, Some(body)).await?;

        debug!(
            "Execute response: statement_id={}, state={:?}",
            response.statement_id, response.status.state
        );

        let response = self.wait_for_completion(response).await?;

        // All result data arrives inline with the terminal response, so the
        // engine-side statement can be released immediately.
        self.close_statement(&response.statement_id).await;

        Ok(Self::convert_response(response))
    }
}
