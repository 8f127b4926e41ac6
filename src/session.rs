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

//! Session lifecycle: connect-or-reuse, blocking execute, idempotent close.
//!
//! A [`Session`] is an explicit handle to an active logical connection:
//! callers hold and pass their own value rather than relying on ambient
//! global state. A process-wide registry backs the get-or-create contract:
//! connecting twice with the same endpoint and options returns a handle to
//! the same underlying connection instead of opening a duplicate.

use crate::client::{EngineClient, HttpClient, HttpClientConfig, RestClient, RestClientConfig};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::result::QueryResult;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

/// Options fixed at connect time.
///
/// Options participate in session identity: two connects agree on a session
/// only if endpoint and options both match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SessionOptions {
    /// HTTP transport configuration.
    pub http: HttpClientConfig,
    /// Statement completion polling configuration.
    pub rest: RestClientConfig,
    /// Memory budget for materialization; oversized results fail with
    /// `Error::Resource`. Unlimited when unset.
    pub max_result_bytes: Option<usize>,
    /// Engine-side session configuration, sent at session creation.
    pub session_config: BTreeMap<String, String>,
}

/// Registry key: endpoint plus the full option set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    endpoint: Endpoint,
    options: SessionOptions,
}

/// Process-wide registry of live sessions, keyed by endpoint + options.
fn registry() -> &'static Mutex<HashMap<SessionKey, Session>> {
    static REGISTRY: OnceLock<Mutex<HashMap<SessionKey, Session>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock_registry() -> std::sync::MutexGuard<'static, HashMap<SessionKey, Session>> {
    registry().lock().unwrap_or_else(|e| e.into_inner())
}

/// Builder for connecting a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    endpoint: String,
    options: SessionOptions,
}

impl SessionBuilder {
    /// Set the connection timeout for the HTTP transport.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.http.connect_timeout = timeout;
        self
    }

    /// Set the read timeout for the HTTP transport.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.options.http.read_timeout = timeout;
        self
    }

    /// Set the maximum number of transport-level retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.options.http.max_retries = retries;
        self
    }

    /// Set the statement status poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.rest.poll_interval = interval;
        self
    }

    /// Set the maximum time to wait for statement completion.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.options.rest.poll_timeout = timeout;
        self
    }

    /// Set the memory budget for result materialization.
    pub fn max_result_bytes(mut self, bytes: usize) -> Self {
        self.options.max_result_bytes = Some(bytes);
        self
    }

    /// Add an engine-side session configuration entry.
    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .session_config
            .insert(key.into(), value.into());
        self
    }

    /// Replace the full option set.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Connect, or reuse an existing live session with the same endpoint
    /// and options.
    ///
    /// Fails with [`Error::Connection`] if the endpoint is malformed or
    /// unreachable.
    pub fn get_or_create(self) -> Result<Session> {
        let endpoint = Endpoint::parse(&self.endpoint)?;
        Session::get_or_create_with(endpoint, self.options, |endpoint, options| {
            let http_client = Arc::new(HttpClient::new(options.http.clone())?);
            Ok(Arc::new(RestClient::new(
                http_client,
                endpoint.clone(),
                options.rest.clone(),
            )) as Arc<dyn EngineClient>)
        })
    }
}

#[derive(Debug)]
struct SessionInner {
    key: SessionKey,
    client: Arc<dyn EngineClient>,
    /// Runtime owned by the session; the blocking API seams `block_on` it.
    runtime: Runtime,
    session_id: String,
    closed: AtomicBool,
}

/// An active logical connection to a remote query endpoint.
///
/// Cheap to clone; clones share the underlying connection and liveness
/// flag. Lifecycle is create → use → close, with no reuse after close.
/// There is no automatic teardown: a session persists until explicitly
/// closed or the process exits.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Start building a session for the given `scheme://host:port` endpoint.
    pub fn builder(endpoint: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            endpoint: endpoint.into(),
            options: SessionOptions::default(),
        }
    }

    /// Get-or-create with an injectable client factory (the production path
    /// passes a `RestClient` factory; tests pass mocks).
    fn get_or_create_with(
        endpoint: Endpoint,
        options: SessionOptions,
        make_client: impl FnOnce(&Endpoint, &SessionOptions) -> Result<Arc<dyn EngineClient>>,
    ) -> Result<Session> {
        let key = SessionKey { endpoint, options };

        let mut sessions = lock_registry();
        if let Some(existing) = sessions.get(&key) {
            if existing.is_open() {
                debug!("Reusing existing session {} for {}", existing.session_id(), key.endpoint);
                return Ok(existing.clone());
            }
        }

        let client = make_client(&key.endpoint, &key.options)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::connection(format!("failed to start runtime: {}", e)))?;

        let info = runtime.block_on(client.create_session(key.options.session_config.clone()))?;
        debug!("Created session {} at {}", info.session_id, key.endpoint);

        let session = Session {
            inner: Arc::new(SessionInner {
                key: key.clone(),
                client,
                runtime,
                session_id: info.session_id,
                closed: AtomicBool::new(false),
            }),
        };
        sessions.insert(key, session.clone());
        Ok(session)
    }

    /// The endpoint this session is bound to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.key.endpoint
    }

    /// Engine-assigned session identifier.
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// Liveness flag: false once the session has been closed.
    pub fn is_open(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst)
    }

    /// Send a query and block until the engine returns a complete result
    /// set or an error.
    ///
    /// All-or-nothing: no partial results. Fails with [`Error::Query`] for
    /// engine-reported statement failures and [`Error::Connection`] if the
    /// session is closed or the transport drops.
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        if !self.is_open() {
            return Err(Error::connection("session is closed"));
        }

        debug!("Executing query: {}", sql);
        let outcome = self
            .inner
            .runtime
            .block_on(self.inner.client.execute(&self.inner.session_id, sql))?;

        QueryResult::new(outcome, self.inner.key.options.max_result_bytes)
    }

    /// Release the session and the underlying connection.
    ///
    /// Idempotent: closing an already-closed session is a no-op. The remote
    /// delete is best-effort. After close, any further `execute` on this
    /// session (or any clone of it) fails with [`Error::Connection`].
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        debug!("Closing session {}", self.inner.session_id);
        let _ = self
            .inner
            .runtime
            .block_on(self.inner.client.delete_session(&self.inner.session_id));

        // Drop the registry entry so a later connect opens a fresh session.
        let mut sessions = lock_registry();
        if let Some(existing) = sessions.get(&self.inner.key) {
            if Arc::ptr_eq(&existing.inner, &self.inner) {
                sessions.remove(&self.inner.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{SessionInfo, StatementOutcome};
    use crate::types::{
        ColumnInfo, ResultManifest, ResultSchema, StatementState, StatementStatus,
    };
    use arrow_array::{Array, StringArray};
    use arrow_ipc::writer::StreamWriter;
    use arrow_schema::{DataType, Field, Schema};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    fn hello_world_ipc() -> Vec<u8> {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "result",
            DataType::Utf8,
            true,
        )]));
        let batch = arrow_array::RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["Hello World 100 days"]))],
        )
        .unwrap();

        let mut buffer = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut buffer, &schema).unwrap();
            writer.write(&batch).unwrap();
            writer.finish().unwrap();
        }
        buffer
    }

    fn empty_manifest() -> ResultManifest {
        ResultManifest {
            format: "ARROW_STREAM".to_string(),
            schema: ResultSchema {
                column_count: 2,
                columns: vec![
                    ColumnInfo {
                        name: "id".to_string(),
                        type_name: "BIGINT".to_string(),
                        position: 0,
                    },
                    ColumnInfo {
                        name: "name".to_string(),
                        type_name: "STRING".to_string(),
                        position: 1,
                    },
                ],
            },
            total_row_count: Some(0),
            total_byte_count: Some(0),
            truncated: false,
            result_compression: None,
        }
    }

    #[derive(Debug, Default)]
    struct MockClient {
        create_calls: AtomicUsize,
        delete_calls: AtomicUsize,
    }

    #[async_trait]
    impl EngineClient for MockClient {
        async fn create_session(
            &self,
            _config: BTreeMap<String, String>,
        ) -> Result<SessionInfo> {
            let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SessionInfo {
                session_id: format!("mock-session-{}", n),
            })
        }

        async fn delete_session(&self, _session_id: &str) -> Result<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn execute(&self, _session_id: &str, sql: &str) -> Result<StatementOutcome> {
            if sql.contains("format_string") {
                return Ok(StatementOutcome {
                    statement_id: "stmt-hello".to_string(),
                    status: StatementStatus {
                        state: StatementState::Succeeded,
                        error: None,
                    },
                    manifest: None,
                    attachment: Some(hello_world_ipc()),
                });
            }
            if sql.contains("WHERE 1 = 0") {
                return Ok(StatementOutcome {
                    statement_id: "stmt-empty".to_string(),
                    status: StatementStatus {
                        state: StatementState::Succeeded,
                        error: None,
                    },
                    manifest: Some(empty_manifest()),
                    attachment: None,
                });
            }
            Err(Error::query(
                Some("SYNTAX_ERROR".to_string()),
                format!("mismatched input '{}'", sql),
            ))
        }
    }

    fn connect_mock(endpoint: &str, client: Arc<MockClient>) -> Session {
        Session::get_or_create_with(
            Endpoint::parse(endpoint).unwrap(),
            SessionOptions::default(),
            move |_, _| Ok(client as Arc<dyn EngineClient>),
        )
        .unwrap()
    }

    #[test]
    fn test_get_or_create_reuses_live_session() {
        let client = Arc::new(MockClient::default());

        let first = connect_mock("sc://reuse-test:50051", client.clone());
        let second = connect_mock("sc://reuse-test:50051", client.clone());

        assert!(Arc::ptr_eq(&first.inner, &second.inner));
        assert_eq!(first.session_id(), second.session_id());
        assert_eq!(client.create_calls.load(Ordering::SeqCst), 1);

        first.close();
    }

    #[test]
    fn test_connect_after_close_creates_new_session() {
        let client = Arc::new(MockClient::default());

        let first = connect_mock("sc://reconnect-test:50051", client.clone());
        first.close();

        let second = connect_mock("sc://reconnect-test:50051", client.clone());
        assert!(!Arc::ptr_eq(&first.inner, &second.inner));
        assert_eq!(client.create_calls.load(Ordering::SeqCst), 2);

        second.close();
    }

    #[test]
    fn test_execute_after_close_fails_with_connection_error() {
        let client = Arc::new(MockClient::default());
        let session = connect_mock("sc://closed-test:50051", client);

        session.close();
        assert!(!session.is_open());

        let err = session.execute("SELECT 1").unwrap_err();
        assert!(err.is_connection());
    }

    #[test]
    fn test_close_is_idempotent() {
        let client = Arc::new(MockClient::default());
        let session = connect_mock("sc://idempotent-test:50051", client.clone());

        session.close();
        session.close();

        assert_eq!(client.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_liveness() {
        let client = Arc::new(MockClient::default());
        let session = connect_mock("sc://clone-test:50051", client);
        let clone = session.clone();

        session.close();
        assert!(!clone.is_open());
        assert!(clone.execute("SELECT 1").unwrap_err().is_connection());
    }

    #[test]
    fn test_execute_hello_world() {
        let client = Arc::new(MockClient::default());
        let session = connect_mock("sc://hello-test:50051", client);

        let table = session
            .execute("SELECT format_string('Hello World %d %s', 100, 'days') AS result")
            .unwrap()
            .materialize()
            .unwrap();

        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.num_columns(), 1);
        assert_eq!(table.column_names(), vec!["result"]);

        let column = table.batches()[0]
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(column.value(0), "Hello World 100 days");

        session.close();
    }

    #[test]
    fn test_execute_empty_result_preserves_schema() {
        let client = Arc::new(MockClient::default());
        let session = connect_mock("sc://empty-test:50051", client);

        let table = session
            .execute("SELECT id, name FROM t WHERE 1 = 0")
            .unwrap()
            .materialize()
            .unwrap();

        assert_eq!(table.num_rows(), 0);
        assert!(table.is_empty());
        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert_eq!(table.schema().field(0).data_type(), &DataType::Int64);

        session.close();
    }

    #[test]
    fn test_malformed_query_fails_with_query_error() {
        let client = Arc::new(MockClient::default());
        let session = connect_mock("sc://syntax-test:50051", client);

        let err = session.execute("SELEC 1").unwrap_err();
        assert!(err.is_query(), "expected Query error, got {:?}", err);

        session.close();
    }
}
