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

//! Result readers for consuming statement outcomes.
//!
//! This module selects and builds the appropriate reader for a terminal
//! statement outcome:
//! - `InlineReader`: batches parsed upfront from the inline Arrow attachment
//! - `EmptyReader`: zero-row results, schema preserved from the manifest

pub mod ipc;

use crate::client::StatementOutcome;
use crate::error::{Error, Result};
use crate::types::{CompressionCodec, ResultManifest, StatementState};
use arrow_array::RecordBatch;
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::collections::VecDeque;
use std::sync::Arc;

/// Trait for result readers.
pub trait ResultReader: Send {
    /// Get the schema of the result.
    fn schema(&self) -> SchemaRef;

    /// Get the next record batch, or None if end of results.
    fn next_batch(&mut self) -> Result<Option<RecordBatch>>;
}

impl std::fmt::Debug for dyn ResultReader + Send {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultReader").finish_non_exhaustive()
    }
}

/// Build a reader for a terminal statement outcome.
///
/// Selects inline or empty reader based on the outcome's contents.
pub(crate) fn build_reader(outcome: &StatementOutcome) -> Result<Box<dyn ResultReader + Send>> {
    if let Some(ref manifest) = outcome.manifest {
        tracing::debug!(
            "Result manifest: total_rows={:?}, total_bytes={:?}, truncated={}",
            manifest.total_row_count,
            manifest.total_byte_count,
            manifest.truncated
        );
    }

    let compression = CompressionCodec::from_manifest(
        outcome
            .manifest
            .as_ref()
            .and_then(|m| m.result_compression.as_deref()),
    );

    match outcome.status.state {
        StatementState::Succeeded | StatementState::Closed => {}
        StatementState::Pending | StatementState::Running => {
            return Err(Error::connection(
                "statement is still executing; outcome is not terminal",
            ));
        }
        StatementState::Failed => {
            let message = outcome
                .status
                .error
                .as_ref()
                .and_then(|e| e.message.as_deref())
                .unwrap_or("unknown error");
            return Err(Error::query(
                outcome.status.error.as_ref().and_then(|e| e.error_code.clone()),
                format!("statement failed: {}", message),
            ));
        }
        StatementState::Canceled => {
            return Err(Error::query(None, "statement was canceled"));
        }
    }

    let manifest_schema = schema_from_manifest(outcome.manifest.as_ref());

    match outcome.attachment {
        Some(ref attachment) if !attachment.is_empty() => {
            tracing::debug!(
                "Using inline reader: {} bytes, compression={:?}",
                attachment.len(),
                compression
            );
            let batches = ipc::parse_ipc_stream(attachment, compression)?;
            Ok(Box::new(InlineReader::new(batches, manifest_schema)))
        }
        _ => {
            tracing::debug!("Using empty reader: no result data present");
            Ok(Box::new(EmptyReader::new(manifest_schema)))
        }
    }
}

/// Build an Arrow schema from the result manifest.
///
/// Falls back to an empty schema if no manifest is available.
fn schema_from_manifest(manifest: Option<&ResultManifest>) -> SchemaRef {
    let Some(manifest) = manifest else {
        tracing::warn!("No manifest available, using empty schema");
        return Arc::new(Schema::empty());
    };

    let fields: Vec<Field> = manifest
        .schema
        .columns
        .iter()
        .map(|col| Field::new(&col.name, map_engine_type(&col.type_name), true))
        .collect();

    Arc::new(Schema::new(fields))
}

/// Map engine SQL type names to Arrow DataTypes.
fn map_engine_type(type_name: &str) -> DataType {
    match type_name.to_uppercase().as_str() {
        "BOOLEAN" => DataType::Boolean,
        "BYTE" | "TINYINT" => DataType::Int8,
        "SHORT" | "SMALLINT" => DataType::Int16,
        "INT" | "INTEGER" => DataType::Int32,
        "LONG" | "BIGINT" => DataType::Int64,
        "FLOAT" | "REAL" => DataType::Float32,
        "DOUBLE" => DataType::Float64,
        "STRING" => DataType::Utf8,
        "BINARY" => DataType::Binary,
        "DATE" => DataType::Date32,
        "TIMESTAMP" | "TIMESTAMP_NTZ" => DataType::Timestamp(TimeUnit::Microsecond, None),
        // Complex and unknown types fall back to string; the actual Arrow
        // IPC data carries the correct type when rows are present.
        _ => {
            tracing::debug!("Unknown engine type '{}', mapping to Utf8", type_name);
            DataType::Utf8
        }
    }
}

/// Reader over batches parsed upfront from an inline Arrow attachment.
///
/// Inline results are always a single attachment already present in the
/// response, so all batches are held in memory for iteration.
#[derive(Debug)]
pub struct InlineReader {
    batches: VecDeque<RecordBatch>,
    schema: SchemaRef,
}

impl InlineReader {
    /// Schema comes from the first batch when present, otherwise from the
    /// manifest-derived fallback.
    fn new(batches: Vec<RecordBatch>, fallback_schema: SchemaRef) -> Self {
        let schema = batches
            .first()
            .map(|b| b.schema())
            .unwrap_or(fallback_schema);
        Self {
            batches: VecDeque::from(batches),
            schema,
        }
    }
}

impl ResultReader for InlineReader {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        Ok(self.batches.pop_front())
    }
}

/// Reader for queries with no result rows.
///
/// Used for valid queries that return zero rows (e.g. `SELECT * WHERE 1=0`).
/// The schema is preserved from the query's manifest.
#[derive(Debug)]
pub struct EmptyReader {
    schema: SchemaRef,
}

impl EmptyReader {
    fn new(schema: SchemaRef) -> Self {
        Self { schema }
    }
}

impl ResultReader for EmptyReader {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        Ok(None)
    }
}
