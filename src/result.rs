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

//! Query results and materialized tables.
//!
//! `QueryResult` is the row-oriented output of a statement before local
//! materialization; `materialize` drains it eagerly into a read-only
//! `Table` that the caller exclusively owns.

use crate::client::StatementOutcome;
use crate::error::{Error, Result};
use crate::reader::{build_reader, ResultReader};
use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use std::fmt;

/// The result of a statement execution, prior to materialization.
///
/// Column names and types are fixed at production time.
pub struct QueryResult {
    statement_id: String,
    schema: SchemaRef,
    reader: Box<dyn ResultReader + Send>,
    max_bytes: Option<usize>,
}

impl QueryResult {
    pub(crate) fn new(outcome: StatementOutcome, max_bytes: Option<usize>) -> Result<Self> {
        let reader = build_reader(&outcome)?;
        let schema = reader.schema();
        Ok(Self {
            statement_id: outcome.statement_id,
            schema,
            reader,
            max_bytes,
        })
    }

    /// Engine-assigned identifier of the statement that produced this result.
    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }

    /// Schema of the result set.
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Eagerly pull all rows into a local, read-only [`Table`].
    ///
    /// Fails with [`Error::Resource`] if the result exceeds the session's
    /// configured memory budget; without a budget, allocation pressure
    /// surfaces as-is.
    pub fn materialize(mut self) -> Result<Table> {
        let mut batches = Vec::new();
        let mut bytes = 0usize;
        let mut rows = 0usize;

        while let Some(batch) = self.reader.next_batch()? {
            bytes = bytes.saturating_add(batch.get_array_memory_size());
            if let Some(limit) = self.max_bytes {
                if bytes > limit {
                    return Err(Error::resource(format!(
                        "result set exceeds memory budget: {} bytes > {} byte limit",
                        bytes, limit
                    )));
                }
            }
            rows += batch.num_rows();
            batches.push(batch);
        }

        tracing::debug!(
            "Materialized result {}: {} rows, {} batches, ~{} bytes",
            self.statement_id,
            rows,
            batches.len(),
            bytes
        );

        Ok(Table {
            schema: self.schema,
            batches,
            num_rows: rows,
        })
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("statement_id", &self.statement_id)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// A fully realized, in-memory, read-only tabular value with a fixed schema.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    num_rows: usize,
}

impl Table {
    /// Schema of the table.
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Total number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Column names, in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// True if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// The underlying record batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Zero-row tables still render a header with the correct schema.
        let formatted = if self.batches.is_empty() {
            let empty = RecordBatch::new_empty(self.schema.clone());
            arrow_cast::pretty::pretty_format_batches(&[empty])
        } else {
            arrow_cast::pretty::pretty_format_batches(&self.batches)
        }
        .map_err(|_| fmt::Error)?;
        write!(f, "{}", formatted)
    }
}
