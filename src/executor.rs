//! Bounded execution
//!
//! Runs an accepted SELECT against the target database with a hard ceiling on
//! result size. Statements that do not limit themselves get a row-limiting
//! clause appended; statements that do are left untouched. Engine and
//! connection errors are surfaced together with the statement that was
//! attempted, since that pairing is the diagnostic that matters when
//! generated SQL is wrong.

use crate::db::{self, ConnectionDescriptor};
use crate::error::{AskError, Result};
use crate::value::{decode_cell, SqlValue};
use regex::Regex;
use serde::Serialize;
use sqlx::{Column, Connection, Row};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_ROW_CAP: usize = 20;
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

lazy_static::lazy_static! {
    static ref HAS_LIMIT: Regex = Regex::new(r"(?i)\bLIMIT\b").unwrap();
    static ref STARTS_READ: Regex = Regex::new(r"(?i)^\s*(SELECT|WITH)\b").unwrap();
}

/// Execution knobs. The cap bounds how many rows are materialized; the
/// timeout bounds how long a statement may run (`None` disables it).
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub row_cap: usize,
    pub statement_timeout: Option<Duration>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            row_cap: DEFAULT_ROW_CAP,
            statement_timeout: Some(DEFAULT_STATEMENT_TIMEOUT),
        }
    }
}

/// Materialized query output: ordered column names and column-labeled rows.
/// Empty results carry no column names, matching what the wire gives us.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, SqlValue>>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trim a trailing terminator and append `LIMIT cap` when the statement is a
/// SELECT or CTE without its own limiting clause. Running it twice changes
/// nothing the second time.
pub fn normalize_statement(sql: &str, cap: usize) -> String {
    let bare = sql.trim_end().trim_end_matches(';');
    if !HAS_LIMIT.is_match(bare) && STARTS_READ.is_match(bare) {
        format!("{} LIMIT {}", bare, cap)
    } else {
        bare.to_string()
    }
}

/// Execute one accepted statement and materialize at most `row_cap` rows.
/// Opens a connection for this statement only and closes it afterwards.
pub async fn execute(
    descriptor: &ConnectionDescriptor,
    sql: &str,
    options: &ExecutionOptions,
) -> Result<ResultSet> {
    let statement = normalize_statement(sql, options.row_cap);
    let mut conn = db::connect(descriptor).await.map_err(|e| match e {
        AskError::Connection { message, .. } => AskError::Connection {
            message,
            sql: Some(statement.clone()),
        },
        other => other,
    })?;

    let fetched = match options.statement_timeout {
        Some(limit) => tokio::time::timeout(limit, sqlx::query(&statement).fetch_all(&mut conn))
            .await
            .map_err(|_| AskError::Execution {
                message: format!("statement timed out after {:?}", limit),
                sql: statement.clone(),
            })?,
        None => sqlx::query(&statement).fetch_all(&mut conn).await,
    };

    let rows = fetched.map_err(|e| AskError::Execution {
        message: e.to_string(),
        sql: statement.clone(),
    })?;

    let _ = conn.close().await;

    let columns: Vec<String> = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let records: Vec<HashMap<String, SqlValue>> = rows
        .iter()
        .take(options.row_cap)
        .map(|row| {
            row.columns()
                .iter()
                .enumerate()
                .map(|(i, col)| (col.name().to_string(), decode_cell(row, i)))
                .collect()
        })
        .collect();

    info!(rows = records.len(), "query executed");

    Ok(ResultSet {
        columns,
        rows: records,
    })
}
