//! SQLite-backed query store.
//!
//! Every call opens its own read-only connection; nothing is pooled or
//! shared between requests. Statements run on the blocking pool and are
//! bounded twice: `tokio::time::timeout` returns control to the caller, and
//! the connection's interrupt handle plus a deadline progress handler make
//! sure the statement itself stops and the connection is dropped.

use crate::otel::{db_explain_span, db_query_span, record_db_metrics};
use crate::store::{PlanStep, QueryStore, RowSet};
use crate::types::{AskError, Result, Row, Value};
use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::Instrument;

/// SQLite VM instructions between deadline checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// Largest busy timeout SQLite accepts.
const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Read-only SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Create a store over an existing database file.
    ///
    /// # Errors
    ///
    /// Returns `AskError::ConfigError` if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AskError::config(format!("Database not found: {}", path.display())));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection and run `op` on it under `timeout`.
    ///
    /// Connection setup happens before the bounded section and is not part
    /// of any timing reported by `op`.
    async fn run_bounded<T, F>(&self, timeout: Duration, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let conn = tokio::task::spawn_blocking(move || connect(&path, timeout))
            .await
            .map_err(|e| AskError::ExecutionUnknownError(format!("Task error: {}", e)))?
            .map_err(|e| classify(e, timeout))?;

        let interrupt = conn.get_interrupt_handle();
        let deadline = Instant::now().checked_add(timeout);
        let task = tokio::task::spawn_blocking(move || {
            if let Some(deadline) = deadline {
                conn.progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() >= deadline));
            }
            op(&conn)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined
                .map_err(|e| AskError::ExecutionUnknownError(format!("Task error: {}", e)))?
                .map_err(|e| classify(e, timeout)),
            Err(_) => {
                interrupt.interrupt();
                Err(AskError::ExecutionTimeout(timeout_ms(timeout)))
            }
        }
    }
}

#[async_trait]
impl QueryStore for SqliteStore {
    async fn query(&self, sql: &str, timeout: Duration) -> Result<RowSet> {
        let span = db_query_span(sql);
        let owned = sql.to_string();

        async move {
            let rows = self.run_bounded(timeout, move |conn| run_statement(conn, &owned)).await?;
            record_db_metrics(rows.rows.len(), rows.elapsed);
            Ok(rows)
        }
        .instrument(span)
        .await
    }

    async fn explain(&self, sql: &str, timeout: Duration) -> Result<Vec<PlanStep>> {
        let span = db_explain_span(sql);
        let owned = sql.to_string();

        self.run_bounded(timeout, move |conn| explain_statement(conn, &owned))
            .instrument(span)
            .await
    }

    async fn describe_schema(&self) -> Result<String> {
        self.run_bounded(Duration::from_secs(10), describe)
            .await
            .map_err(|e| AskError::SchemaError(e.to_string()))
    }
}

fn connect(path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(busy_timeout.min(MAX_BUSY_TIMEOUT))?;
    conn.pragma_update(None, "query_only", true)?;
    Ok(conn)
}

fn run_statement(conn: &Connection, sql: &str) -> rusqlite::Result<RowSet> {
    let started = Instant::now();
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut materialized = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(Value::from(row.get_ref(index)?));
        }
        materialized.push(Row::new(values));
    }

    Ok(RowSet {
        columns,
        rows: materialized,
        elapsed: started.elapsed(),
    })
}

fn explain_statement(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<PlanStep>> {
    let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {}", sql))?;
    let steps = stmt
        .query_map([], |row| {
            Ok(PlanStep {
                id: row.get(0)?,
                parent: row.get(1)?,
                detail: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(steps)
}

fn describe(conn: &Connection) -> rusqlite::Result<String> {
    let mut tables = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names: Vec<String> = tables
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut out = String::from("DATABASE SCHEMA:\n");
    for name in &names {
        let _ = writeln!(out, "\nTable: {}", name);
        let quoted = name.replace('"', "\"\"");
        let mut info = conn.prepare(&format!("PRAGMA table_info(\"{}\")", quoted))?;
        let columns = info.query_map([], |row| {
            let column: String = row.get("name")?;
            let type_str: String = row.get("type")?;
            let pk: i64 = row.get("pk")?;
            Ok((column, type_str, pk > 0))
        })?;
        for column in columns {
            let (column, type_str, pk) = column?;
            let suffix = if pk { " PRIMARY KEY" } else { "" };
            let _ = writeln!(out, "    {:<16}{}{}", column, type_str, suffix);
        }
    }

    let mut indexes = conn.prepare(
        "SELECT name, tbl_name FROM sqlite_master \
         WHERE type = 'index' AND sql IS NOT NULL ORDER BY tbl_name, name",
    )?;
    let indexes: Vec<(String, String)> = indexes
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    if !indexes.is_empty() {
        out.push_str("\nINDEXES:\n");
        for (index, table) in indexes {
            let _ = writeln!(out, "    {} ON {}", index, table);
        }
    }

    Ok(out)
}

/// Map a SQLite error onto the execution taxonomy.
fn classify(err: rusqlite::Error, timeout: Duration) -> AskError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted => {
            AskError::ExecutionTimeout(timeout_ms(timeout))
        }
        rusqlite::Error::SqliteFailure(_, _)
        | rusqlite::Error::MultipleStatement
        | rusqlite::Error::InvalidQuery
        | rusqlite::Error::InvalidPath(_) => AskError::ExecutionOperationalError(err.to_string()),
        _ => AskError::ExecutionUnknownError(err.to_string()),
    }
}

fn timeout_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
