//! Storage backends
//!
//! Every engine implements [`StorageBackend`]:
//! - `connect` / `close` manage one long-lived connection
//! - `with_connection` runs an operation inside a commit-or-rollback scope
//! - `execute` / `fetch_one` / `fetch_all` are built on that scope
//! - `connection_info` describes the target without opening anything

pub mod factory;
pub mod network;
pub mod sqlite;

pub use factory::{BackendConfig, SqliteConfig, create_backend, create_sqlite_backend};
pub use network::{MysqlBackend, NetworkConfig, PostgresBackend};
pub use sqlite::SqliteBackend;

use crate::{Error, Result};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// One result row, columns in SELECT order.
pub type Row = Vec<Value>;

/// Engines a backend can sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sqlite,
    Postgresql,
    Mysql,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Postgresql => "postgresql",
            BackendKind::Mysql => "mysql",
        }
    }

    /// Default TCP port for network engines
    pub fn default_port(&self) -> Option<u16> {
        match self {
            BackendKind::Sqlite => None,
            BackendKind::Postgresql => Some(5432),
            BackendKind::Mysql => Some(3306),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "postgresql" => Ok(BackendKind::Postgresql),
            "mysql" => Ok(BackendKind::Mysql),
            _ => Err(Error::Config(format!("Unknown provider type: {}", s))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Descriptive metadata about a backend's target.
///
/// Building one never opens a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionInfo {
    Sqlite {
        db_path: PathBuf,
        exists: bool,
    },
    Postgresql {
        host: String,
        port: u16,
        database: String,
        user: String,
    },
    Mysql {
        host: String,
        port: u16,
        database: String,
        user: String,
    },
}

impl ConnectionInfo {
    pub fn kind(&self) -> BackendKind {
        match self {
            ConnectionInfo::Sqlite { .. } => BackendKind::Sqlite,
            ConnectionInfo::Postgresql { .. } => BackendKind::Postgresql,
            ConnectionInfo::Mysql { .. } => BackendKind::Mysql,
        }
    }

    /// Path for file engines, `user@host:port/database` for network ones
    pub fn location(&self) -> String {
        match self {
            ConnectionInfo::Sqlite { db_path, .. } => db_path.display().to_string(),
            ConnectionInfo::Postgresql { host, port, database, user }
            | ConnectionInfo::Mysql { host, port, database, user } => {
                format!("{}@{}:{}/{}", user, host, port, database)
            }
        }
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.location(), self.kind())
    }
}

/// Statement-level access to an open connection.
///
/// Handed to operations running inside [`StorageBackend::with_connection`].
pub trait SqlExecutor {
    /// Run a mutating statement, returning the number of affected rows
    fn run(&self, sql: &str, params: &[Value]) -> Result<usize>;

    /// First row of a query, `None` when nothing matches
    fn first_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>>;

    /// Every row of a query in engine order
    fn all_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;
}

/// A storage engine holding at most one live connection.
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Open the underlying connection if it is not already open.
    fn connect(&self) -> Result<()>;

    /// Release the connection. Safe to call when already closed.
    fn close(&self) -> Result<()>;

    /// Run `op` against the connection, opening it first if needed.
    ///
    /// Pending work is committed when `op` returns `Ok` and rolled back when it
    /// returns `Err`; the error is then returned unchanged. The connection stays
    /// open afterwards for the next call.
    ///
    /// `op` must not call back into the same backend.
    fn with_connection(&self, op: &mut dyn FnMut(&dyn SqlExecutor) -> Result<()>) -> Result<()>;

    /// Run a mutating statement and commit it.
    fn execute(&self, query: &str, params: &[Value]) -> Result<()> {
        transact(self, |conn| conn.run(query, params).map(|_| ()))
    }

    /// First matching row, or `None` when there is none.
    fn fetch_one(&self, query: &str, params: &[Value]) -> Result<Option<Row>> {
        transact(self, |conn| conn.first_row(query, params))
    }

    /// All matching rows.
    fn fetch_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        transact(self, |conn| conn.all_rows(query, params))
    }

    fn connection_info(&self) -> ConnectionInfo;
}

/// Run a typed operation in the backend's commit-or-rollback scope.
///
/// Several statements issued from one `op` commit together or not at all.
pub fn transact<B, T, F>(backend: &B, op: F) -> Result<T>
where
    B: StorageBackend + ?Sized,
    F: FnOnce(&dyn SqlExecutor) -> Result<T>,
{
    let mut op = Some(op);
    let mut output = None;
    backend.with_connection(&mut |conn: &dyn SqlExecutor| -> Result<()> {
        if let Some(op) = op.take() {
            output = Some(op(conn)?);
        }
        Ok(())
    })?;
    output.ok_or_else(|| {
        Error::Backend(format!(
            "{} backend returned without running the operation",
            backend.kind()
        ))
    })
}
