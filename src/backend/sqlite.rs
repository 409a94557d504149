//! SQLite reference backend

use super::{BackendKind, ConnectionInfo, Row, SqlExecutor, StorageBackend};
use crate::config::ensure_db_dir;
use crate::{Error, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const IN_MEMORY: &str = ":memory:";

/// Single-file SQLite backend.
///
/// The connection is opened lazily on first use and then reused for the
/// lifetime of the backend. Foreign key enforcement is switched on for every
/// fresh connection.
pub struct SqliteBackend {
    db_path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteBackend {
    /// Create a backend for `db_path` without connecting.
    ///
    /// With `auto_create_dir`, missing parent directories are created now.
    pub fn new(db_path: impl Into<PathBuf>, auto_create_dir: bool) -> Result<Self> {
        let db_path = db_path.into();
        if auto_create_dir && db_path.as_os_str() != IN_MEMORY {
            ensure_db_dir(&db_path)?;
        }
        Ok(Self {
            db_path,
            conn: Mutex::new(None),
        })
    }

    /// Private in-memory database (for testing)
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(IN_MEMORY),
            conn: Mutex::new(None),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        // An unwinding transaction rolls back on drop, so the connection is
        // still consistent after a panic elsewhere.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> Result<Connection> {
        let target = self.db_path.display().to_string();
        let conn = Connection::open(&self.db_path).map_err(|source| Error::Connection {
            target: target.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|source| Error::Connection { target, source })?;
        tracing::debug!("Opened sqlite connection to {}", self.db_path.display());
        Ok(conn)
    }

    fn ensure_open<'a>(&self, slot: &'a mut Option<Connection>) -> Result<&'a mut Connection> {
        if slot.is_none() {
            *slot = Some(self.open()?);
        }
        slot.as_mut()
            .ok_or_else(|| Error::Backend(format!("no connection for {}", self.db_path.display())))
    }
}

impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn connect(&self) -> Result<()> {
        let mut slot = self.lock();
        self.ensure_open(&mut slot)?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if let Some(conn) = self.lock().take() {
            conn.close().map_err(|(_, e)| Error::Query(e))?;
            tracing::debug!("Closed sqlite connection to {}", self.db_path.display());
        }
        Ok(())
    }

    fn with_connection(&self, op: &mut dyn FnMut(&dyn SqlExecutor) -> Result<()>) -> Result<()> {
        let mut slot = self.lock();
        let conn = self.ensure_open(&mut slot)?;
        let tx = conn.transaction()?;

        match op(&*tx) {
            Ok(()) => {
                tx.commit()?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(
                        "Rollback failed on {}: {}",
                        self.db_path.display(),
                        rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    fn connection_info(&self) -> ConnectionInfo {
        let exists = self.db_path.as_os_str() != IN_MEMORY && self.db_path.exists();
        ConnectionInfo::Sqlite {
            db_path: self.db_path.clone(),
            exists,
        }
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl SqlExecutor for Connection {
    fn run(&self, sql: &str, params: &[Value]) -> Result<usize> {
        Ok(self.execute(sql, params_from_iter(params.iter()))?)
    }

    fn first_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let mut stmt = self.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        match rows.next()? {
            Some(row) => Ok(Some(read_row(row, width)?)),
            None => Ok(None),
        }
    }

    fn all_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut stmt = self.prepare(sql)?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| read_row(row, width))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Row> {
    (0..width).map(|i| row.get::<_, Value>(i)).collect()
}
