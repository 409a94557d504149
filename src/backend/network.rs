//! Network SQL engines (PostgreSQL, MySQL)
//!
//! No driver is linked for either engine yet. Construction fails with
//! [`Error::NotImplemented`] naming the missing driver, and every operation on
//! the types does the same. [`PostgresBackend::describe`] and
//! [`MysqlBackend::describe`] still report the configured target.

use super::{BackendKind, ConnectionInfo, SqlExecutor, StorageBackend};
use crate::{Error, Result};
use serde::Deserialize;

/// Connection settings shared by the network engines
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl NetworkConfig {
    fn describe(&self, kind: BackendKind) -> ConnectionInfo {
        let (host, port, database, user) = (
            self.host.clone(),
            self.port,
            self.database.clone(),
            self.user.clone(),
        );
        match kind {
            BackendKind::Mysql => ConnectionInfo::Mysql { host, port, database, user },
            _ => ConnectionInfo::Postgresql { host, port, database, user },
        }
    }
}

impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// PostgreSQL backend placeholder
#[derive(Debug)]
pub struct PostgresBackend {
    config: NetworkConfig,
}

impl PostgresBackend {
    pub fn new(config: NetworkConfig) -> Result<Self> {
        tracing::debug!("Refusing to build postgresql backend for {}", config.host);
        Err(Error::NotImplemented(
            "PostgreSQL provider not yet implemented. Add a PostgreSQL driver crate (e.g. `postgres`) and implement connection logic."
                .to_string(),
        ))
    }

    pub fn describe(config: &NetworkConfig) -> ConnectionInfo {
        config.describe(BackendKind::Postgresql)
    }
}

impl StorageBackend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgresql
    }

    fn connect(&self) -> Result<()> {
        Err(unsupported(BackendKind::Postgresql, "connect"))
    }

    fn close(&self) -> Result<()> {
        Err(unsupported(BackendKind::Postgresql, "close"))
    }

    fn with_connection(&self, _op: &mut dyn FnMut(&dyn SqlExecutor) -> Result<()>) -> Result<()> {
        Err(unsupported(BackendKind::Postgresql, "with_connection"))
    }

    fn connection_info(&self) -> ConnectionInfo {
        Self::describe(&self.config)
    }
}

/// MySQL backend placeholder
#[derive(Debug)]
pub struct MysqlBackend {
    config: NetworkConfig,
}

impl MysqlBackend {
    pub fn new(config: NetworkConfig) -> Result<Self> {
        tracing::debug!("Refusing to build mysql backend for {}", config.host);
        Err(Error::NotImplemented(
            "MySQL provider not yet implemented. Add a MySQL driver crate (e.g. `mysql`) and implement connection logic."
                .to_string(),
        ))
    }

    pub fn describe(config: &NetworkConfig) -> ConnectionInfo {
        config.describe(BackendKind::Mysql)
    }
}

impl StorageBackend for MysqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mysql
    }

    fn connect(&self) -> Result<()> {
        Err(unsupported(BackendKind::Mysql, "connect"))
    }

    fn close(&self) -> Result<()> {
        Err(unsupported(BackendKind::Mysql, "close"))
    }

    fn with_connection(&self, _op: &mut dyn FnMut(&dyn SqlExecutor) -> Result<()>) -> Result<()> {
        Err(unsupported(BackendKind::Mysql, "with_connection"))
    }

    fn connection_info(&self) -> ConnectionInfo {
        Self::describe(&self.config)
    }
}

fn unsupported(kind: BackendKind, op: &str) -> Error {
    Error::NotImplemented(format!("{} backend has no driver; cannot {}", kind, op))
}
