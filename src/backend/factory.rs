//! Backend construction from configuration

use super::{BackendKind, MysqlBackend, NetworkConfig, PostgresBackend, SqliteBackend, StorageBackend};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

fn default_auto_create_dir() -> bool {
    true
}

/// Settings for the SQLite backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_auto_create_dir")]
    pub auto_create_dir: bool,
}

/// A backend description keyed by engine type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Sqlite(SqliteConfig),
    Postgresql(NetworkConfig),
    Mysql(NetworkConfig),
}

impl BackendConfig {
    /// Parse a loosely typed table such as `{ type = "sqlite", db_path = "..." }`.
    ///
    /// `type` is matched case-insensitively. Network engines fall back to their
    /// default port when none is given.
    pub fn from_value(value: toml::Value) -> Result<Self> {
        let mut table = match value {
            toml::Value::Table(table) => table,
            other => {
                return Err(Error::Config(format!(
                    "provider config must be a table, got {}",
                    other.type_str()
                )));
            }
        };

        let type_name = table
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let kind: BackendKind = type_name.parse()?;

        if let Some(port) = kind.default_port() {
            table
                .entry("port")
                .or_insert(toml::Value::Integer(i64::from(port)));
        }

        let value = toml::Value::Table(table);
        let invalid = |e: toml::de::Error| Error::Config(format!("invalid {} provider config: {}", kind, e));
        match kind {
            BackendKind::Sqlite => value.try_into().map(BackendConfig::Sqlite).map_err(invalid),
            BackendKind::Postgresql => value.try_into().map(BackendConfig::Postgresql).map_err(invalid),
            BackendKind::Mysql => value.try_into().map(BackendConfig::Mysql).map_err(invalid),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Sqlite(_) => BackendKind::Sqlite,
            BackendConfig::Postgresql(_) => BackendKind::Postgresql,
            BackendConfig::Mysql(_) => BackendKind::Mysql,
        }
    }
}

/// Build the backend a config describes.
///
/// Constructor failures (for example an engine without a driver) are returned
/// as-is.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config {
        BackendConfig::Sqlite(c) => Arc::new(SqliteBackend::new(c.db_path.clone(), c.auto_create_dir)?),
        BackendConfig::Postgresql(c) => Arc::new(PostgresBackend::new(c.clone())?),
        BackendConfig::Mysql(c) => Arc::new(MysqlBackend::new(c.clone())?),
    };
    Ok(backend)
}

pub fn create_sqlite_backend(db_path: impl Into<PathBuf>, auto_create_dir: bool) -> Result<SqliteBackend> {
    SqliteBackend::new(db_path, auto_create_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ConnectionInfo;

    fn parse(src: &str) -> Result<BackendConfig> {
        let value: toml::Value = toml::from_str(src).unwrap();
        BackendConfig::from_value(value)
    }

    #[test]
    fn test_sqlite_config() {
        let config = parse(
            r#"
            type = "SQLite"
            db_path = "/tmp/chat.db"
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            BackendConfig::Sqlite(SqliteConfig {
                db_path: PathBuf::from("/tmp/chat.db"),
                auto_create_dir: true,
            })
        );
    }

    #[test]
    fn test_network_default_ports() {
        let pg = parse(
            r#"
            type = "postgresql"
            host = "localhost"
            database = "chat"
            user = "svc"
            password = "pw"
            "#,
        )
        .unwrap();
        match pg {
            BackendConfig::Postgresql(c) => assert_eq!(c.port, 5432),
            other => panic!("unexpected {:?}", other),
        }

        let my = parse(
            r#"
            type = "mysql"
            host = "localhost"
            port = 3307
            database = "chat"
            user = "svc"
            password = "pw"
            "#,
        )
        .unwrap();
        match my {
            BackendConfig::Mysql(c) => assert_eq!(c.port, 3307),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        let err = parse(r#"type = "oracle""#).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("oracle")));

        let err = parse(r#"db_path = "/tmp/x.db""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_field_is_config_error() {
        let err = parse(r#"type = "sqlite""#).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("db_path")));
    }

    #[test]
    fn test_create_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("chat.db");
        let config = BackendConfig::Sqlite(SqliteConfig {
            db_path: path.clone(),
            auto_create_dir: true,
        });

        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.kind(), BackendKind::Sqlite);
        assert_eq!(
            backend.connection_info(),
            ConnectionInfo::Sqlite { db_path: path, exists: false }
        );
    }

    #[test]
    fn test_create_stub_backend_propagates_not_implemented() {
        let config = BackendConfig::Postgresql(NetworkConfig {
            host: "localhost".to_string(),
            port: 5432,
            database: "chat".to_string(),
            user: "svc".to_string(),
            password: "pw".to_string(),
        });
        assert!(matches!(create_backend(&config), Err(Error::NotImplemented(_))));
    }
}
