use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default database location
pub const DATABASE_ENV: &str = "CHATSTORE_DATABASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatStoreConfig {
    /// Path of the sqlite database registered as "default"
    pub database: Option<String>,
    /// Provider made default once every provider is registered
    pub default_provider: Option<String>,
    /// Extra providers, each a table with a `type` key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, toml::Value>,
}

impl ChatStoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("chatstore.toml")
}

pub fn default_database_path() -> PathBuf {
    std::env::var_os(DATABASE_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_database_path_in(Path::new(".")))
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join("data").join("chat_history.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ChatStoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ChatStoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ChatStoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Create the parent directory of `db_path` if it is missing.
pub fn ensure_db_dir(db_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Serializes tests that read or write process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_providers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatstore.toml");
        std::fs::write(
            &path,
            r#"
database = "chat.db"
default_provider = "archive"

[providers.archive]
type = "sqlite"
db_path = "archive.db"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.database_path(), PathBuf::from("chat.db"));
        assert_eq!(config.default_provider.as_deref(), Some("archive"));
        assert_eq!(config.providers["archive"]["type"].as_str(), Some("sqlite"));
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatstore.toml");
        let config = ChatStoreConfig {
            database: Some("chat.db".to_string()),
            ..Default::default()
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let reloaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(reloaded.database.as_deref(), Some("chat.db"));
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("chat.db");

        ensure_db_dir(&db_path).unwrap();
        assert!(db_path.parent().unwrap().is_dir());
        assert!(!db_path.exists());

        // already present, and a bare file name has no parent to create
        ensure_db_dir(&db_path).unwrap();
        ensure_db_dir(Path::new("chat.db")).unwrap();
    }

    #[test]
    fn test_ensure_db_dir_parent_is_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        assert!(ensure_db_dir(&dir.path().join("blocker").join("sub").join("chat.db")).is_err());
    }

    #[test]
    fn test_database_env_override() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = std::env::var_os(DATABASE_ENV);

        // SAFETY: ENV_LOCK serializes every test in this crate that touches the environment
        unsafe { std::env::set_var(DATABASE_ENV, "/tmp/override/chat.db") };
        assert_eq!(default_database_path(), PathBuf::from("/tmp/override/chat.db"));
        assert_eq!(
            ChatStoreConfig::default().database_path(),
            PathBuf::from("/tmp/override/chat.db")
        );

        unsafe { std::env::set_var(DATABASE_ENV, "") };
        assert_eq!(default_database_path(), default_database_path_in(Path::new(".")));

        unsafe { std::env::remove_var(DATABASE_ENV) };
        assert_eq!(default_database_path(), PathBuf::from("./data/chat_history.db"));

        if let Some(value) = previous {
            unsafe { std::env::set_var(DATABASE_ENV, value) };
        }
    }

    #[test]
    fn test_starter_config_omits_empty_providers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatstore.toml");
        let config = ChatStoreConfig {
            database: Some("chat.db".to_string()),
            ..Default::default()
        };

        write_config(&path, &config, false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("providers"));
        assert!(load_config(Some(&path)).unwrap().unwrap().providers.is_empty());
    }
}
