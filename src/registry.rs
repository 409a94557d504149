//! Backend registry
//!
//! Maps logical names to backends and keeps one mutable "default" pointer.
//! [`BackendRegistry::resolve`] picks the backend for a call:
//! explicit path > explicit name > current default.

use crate::backend::{
    BackendConfig, ConnectionInfo, SqliteBackend, StorageBackend, create_backend, create_sqlite_backend,
};
use crate::config::ChatStoreConfig;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Name the seeded backend is registered under
pub const DEFAULT_BACKEND: &str = "default";

static GLOBAL: OnceLock<BackendRegistry> = OnceLock::new();

/// Explicit routing for one call. Empty means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub path: Option<PathBuf>,
    pub name: Option<String>,
}

impl Route {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            name: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            path: None,
            name: Some(name.into()),
        }
    }
}

/// A registered backend as seen by callers
#[derive(Clone)]
pub struct BackendHandle {
    pub logical_name: String,
    pub backend: Arc<dyn StorageBackend>,
    pub is_default: bool,
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("logical_name", &self.logical_name)
            .field("backend", &self.backend.connection_info())
            .field("is_default", &self.is_default)
            .finish()
    }
}

struct Inner {
    backends: BTreeMap<String, Arc<dyn StorageBackend>>,
    // Always a key of `backends`.
    default_name: String,
}

pub struct BackendRegistry {
    inner: RwLock<Inner>,
}

impl BackendRegistry {
    /// Create a registry whose default is `backend`, registered as "default".
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let mut backends = BTreeMap::new();
        backends.insert(DEFAULT_BACKEND.to_string(), backend);
        Self {
            inner: RwLock::new(Inner {
                backends,
                default_name: DEFAULT_BACKEND.to_string(),
            }),
        }
    }

    /// Seed the default backend with a sqlite file at `db_path`.
    pub fn with_default_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let backend = create_sqlite_backend(db_path, true)?;
        Ok(Self::new(Arc::new(backend)))
    }

    /// Build a registry from file configuration.
    ///
    /// The sqlite default comes first, then each `[providers.*]` entry, then
    /// `default_provider` is applied.
    pub fn from_config(config: &ChatStoreConfig) -> Result<Self> {
        let registry = Self::with_default_path(config.database_path())?;
        for (name, value) in &config.providers {
            let backend_config = BackendConfig::from_value(value.clone())?;
            tracing::debug!("Registering {} provider '{}'", backend_config.kind(), name);
            registry.register(name.clone(), create_backend(&backend_config)?, false);
        }
        if let Some(name) = &config.default_provider {
            registry.set_default(name)?;
        }
        Ok(registry)
    }

    /// Process-wide registry, seeded from the default configuration on first use.
    pub fn global() -> Result<&'static BackendRegistry> {
        if let Some(registry) = GLOBAL.get() {
            return Ok(registry);
        }
        let registry = Self::from_config(&ChatStoreConfig::default())?;
        Ok(GLOBAL.get_or_init(|| registry))
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace `name`. With `make_default`, also point the default at it.
    pub fn register(&self, name: impl Into<String>, backend: Arc<dyn StorageBackend>, make_default: bool) {
        let name = name.into();
        let mut inner = self.write();
        if inner.backends.insert(name.clone(), backend).is_some() {
            tracing::debug!("Replaced backend '{}'", name);
        }
        if make_default {
            tracing::info!("Default backend set to '{}'", name);
            inner.default_name = name;
        }
    }

    /// Point the default at an already registered name.
    ///
    /// Unknown names fail with [`Error::NotFound`] and leave the default as it was.
    pub fn set_default(&self, name: &str) -> Result<()> {
        let mut inner = self.write();
        if !inner.backends.contains_key(name) {
            return Err(Error::NotFound(name.to_string()));
        }
        tracing::info!("Default backend set to '{}'", name);
        inner.default_name = name.to_string();
        Ok(())
    }

    pub fn default_name(&self) -> String {
        self.read().default_name.clone()
    }

    /// Look up a registered backend by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn StorageBackend>> {
        self.read()
            .backends
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Pick the backend for one call.
    ///
    /// A path builds a fresh sqlite backend that is never registered and lives
    /// only as long as the returned handle. A name must already be registered.
    /// With neither, the current default is used.
    pub fn resolve(&self, route: &Route) -> Result<Arc<dyn StorageBackend>> {
        if let Some(path) = &route.path {
            return Ok(Arc::new(Self::scoped_backend(path)?));
        }
        if let Some(name) = &route.name {
            return self.get(name);
        }
        let inner = self.read();
        inner
            .backends
            .get(&inner.default_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(inner.default_name.clone()))
    }

    fn scoped_backend(path: &Path) -> Result<SqliteBackend> {
        tracing::debug!("Using unregistered sqlite backend at {}", path.display());
        create_sqlite_backend(path, true)
    }

    /// Snapshot of name -> connection info for every registered backend.
    pub fn list(&self) -> BTreeMap<String, ConnectionInfo> {
        self.read()
            .backends
            .iter()
            .map(|(name, backend)| (name.clone(), backend.connection_info()))
            .collect()
    }

    /// Every registered backend, ordered by name.
    pub fn handles(&self) -> Vec<BackendHandle> {
        let inner = self.read();
        inner
            .backends
            .iter()
            .map(|(name, backend)| BackendHandle {
                logical_name: name.clone(),
                backend: Arc::clone(backend),
                is_default: *name == inner.default_name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Arc<dyn StorageBackend> {
        Arc::new(SqliteBackend::in_memory())
    }

    #[test]
    fn test_seeded_default() {
        let registry = BackendRegistry::new(memory());
        assert_eq!(registry.default_name(), DEFAULT_BACKEND);
        assert_eq!(registry.list().len(), 1);
        assert!(registry.resolve(&Route::default()).is_ok());
    }

    #[test]
    fn test_register_make_default() {
        let registry = BackendRegistry::new(memory());
        registry.register("x", memory(), true);
        assert_eq!(registry.default_name(), "x");

        registry.register("y", memory(), false);
        assert_eq!(registry.default_name(), "x");
        assert_eq!(registry.list().len(), 3);
    }

    #[test]
    fn test_set_default_unknown_leaves_default() {
        let registry = BackendRegistry::new(memory());
        registry.register("x", memory(), true);

        let err = registry.set_default("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref name) if name == "missing"));
        assert_eq!(registry.default_name(), "x");

        registry.set_default(DEFAULT_BACKEND).unwrap();
        assert_eq!(registry.default_name(), DEFAULT_BACKEND);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let registry = BackendRegistry::new(memory());
        let replacement = Arc::new(SqliteBackend::new(dir.path().join("b.db"), true).unwrap());
        registry.register(DEFAULT_BACKEND, replacement, false);

        assert_eq!(registry.list().len(), 1);
        assert_eq!(
            registry.list()[DEFAULT_BACKEND],
            ConnectionInfo::Sqlite { db_path: dir.path().join("b.db"), exists: false }
        );
    }

    #[test]
    fn test_resolve_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let registry = BackendRegistry::new(memory());
        let named_path = dir.path().join("named.db");
        registry.register("named", Arc::new(SqliteBackend::new(&named_path, true).unwrap()), false);
        let explicit = dir.path().join("explicit.db");

        // path beats name
        let route = Route {
            path: Some(explicit.clone()),
            name: Some("named".to_string()),
        };
        let backend = registry.resolve(&route).unwrap();
        assert!(matches!(backend.connection_info(), ConnectionInfo::Sqlite { ref db_path, .. } if *db_path == explicit));

        // name beats default
        let backend = registry.resolve(&Route::named("named")).unwrap();
        assert!(matches!(backend.connection_info(), ConnectionInfo::Sqlite { ref db_path, .. } if *db_path == named_path));

        // unregistered name fails
        assert!(matches!(registry.resolve(&Route::named("nope")), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_resolve_path_never_touches_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = BackendRegistry::new(memory());
        registry.register("x", memory(), true);
        let before = registry.list();

        let backend = registry.resolve(&Route::path(dir.path().join("scratch.db"))).unwrap();
        backend.execute("CREATE TABLE t (id INTEGER)", &[]).unwrap();

        assert_eq!(registry.list(), before);
        assert_eq!(registry.default_name(), "x");
    }

    #[test]
    fn test_resolve_path_builds_fresh_instance() {
        let dir = tempfile::tempdir().unwrap();
        let registry = BackendRegistry::new(memory());
        let route = Route::path(dir.path().join("scratch.db"));

        let a = registry.resolve(&route).unwrap();
        let b = registry.resolve(&route).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        let d1 = registry.resolve(&Route::default()).unwrap();
        let d2 = registry.resolve(&Route::default()).unwrap();
        assert!(Arc::ptr_eq(&d1, &d2));
    }

    #[test]
    fn test_handles_mark_default() {
        let registry = BackendRegistry::new(memory());
        registry.register("x", memory(), true);

        let handles = registry.handles();
        assert_eq!(handles.len(), 2);
        let defaults: Vec<_> = handles.iter().filter(|h| h.is_default).map(|h| h.logical_name.as_str()).collect();
        assert_eq!(defaults, vec!["x"]);
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChatStoreConfig {
            database: Some(dir.path().join("main.db").display().to_string()),
            default_provider: Some("archive".to_string()),
            ..Default::default()
        };
        let archive: toml::Value = toml::from_str(&format!(
            "type = \"sqlite\"\ndb_path = {:?}\n",
            dir.path().join("archive.db").display().to_string()
        ))
        .unwrap();
        config.providers.insert("archive".to_string(), archive);

        let registry = BackendRegistry::from_config(&config).unwrap();
        assert_eq!(registry.default_name(), "archive");
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_from_config_stub_provider_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChatStoreConfig {
            database: Some(dir.path().join("main.db").display().to_string()),
            ..Default::default()
        };
        let pg: toml::Value = toml::from_str(
            "type = \"postgresql\"\nhost = \"localhost\"\ndatabase = \"chat\"\nuser = \"svc\"\npassword = \"pw\"\n",
        )
        .unwrap();
        config.providers.insert("pg".to_string(), pg);

        assert!(matches!(BackendRegistry::from_config(&config), Err(Error::NotImplemented(_))));
    }

    #[test]
    fn test_from_config_unknown_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChatStoreConfig {
            database: Some(dir.path().join("main.db").display().to_string()),
            default_provider: Some("ghost".to_string()),
            ..Default::default()
        };
        assert!(matches!(BackendRegistry::from_config(&config), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_global_is_seeded_once() {
        let _guard = crate::config::ENV_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("chat_history.db");
        let previous = std::env::var_os(crate::config::DATABASE_ENV);
        // SAFETY: ENV_LOCK serializes every test in this crate that touches the environment
        unsafe { std::env::set_var(crate::config::DATABASE_ENV, &db_path) };

        let first = BackendRegistry::global().unwrap();
        let second = BackendRegistry::global().unwrap();

        match previous {
            Some(value) => unsafe { std::env::set_var(crate::config::DATABASE_ENV, value) },
            None => unsafe { std::env::remove_var(crate::config::DATABASE_ENV) },
        }

        assert!(std::ptr::eq(first, second));
        assert_eq!(first.default_name(), DEFAULT_BACKEND);
        assert!(matches!(
            &first.list()[DEFAULT_BACKEND],
            ConnectionInfo::Sqlite { db_path: p, .. } if *p == db_path
        ));
        assert!(db_path.parent().unwrap().is_dir());
    }
}
