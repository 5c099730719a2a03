//! Library configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::Error;
use crate::object::CachePolicy;

/// Configuration for opening a [`Library`](crate::Library).
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Path to the library file. An empty path opens an in-memory library.
    pub path: PathBuf,

    /// Enforce the foreign keys of generated tables inside the store.
    pub foreign_keys: bool,

    /// Capacity of the connection's prepared statement cache.
    ///
    /// Object handlers compile their statements into this cache, so it should
    /// hold at least the statements of the handlers used together.
    pub statement_cache_capacity: usize,

    /// How long to wait on a locked database file. None fails immediately.
    pub busy_timeout: Option<Duration>,

    /// Cache policy new object handlers start with.
    pub default_cache_policy: CachePolicy,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./folio.db"),
            foreign_keys: true,
            statement_cache_capacity: 128,
            busy_timeout: None,
            default_cache_policy: CachePolicy::Weak,
        }
    }
}

impl LibraryConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create an in-memory configuration for testing.
    pub fn temporary() -> Self {
        Self {
            path: PathBuf::new(),
            ..Default::default()
        }
    }

    /// Whether this configuration opens an in-memory library.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Path of the library file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enable or disable foreign key enforcement.
    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the prepared statement cache capacity.
    pub fn with_statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Set the default cache policy of object handlers.
    pub fn with_default_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.default_cache_policy = policy;
        self
    }

    /// Open a store connection configured from these settings.
    pub(crate) fn open_connection(&self) -> Result<Connection, Error> {
        let conn = if self.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.path)?
        };

        conn.set_prepared_statement_cache_capacity(self.statement_cache_capacity);
        conn.pragma_update(None, "foreign_keys", self.foreign_keys)?;
        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }

        Ok(conn)
    }
}
