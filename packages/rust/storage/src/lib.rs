//! Persisted widget state and session identity.
//!
//! The widget keeps exactly one long-lived value, the session identifier,
//! under a fixed key. [`Storage`] persists it in a local libSQL database;
//! [`MemoryStore`] keeps it for the life of the process only. Both implement
//! [`KeyValueStore`], which is all [`SessionManager`] needs.

mod migrations;
mod session;

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use libsql::{Connection, Database, params};
use nuru_shared::{NuruError, Result};

pub use session::SessionManager;

/// Minimal string key/value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Storage (libSQL)
// ---------------------------------------------------------------------------

/// Primary storage handle wrapping a local libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| NuruError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| NuruError::Storage(e.to_string()))?;

        let conn = db.connect().map_err(|e| NuruError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    NuruError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }
}

impl KeyValueStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM kv WHERE key = ?1", params![key])
            .await
            .map_err(|e| NuruError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| NuruError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(NuruError::Storage(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![key, value, now.as_str()],
            )
            .await
            .map_err(|e| NuruError::Storage(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| NuruError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| NuruError::Storage("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WidgetStore
// ---------------------------------------------------------------------------

/// The store an app actually runs with: the database when it opens, memory
/// otherwise.
pub enum WidgetStore {
    Persistent(Storage),
    Memory(MemoryStore),
}

impl WidgetStore {
    /// Open the database at `path`, degrading to a memory store (with a
    /// warning) when it cannot be opened.
    pub async fn open_or_memory(path: &Path) -> Self {
        match Storage::open(path).await {
            Ok(storage) => Self::Persistent(storage),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    ?path,
                    "widget storage unavailable, session id will not survive this run"
                );
                Self::Memory(MemoryStore::new())
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl KeyValueStore for WidgetStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Persistent(storage) => storage.get(key).await,
            Self::Memory(memory) => memory.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Persistent(storage) => storage.set(key, value).await,
            Self::Memory(memory) => memory.set(key, value).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
