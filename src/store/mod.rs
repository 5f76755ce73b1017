//! # Persistence Surface
//!
//! Narrow upsert-capable store the dispatch runtime consumes. The core
//! only assumes `id` is a unique opaque string; the sqlite implementation
//! backs the per-user locale preference read at dispatch time.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use parking_lot::Mutex;

/// A stored user record.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user_id: String,
    pub about: Option<String>,
    pub locale: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields to update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub about: Option<String>,
    pub locale: Option<String>,
}

/// Upsert-capable record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record for `user_id`, creating it if absent.
    async fn find_or_create(&self, user_id: &str) -> Result<UserRecord>;

    /// Apply a partial update, creating the record if absent, and return
    /// the resulting record.
    async fn update_fields(&self, user_id: &str, patch: UserPatch) -> Result<UserRecord>;
}

/// Sqlite-backed store.
pub struct SqliteStore {
    connection: Arc<Mutex<sqlite::ConnectionThreadSafe>>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: &str) -> Result<Self> {
        let connection = sqlite::Connection::open_thread_safe(path)
            .map_err(|e| anyhow!("failed to open database at {path}: {e}"))?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                about TEXT,
                locale TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;

        info!("Database ready at {path}");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn read_user(
        connection: &sqlite::Connection,
        user_id: &str,
    ) -> Result<Option<UserRecord>> {
        let mut statement = connection.prepare(
            "SELECT user_id, about, locale, created_at, updated_at FROM users WHERE user_id = ?",
        )?;
        statement.bind((1, user_id))?;

        if statement.next()? == sqlite::State::Row {
            Ok(Some(UserRecord {
                user_id: statement.read::<String, _>("user_id")?,
                about: statement.read::<Option<String>, _>("about")?,
                locale: statement.read::<Option<String>, _>("locale")?,
                created_at: statement.read::<String, _>("created_at")?,
                updated_at: statement.read::<String, _>("updated_at")?,
            }))
        } else {
            Ok(None)
        }
    }

    fn insert_user(connection: &sqlite::Connection, user_id: &str) -> Result<UserRecord> {
        let now = Utc::now().to_rfc3339();
        let mut statement = connection.prepare(
            "INSERT INTO users (user_id, about, locale, created_at, updated_at)
             VALUES (?, NULL, NULL, ?, ?)",
        )?;
        statement.bind((1, user_id))?;
        statement.bind((2, now.as_str()))?;
        statement.bind((3, now.as_str()))?;
        statement.next()?;

        Ok(UserRecord {
            user_id: user_id.to_string(),
            about: None,
            locale: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn find_or_create(&self, user_id: &str) -> Result<UserRecord> {
        let connection = self.connection.lock();
        match Self::read_user(&connection, user_id)? {
            Some(record) => Ok(record),
            None => Self::insert_user(&connection, user_id),
        }
    }

    async fn update_fields(&self, user_id: &str, patch: UserPatch) -> Result<UserRecord> {
        let connection = self.connection.lock();
        let mut record = match Self::read_user(&connection, user_id)? {
            Some(record) => record,
            None => Self::insert_user(&connection, user_id)?,
        };

        if let Some(about) = patch.about {
            record.about = Some(about);
        }
        if let Some(locale) = patch.locale {
            record.locale = Some(locale);
        }
        record.updated_at = Utc::now().to_rfc3339();

        let mut statement = connection.prepare(
            "UPDATE users SET about = ?, locale = ?, updated_at = ? WHERE user_id = ?",
        )?;
        statement.bind((1, record.about.as_deref()))?;
        statement.bind((2, record.locale.as_deref()))?;
        statement.bind((3, record.updated_at.as_str()))?;
        statement.bind((4, user_id))?;
        statement.next()?;

        Ok(record)
    }
}

/// In-memory store used by tests and token-less local development.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_or_create(&self, user_id: &str) -> Result<UserRecord> {
        let mut records = self.records.lock();
        let record = records.entry(user_id.to_string()).or_insert_with(|| {
            let now = Utc::now().to_rfc3339();
            UserRecord {
                user_id: user_id.to_string(),
                about: None,
                locale: None,
                created_at: now.clone(),
                updated_at: now,
            }
        });
        Ok(record.clone())
    }

    async fn update_fields(&self, user_id: &str, patch: UserPatch) -> Result<UserRecord> {
        {
            let mut records = self.records.lock();
            let now = Utc::now().to_rfc3339();
            let record = records.entry(user_id.to_string()).or_insert_with(|| UserRecord {
                user_id: user_id.to_string(),
                about: None,
                locale: None,
                created_at: now.clone(),
                updated_at: now.clone(),
            });
            if let Some(about) = patch.about {
                record.about = Some(about);
            }
            if let Some(locale) = patch.locale {
                record.locale = Some(locale);
            }
            record.updated_at = now;
        }
        self.find_or_create(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_find_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.find_or_create("user-1").await.unwrap();
        let second = store.find_or_create("user-1").await.unwrap();
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn test_memory_store_partial_update() {
        let store = MemoryStore::new();
        store
            .update_fields(
                "user-1",
                UserPatch {
                    locale: Some("es-ES".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let record = store.find_or_create("user-1").await.unwrap();
        assert_eq!(record.locale.as_deref(), Some("es-ES"));
        assert_eq!(record.about, None);
    }

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("relay-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();

        let created = store.find_or_create("123456789012345678").await.unwrap();
        assert_eq!(created.user_id, "123456789012345678");
        assert_eq!(created.locale, None);

        let updated = store
            .update_fields(
                "123456789012345678",
                UserPatch {
                    about: Some("hello".into()),
                    locale: Some("pt-BR".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.about.as_deref(), Some("hello"));

        let fetched = store.find_or_create("123456789012345678").await.unwrap();
        assert_eq!(fetched.locale.as_deref(), Some("pt-BR"));
        assert_eq!(fetched.created_at, created.created_at);

        std::fs::remove_dir_all(&dir).ok();
    }
}
