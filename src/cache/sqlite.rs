use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{CachedResponse, ResponseCache, cache_key};

/// SQLite-backed response cache.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open or create the cache table at `path`. Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create cache directory {}", parent.display()))?;
        }

        let conn = Connection::open(path).context("failed to open cache database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS response_cache (
                key          TEXT PRIMARY KEY,
                url          TEXT NOT NULL,
                content_type TEXT NOT NULL,
                body         TEXT NOT NULL,
                expires_at   INTEGER NOT NULL
            )",
        )
        .context("failed to create cache table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("cache connection poisoned"))
    }
}

#[async_trait]
impl ResponseCache for SqliteCache {
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        let now = Utc::now().timestamp();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT content_type, body FROM response_cache WHERE key = ?1 AND expires_at > ?2",
        )?;
        let hit = stmt
            .query_row(params![cache_key(url), now], |row| {
                Ok(CachedResponse {
                    content_type: row.get(0)?,
                    body: row.get(1)?,
                })
            })
            .optional()?;
        Ok(hit)
    }

    async fn put(&self, url: &str, response: &CachedResponse, ttl: Duration) -> Result<()> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp().saturating_add(ttl_secs);
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO response_cache (key, url, content_type, body, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                url = excluded.url,
                content_type = excluded.content_type,
                body = excluded.body,
                expires_at = excluded.expires_at",
            params![
                cache_key(url),
                url,
                response.content_type,
                response.body,
                expires_at
            ],
        )?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now().timestamp();
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM response_cache WHERE expires_at <= ?1", [now])?;
        Ok(removed)
    }
}
