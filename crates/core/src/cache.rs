//! TTL'd cache for live robots.txt bodies.
//!
//! The cache is an optimization, never an authority: absence, expiry, and
//! backend failure all look identical to the caller (a miss), and writes are
//! best-effort. Every resolution path must stay correct, just slower, with
//! the cache completely unavailable.

use crate::{Db, domain};
use async_trait::async_trait;
use std::time::Duration;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Capability seam over the robots.txt cache.
///
/// The API is infallible on purpose: implementations log backend errors and
/// degrade to a miss rather than surfacing them.
#[async_trait]
pub trait RobotsCache: Send + Sync {
    /// Fetch the cached body for a URL's domain, if present and unexpired.
    async fn get(&self, url: &str) -> Option<String>;

    /// Store a body under the URL's domain key with the configured TTL.
    async fn put(&self, url: &str, body: &str);
}

/// SQLite-backed robots cache with explicit per-entry expiry.
#[derive(Clone, Debug)]
pub struct SqliteRobotsCache {
    db: Db,
    ttl: Duration,
}

impl SqliteRobotsCache {
    pub fn new(db: Db, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Delete expired entries, returning how many were removed.
    ///
    /// Expiry is already enforced at read time; this just keeps the table
    /// from growing without bound.
    pub async fn purge_expired(&self) -> Result<u64, crate::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<u64, rusqlite::Error> {
                let count = conn.execute("DELETE FROM robots_cache WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(crate::Error::from)
    }
}

#[async_trait]
impl RobotsCache for SqliteRobotsCache {
    async fn get(&self, url: &str) -> Option<String> {
        let key = domain::cache_key(url);
        let now = chrono::Utc::now().to_rfc3339();

        let lookup = {
            let key = key.clone();
            self.db
                .conn
                .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                    let result = conn.query_row(
                        "SELECT body FROM robots_cache WHERE key = ?1 AND expires_at > ?2",
                        params![key, now],
                        |row| row.get(0),
                    );
                    match result {
                        Ok(body) => Ok(Some(body)),
                        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                        Err(e) => Err(e),
                    }
                })
                .await
        };

        match lookup {
            Ok(Some(body)) => {
                tracing::debug!(key = %key, "robots cache hit");
                Some(body)
            }
            Ok(None) => {
                tracing::debug!(key = %key, "robots cache miss");
                None
            }
            Err(e) => {
                // backend failure is a miss, never an error
                tracing::warn!(key = %key, err = %e, "robots cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn put(&self, url: &str, body: &str) {
        let key = domain::cache_key(url);
        let body = body.to_string();
        let expires_at = (chrono::Utc::now() + self.ttl).to_rfc3339();

        let result = {
            let key = key.clone();
            self.db
                .conn
                .call(move |conn| -> Result<(), rusqlite::Error> {
                    conn.execute(
                        "INSERT OR REPLACE INTO robots_cache (key, body, expires_at) VALUES (?1, ?2, ?3)",
                        params![key, body, expires_at],
                    )?;
                    Ok(())
                })
                .await
        };

        match result {
            Ok(()) => tracing::debug!(key = %key, "robots file saved to cache"),
            Err(e) => tracing::warn!(key = %key, err = %e, "failed to save robots file to cache"),
        }
    }
}
