//! API-key lookups for the administration routes.
//!
//! Keys are provisioned out of band (ops insert rows directly or via
//! [`insert`]); the server only ever reads. Only the SHA-256 hex digest of
//! a key is stored.

use crate::{Db, Error};
use sha2::{Digest, Sha256};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Hex-encoded SHA-256 digest of an API key, as stored in the database.
pub fn digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Look up a key digest. Returns `None` when the key is unknown, otherwise
/// whether it is active.
pub async fn status(db: &Db, key_digest: &str) -> Result<Option<bool>, Error> {
    let key_digest = key_digest.to_string();
    db.conn
        .call(move |conn| -> Result<Option<bool>, Error> {
            let result = conn.query_row(
                "SELECT is_active FROM api_keys WHERE key_digest = ?1",
                params![key_digest],
                |row| row.get::<_, i64>(0),
            );
            match result {
                Ok(active) => Ok(Some(active != 0)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(Error::from)
}

/// Insert (or reactivate) a key digest. Provisioning utility, also used by
/// server tests.
pub async fn insert(db: &Db, key_digest: &str, label: Option<&str>, is_active: bool) -> Result<(), Error> {
    let key_digest = key_digest.to_string();
    let label = label.map(str::to_string);
    db.conn
        .call(move |conn| -> Result<(), Error> {
            conn.execute(
                "INSERT INTO api_keys (key_digest, label, is_active) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key_digest) DO UPDATE SET label = excluded.label, is_active = excluded.is_active",
                params![key_digest, label, is_active as i64],
            )
            .map_err(Error::from)?;
            Ok(())
        })
        .await
        .map_err(Error::from)
}
