//! Override rule CRUD operations.
//!
//! A rule binds a domain to an operator-authored robots.txt document that
//! takes precedence over whatever the site publishes. Domain and id are
//! each unique; a domain has at most one rule at a time.

use crate::{Db, Error, domain};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// An operator-authored override ruleset for one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub domain: String,
    pub robots_txt: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Capability seam over rule persistence.
///
/// The resolution pipeline and the administration handlers only see this
/// trait, which keeps the backend swappable and lets tests substitute
/// deterministic doubles.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Look up the rule for a URL's domain. The URL is normalized first;
    /// lookup is exact-match on the bare hostname.
    async fn get_by_url(&self, url: &str) -> Result<Rule, Error>;

    /// Look up a rule by its numeric id.
    async fn get_by_id(&self, id: i64) -> Result<Rule, Error>;

    /// Insert a new rule, returning its id. Fails with `Conflict` if the
    /// domain already has one.
    async fn create(&self, domain: &str, robots_txt: &str) -> Result<i64, Error>;

    /// Overwrite domain and text of an existing rule. All-or-nothing: fails
    /// with `NotFound` if the id does not exist, and the returned rule is
    /// re-read from the store so its timestamps are authoritative.
    async fn update(&self, id: i64, domain: &str, robots_txt: &str) -> Result<Rule, Error>;

    /// Delete a rule by id. Idempotent: deleting a missing id succeeds.
    async fn delete(&self, id: i64) -> Result<(), Error>;
}

/// SQLite-backed rule store.
///
/// Create-path mutual exclusion comes from the UNIQUE constraint on
/// `rules.domain` plus the connection's single statement thread: two racing
/// creates for one domain cannot both succeed, the loser gets `Conflict`.
#[derive(Clone, Debug)]
pub struct SqliteRuleStore {
    db: Db,
}

impl SqliteRuleStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

const RULE_COLUMNS: &str = "id, domain, robots_txt, created_at, updated_at";

fn row_to_rule(row: &rusqlite::Row<'_>) -> Result<Rule, rusqlite::Error> {
    Ok(Rule {
        id: row.get(0)?,
        domain: row.get(1)?,
        robots_txt: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation)
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn get_by_url(&self, url: &str) -> Result<Rule, Error> {
        let domain = domain::host_of(url)?;
        self.db
            .conn
            .call(move |conn| -> Result<Rule, Error> {
                let result = conn.query_row(
                    &format!("SELECT {RULE_COLUMNS} FROM rules WHERE domain = ?1"),
                    params![domain],
                    row_to_rule,
                );
                match result {
                    Ok(rule) => Ok(rule),
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        Err(Error::NotFound(format!("rule with domain '{domain}' not found")))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn get_by_id(&self, id: i64) -> Result<Rule, Error> {
        self.db
            .conn
            .call(move |conn| -> Result<Rule, Error> {
                let result = conn.query_row(
                    &format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = ?1"),
                    params![id],
                    row_to_rule,
                );
                match result {
                    Ok(rule) => Ok(rule),
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        Err(Error::NotFound(format!("rule with id '{id}' not found")))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn create(&self, domain: &str, robots_txt: &str) -> Result<i64, Error> {
        let domain = domain.to_string();
        let robots_txt = robots_txt.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<i64, Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let result = conn.execute(
                    "INSERT INTO rules (domain, robots_txt, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)",
                    params![domain, robots_txt, now],
                );
                match result {
                    Ok(_) => Ok(conn.last_insert_rowid()),
                    Err(e) if is_unique_violation(&e) => Err(Error::Conflict(domain.clone())),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn update(&self, id: i64, domain: &str, robots_txt: &str) -> Result<Rule, Error> {
        let domain = domain.to_string();
        let robots_txt = robots_txt.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Rule, Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let result = conn.execute(
                    "UPDATE rules SET domain = ?2, robots_txt = ?3, updated_at = ?4 WHERE id = ?1",
                    params![id, domain, robots_txt, now],
                );
                let affected = match result {
                    Ok(n) => n,
                    Err(e) if is_unique_violation(&e) => return Err(Error::Conflict(domain.clone())),
                    Err(e) => return Err(e.into()),
                };
                if affected == 0 {
                    return Err(Error::NotFound(format!("rule with id '{id}' not found")));
                }

                // re-read so the returned timestamps are what was persisted
                conn.query_row(
                    &format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = ?1"),
                    params![id],
                    row_to_rule,
                )
                .map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM rules WHERE id = ?1", params![id])
                    .map_err(Error::from)?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        tracing::debug!(id, "rule deleted");
        Ok(())
    }
}
