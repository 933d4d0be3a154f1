//! Resolution pipeline: override check, cache-aside fetch, evaluation.
//!
//! Strict order per request:
//!
//! 1. Validate `url` and `user_agent` are non-empty.
//! 2. Ask the rule store. A non-empty override ruleset is authoritative:
//!    the live file is never consulted, never even fetched.
//! 3. Otherwise resolve the live ruleset: cache first, upstream on a miss,
//!    write-back on a successful non-empty fetch. An empty or failed fetch
//!    fails the request; there is no default-allow.
//! 4. Evaluate the ruleset text against the user-agent and URL.
//!
//! The pipeline holds no mutable state; concurrent calls are independent.
//! Concurrent misses for one domain may each fetch upstream; that is
//! accepted, the fetch is an idempotent read.

use crate::fetch::Fetcher;
use robotstxt_rs::RobotsTxt;
use scrapegate_core::{Error, RobotsCache, RuleStore, domain};
use std::sync::Arc;

/// Evaluate robots-exclusion directive text for a user-agent and URL.
pub fn evaluate(robots_txt: &str, user_agent: &str, url: &str) -> bool {
    RobotsTxt::parse(robots_txt).can_fetch(user_agent, url)
}

/// The resolution pipeline.
///
/// Owns nothing but handles to its collaborators; construct once and share.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn RuleStore>,
    cache: Arc<dyn RobotsCache>,
    fetcher: Arc<dyn Fetcher>,
}

impl Resolver {
    pub fn new(store: Arc<dyn RuleStore>, cache: Arc<dyn RobotsCache>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { store, cache, fetcher }
    }

    /// Is `user_agent` allowed to fetch `url`?
    pub async fn is_allowed(&self, url: &str, user_agent: &str) -> Result<bool, Error> {
        if url.is_empty() {
            return Err(Error::MissingParameter("url"));
        }
        if user_agent.is_empty() {
            return Err(Error::MissingParameter("user_agent"));
        }

        let robots_txt = match self.store.get_by_url(url).await {
            Ok(rule) if !rule.robots_txt.is_empty() => {
                tracing::debug!(domain = %rule.domain, "override rule found, skipping live robots.txt");
                rule.robots_txt
            }
            Ok(rule) => {
                tracing::debug!(domain = %rule.domain, "override rule is empty, using live robots.txt");
                self.live_ruleset(url).await?
            }
            Err(Error::NotFound(_)) => self.live_ruleset(url).await?,
            Err(e @ Error::InvalidUrl(_)) => return Err(e),
            Err(e) => {
                // a broken store must not take the check down with it
                tracing::warn!(err = %e, "rule lookup failed, falling back to live robots.txt");
                self.live_ruleset(url).await?
            }
        };

        Ok(evaluate(&robots_txt, user_agent, url))
    }

    /// Cache-aside load of the site's own robots.txt.
    async fn live_ruleset(&self, url: &str) -> Result<String, Error> {
        if let Some(body) = self.cache.get(url).await {
            return Ok(body);
        }

        let origin = domain::origin_of(url)?;
        let bytes = self.fetcher.fetch(&origin).await?;
        if bytes.is_empty() {
            return Err(Error::UpstreamUnavailable(format!("empty response from {origin}")));
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        self.cache.put(url, &body).await;

        Ok(body)
    }
}
