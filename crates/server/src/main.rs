//! scrapegate: a robots.txt permission service.
//!
//! Answers "may user-agent U fetch URL X?" from operator-defined override
//! rules, falling back to the target site's live robots.txt with a local
//! cache in front of it.

use anyhow::Result;
use scrapegate_client::{HttpFetcher, Resolver};
use scrapegate_core::{AppConfig, Db, SqliteRobotsCache, SqliteRuleStore};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod auth;
mod error;
mod handlers;
mod routes;
mod state;

use state::AppState;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    tracing::info!(port = config.port, db = %config.db_path.display(), "starting scrapegate");

    let db = Db::open(&config.db_path).await?;
    let store = Arc::new(SqliteRuleStore::new(db.clone()));
    let cache = Arc::new(SqliteRobotsCache::new(db.clone(), config.robots_ttl()));
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent, config.timeout())?);
    let resolver = Resolver::new(store.clone(), cache.clone(), fetcher);

    tokio::spawn(purge_loop(cache));

    let app = routes::router(AppState { db, store, resolver }, config.max_body_mb);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Periodically sweep expired rows out of the robots cache table. Lookups
/// already ignore stale entries, this just keeps the table from growing.
async fn purge_loop(cache: Arc<SqliteRobotsCache>) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match cache.purge_expired().await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(purged = n, "removed expired robots.txt cache entries"),
            Err(e) => tracing::warn!(err = %e, "robots.txt cache purge failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(err = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received, draining connections");
}
