//! Shared application state.
//!
//! Everything is constructed once in `main` and injected; handlers never
//! reach for globals.

use scrapegate_client::Resolver;
use scrapegate_core::{Db, RuleStore};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Raw database handle, used by the API-key guard.
    pub db: Db,
    /// Rule persistence, used by the administration handlers.
    pub store: Arc<dyn RuleStore>,
    /// The resolution pipeline behind scrape-allowed.
    pub resolver: Resolver,
}
