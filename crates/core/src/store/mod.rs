//! Persistent storage for override rules and API keys.

pub mod api_keys;
pub mod rules;

pub use rules::{Rule, RuleStore, SqliteRuleStore};
