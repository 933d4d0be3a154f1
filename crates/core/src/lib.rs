//! Core types and shared functionality for scrapegate.
//!
//! This crate provides:
//! - Domain normalization and cache-key derivation
//! - SQLite-backed rule store and robots.txt cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod store;

pub use tokio_rusqlite;

pub use cache::{RobotsCache, SqliteRobotsCache};
pub use config::AppConfig;
pub use db::Db;
pub use error::Error;
pub use store::{Rule, RuleStore, SqliteRuleStore};
