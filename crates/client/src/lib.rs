//! Outbound side of scrapegate.
//!
//! This crate provides the upstream robots.txt fetcher and the resolution
//! pipeline that decides whether a user-agent may fetch a URL.

pub mod fetch;
pub mod resolve;

pub use fetch::{Fetcher, HttpFetcher};
pub use resolve::{Resolver, evaluate};
