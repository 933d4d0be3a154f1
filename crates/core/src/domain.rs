//! Domain normalization and cache-key derivation.
//!
//! Every lookup key in the system comes through here: the rule store is
//! keyed by the bare hostname, the robots cache by a hash of it, and the
//! upstream fetcher targets the `scheme://host[:port]` origin. Collapsing
//! path/query variation up front means one entry per site everywhere.

use crate::Error;
use sha2::{Digest, Sha256};
use url::Url;

/// Extract the bare hostname from a URL string.
///
/// Fails with `InvalidUrl` if the input has no scheme or no hostname.
pub fn host_of(url: &str) -> Result<String, Error> {
    let parsed = parse(url)?;
    // parse() already rejected host-less URLs
    Ok(parsed.host_str().unwrap_or_default().to_string())
}

/// Extract the `scheme://host[:port]` origin from a URL string.
///
/// The origin is what the upstream fetcher prepends to `/robots.txt`.
/// The port is kept only when it is explicit and non-default.
pub fn origin_of(url: &str) -> Result<String, Error> {
    let parsed = parse(url)?;
    let host = parsed.host_str().unwrap_or_default();
    match parsed.port() {
        Some(port) => Ok(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Ok(format!("{}://{}", parsed.scheme(), host)),
    }
}

/// Compute the robots cache key for a URL.
///
/// Two-branch derivation: hash of the normalized host when the URL parses,
/// hash of the raw string otherwise. The fallback is a deliberate degraded
/// mode: an unparseable URL still gets a stable (if per-URL) cache slot
/// rather than failing the lookup.
pub fn cache_key(url: &str) -> String {
    match host_of(url) {
        Ok(host) => format!("{}-robots-txt", sha256_hex(&host)),
        Err(e) => {
            tracing::warn!(url, err = %e, "failed to parse url, using full url as cache key");
            format!("{}-robots-txt", sha256_hex(url))
        }
    }
}

fn parse(url: &str) -> Result<Url, Error> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty url".to_string()));
    }

    let parsed = Url::parse(trimmed).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    if parsed.host_str().unwrap_or_default().is_empty() {
        return Err(Error::InvalidUrl(format!("no hostname in '{trimmed}'")));
    }

    Ok(parsed)
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
