//! Project-wide constants.

use std::path::PathBuf;

/// Body served when a run produced nothing usable.
pub const FALLBACK_MESSAGE: &str = "No content found";

/// Delay between status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// How long a cached GET response stays fresh.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Headers consulted, in order, for the request's geo signal.
pub const GEO_HEADERS: &[&str] = &["cf-ipcountry", "x-vercel-ip-country", "x-country-code"];

/// Default cache database path: `~/.errand/cache.db`.
/// Falls back to the working directory when there is no home.
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".errand"))
        .unwrap_or_default()
        .join("cache.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        assert!(!FALLBACK_MESSAGE.trim().is_empty());
        assert!(DEFAULT_POLL_INTERVAL_MS > 0);
        assert!(DEFAULT_LISTEN_ADDR.parse::<std::net::SocketAddr>().is_ok());
    }

    #[test]
    fn default_cache_path_names_db() {
        assert!(default_cache_path().ends_with("cache.db"));
    }

    #[test]
    fn geo_headers_are_lowercase() {
        for name in GEO_HEADERS {
            assert_eq!(*name, name.to_ascii_lowercase());
        }
    }
}
