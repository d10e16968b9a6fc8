//! URL-keyed memo of rendered responses, consulted before a GET runs the
//! pipeline.

pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// A response as served, minus transport details.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub content_type: String,
    pub body: String,
}

/// Where rendered responses are kept. Could be SQLite, memory, etc.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// A fresh entry for `url`, if any. Expired entries are never returned.
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>>;
    /// Store (or replace) the entry for `url`, fresh for `ttl`.
    async fn put(&self, url: &str, response: &CachedResponse, ttl: Duration) -> Result<()>;
    /// Drop expired entries. Returns how many went.
    async fn purge_expired(&self) -> Result<usize>;
}

/// Cache key for a request URL: URL-safe base64 of its SHA-256.
pub fn cache_key(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(url.as_bytes()))
}
