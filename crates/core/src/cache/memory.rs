//! TTL-bounded result cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::key::normalize_key;

/// Default lifetime of a cached candidate list.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached candidate list for one normalized query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub query_key: String,
    /// Query as first supplied, kept for diagnostics.
    pub original_query: String,
    /// Never empty.
    pub candidates: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry may still be served at `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now.signed_duration_since(self.created_at);
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => age < ttl,
            Err(_) => true,
        }
    }
}

/// In-memory cache from normalized query to candidate locations.
///
/// Cloning is cheap and clones share the same map, so the owner can keep a
/// handle while the orchestrator holds another. Reads never purge; an expired
/// entry simply reads as absent until a later `set` replaces it.
#[derive(Debug, Clone)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    /// Create an empty cache with the default 24 hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create an empty cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the candidates cached for `query`.
    ///
    /// Returns None if the key doesn't exist or the entry has expired.
    pub async fn get(&self, query: &str) -> Option<Vec<String>> {
        self.get_at(query, Utc::now()).await
    }

    pub(crate) async fn get_at(&self, query: &str, now: DateTime<Utc>) -> Option<Vec<String>> {
        let key = normalize_key(query);
        let entries = self.entries.read().await;

        match entries.get(&key) {
            Some(entry) if entry.is_fresh_at(now, self.ttl) => {
                tracing::info!(query, key = %key, count = entry.candidates.len(), "cache hit");
                Some(entry.candidates.clone())
            }
            Some(entry) => {
                tracing::info!(query, key = %key, cached_at = %entry.created_at, "cache miss (expired)");
                None
            }
            None => {
                tracing::info!(query, key = %key, "cache miss");
                None
            }
        }
    }

    /// Store `candidates` for `query`, replacing any previous entry for the same key.
    ///
    /// An empty list is refused and logged; the cache only ever holds lists
    /// that some provider actually produced.
    pub async fn set(&self, query: &str, candidates: Vec<String>) {
        self.set_at(query, candidates, Utc::now()).await
    }

    pub(crate) async fn set_at(&self, query: &str, candidates: Vec<String>, now: DateTime<Utc>) {
        if candidates.is_empty() {
            tracing::warn!(query, "refusing to cache an empty candidate list");
            return;
        }

        let key = normalize_key(query);
        let count = candidates.len();
        let entry =
            CacheEntry { query_key: key.clone(), original_query: query.to_string(), candidates, created_at: now };

        self.entries.write().await.insert(key.clone(), entry);
        tracing::info!(query, key = %key, count, "cache set");
    }

    /// Raw entry for `query`, expired or not.
    pub async fn entry(&self, query: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(&normalize_key(query)).cloned()
    }

    /// Number of stored entries, including expired ones not yet overwritten.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
