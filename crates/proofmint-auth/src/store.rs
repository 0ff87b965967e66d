//! In-memory keyed token store.
//!
//! Token sets are kept per session key (the consent `state`, or a
//! grant-derived key) and per identity (`channel:<id>`), each with a TTL.
//! There is no process-wide slot, so concurrent users never see each
//! other's tokens.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use proofmint_core::{TokenSet, TokenStore};
use tokio::task::JoinHandle;

/// Token store statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct TokenStoreStats {
    /// Number of entries currently stored.
    pub size: usize,
    /// Number of lookups that found a live entry.
    pub hits: u64,
    /// Number of lookups that found nothing.
    pub misses: u64,
    /// Number of entries dropped because they expired.
    pub evictions: u64,
}

struct StoredTokens {
    tokens: TokenSet,
    expires_at: Instant,
}

/// DashMap-backed [`TokenStore`] with per-entry TTL.
pub struct MemoryTokenStore {
    entries: DashMap<String, StoredTokens>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn stats(&self) -> TokenStoreStats {
        TokenStoreStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            if entry.expires_at <= now {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }

        removed
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, key: &str, tokens: TokenSet) {
        self.entries.insert(
            key.to_string(),
            StoredTokens {
                tokens,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<TokenSet> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.tokens.clone());
            }
            drop(entry);
            self.entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn remove(&self, key: &str) -> Option<TokenSet> {
        self.entries.remove(key).map(|(_, entry)| entry.tokens)
    }

    fn purge_expired(&self) -> usize {
        self.cleanup_expired()
    }
}

/// Spawns a task that purges expired token-store entries every `interval`.
pub fn spawn_purge_task(store: Arc<dyn TokenStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Token store cleanup completed");
            }
        }
    })
}
