use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// In-process read cache for per-actor views
///
/// Entries expire after the configured TTL. Writers invalidate the keys of
/// every actor whose view they change; there is no cross-process coherence.
pub struct CacheManager {
    entries: moka::future::Cache<String, Vec<u8>>,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let entries = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { entries }
    }

    /// Get a value from cache
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.entries.get(key).await {
            Some(bytes) => {
                tracing::trace!("Cache hit: {}", key);
                Ok(serde_json::from_slice(&bytes)?)
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Err(CacheError::CacheMiss(key.to_string()))
            }
        }
    }

    /// Set a value in cache
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.entries.insert(key.to_string(), bytes).await;

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    pub async fn delete(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    /// Drop the cached match listings of every given owner
    pub async fn invalidate_matches<'a, I>(&self, owner_ids: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for owner in owner_ids {
            self.delete(&CacheKey::matches(owner)).await;
        }
    }

    /// Get cache statistics
    ///
    /// Counts are approximate until moka has run its pending maintenance.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for an actor's match listing
    pub fn matches(actor_id: &str) -> String {
        format!("matches:{}", actor_id)
    }
}
