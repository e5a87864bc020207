#![deny(missing_docs)]
//! Memoization of capability execution results.
//!
//! [`ExecutionCache`] maps a [`CacheKey`] to the raw result payload of an
//! earlier call. Entries never expire; they go away on [`clear`] or with
//! the process. Whether to consult or populate the cache is the caller's
//! decision.
//!
//! A key is the first 64 bits of a SHA-256 over a canonical JSON document
//! built from the capability name, the optional announcement id, the call
//! params, the provider key and the server id. Object keys are sorted
//! recursively before hashing, so argument order never changes the key.
//!
//! [`clear`]: ExecutionCache::clear

use relaycap_protocol::{CapabilityCall, Target};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Deterministic cache key, 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for `call` sent to `target`.
    pub fn derive(call: &CapabilityCall, target: &Target) -> Self {
        Self::derive_with_id(call, None, target)
    }

    /// Key for `call` sent to `target`, also distinguished by the
    /// capability's announcement id when the caller knows it.
    pub fn derive_with_id(
        call: &CapabilityCall,
        capability_id: Option<&str>,
        target: &Target,
    ) -> Self {
        let material = serde_json::json!({
            "name": call.capability_name(),
            "id": capability_id.unwrap_or(""),
            "params": call.params(),
            "provider": target.provider.as_str(),
            "server": target.server_id.as_deref().unwrap_or(""),
        });
        let canonical = canonicalize(&material).to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(&digest[..8]))
    }

    /// The hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuild `value` with every object's keys inserted in sorted order.
///
/// Output is identical whether or not serde_json's `preserve_order`
/// feature is enabled somewhere in the build.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Result memo keyed by [`CacheKey`].
pub struct ExecutionCache {
    entries: RwLock<HashMap<CacheKey, Value>>,
}

impl ExecutionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached result for `call` at `target`.
    pub async fn lookup(&self, call: &CapabilityCall, target: &Target) -> Option<Value> {
        self.get(&CacheKey::derive(call, target)).await
    }

    /// Remember `result` for `call` at `target`.
    pub async fn store(&self, call: &CapabilityCall, target: &Target, result: Value) {
        self.insert(CacheKey::derive(call, target), result).await;
    }

    /// Cached result under an explicit key.
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let hit = self.entries.read().await.get(key).cloned();
        tracing::debug!(key = %key, hit = hit.is_some(), "execution cache lookup");
        hit
    }

    /// Store under an explicit key, replacing any previous entry.
    pub async fn insert(&self, key: CacheKey, result: Value) {
        tracing::debug!(key = %key, "execution cache store");
        self.entries.write().await.insert(key, result);
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds nothing.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for ExecutionCache {
    fn default() -> Self {
        Self::new()
    }
}
