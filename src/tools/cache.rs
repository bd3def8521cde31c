//! Tool result cache
//!
//! TTL memoisation keyed on tool name plus a canonical form of the
//! arguments, so semantically identical calls hit the same entry regardless
//! of JSON key order or explicit nulls. Expiry is lazy (checked on lookup);
//! when the cache is full, the oldest entry by insertion time is evicted.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

struct CacheEntry {
    payload: Value,
    inserted_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.inserted_at);
        age.num_milliseconds() >= self.ttl.as_millis() as i64
    }
}

/// In-memory TTL cache for tool results
pub struct ToolCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl ToolCache {
    /// Creates a cache holding at most `max_entries` results
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Computes the cache key for a tool call
    ///
    /// Arguments are canonicalised before hashing: object keys are sorted
    /// and null values stripped, recursively.
    pub fn cache_key(tool: &str, args: &Value) -> String {
        let canonical = canonicalize(args);
        let mut hasher = Sha256::new();
        hasher.update(tool.as_bytes());
        hasher.update(b":");
        hasher.update(canonical.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Returns a cached payload if present and unexpired
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let now = Utc::now();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.payload.clone()),
            None => None,
        }
    }

    /// Stores a payload under `key` with the given TTL
    ///
    /// Evicts the oldest entry when the cache is at capacity.
    pub fn put(&self, key: String, payload: Value, ttl: Duration) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let now = Utc::now();

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest_key) = oldest {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                payload,
                inserted_at: now,
                ttl,
            },
        );
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sorts object keys and strips nulls, recursively
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            // BTreeMap iteration gives sorted keys
            let sorted: std::collections::BTreeMap<&String, &Value> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
