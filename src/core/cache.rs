//! Best-effort cache of the last observed store versions
//!
//! The cache can shortcut a provider's network round trip, nothing more.
//! Any absent, stale, or corrupt state is silently discarded and the file is
//! regenerated wholesale after the next successful Gathering. A checksum over
//! the store-config fingerprint and the entries guards against truncated
//! writes and against serving observations recorded for a different store
//! configuration.

use crate::core::report::VersionSource;
use crate::version::VersionTag;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
  pub version: VersionTag,
  pub fetched_at: DateTime<Utc>,
}

/// On-disk shape of `.shipver/cache.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservedCache {
  #[serde(default)]
  entries: BTreeMap<VersionSource, CacheEntry>,

  #[serde(default)]
  checksum: String,

  /// Store-config fingerprint the entries were recorded under; folded into
  /// the checksum, never written out on its own.
  #[serde(skip)]
  fingerprint: String,
}

impl ObservedCache {
  /// Empty cache bound to a store-config fingerprint
  pub fn keyed(fingerprint: impl Into<String>) -> Self {
    Self {
      fingerprint: fingerprint.into(),
      ..Self::default()
    }
  }

  /// Load the cache, returning an empty one on any problem. Entries
  /// recorded under a different store configuration read as stale.
  pub fn load(path: &Path, fingerprint: &str) -> Self {
    let Ok(raw) = fs::read_to_string(path) else {
      return Self::keyed(fingerprint);
    };
    let Ok(mut cache) = serde_json::from_str::<Self>(&raw) else {
      return Self::keyed(fingerprint);
    };
    if cache.checksum != Self::checksum_of(fingerprint, &cache.entries) {
      return Self::keyed(fingerprint);
    }
    cache.fingerprint = fingerprint.to_string();
    cache
  }

  /// A cached version that is still inside the TTL window.
  /// Entries stamped in the future count as stale (clock moved backwards).
  pub fn fresh(&self, source: VersionSource, ttl_secs: u64) -> Option<VersionTag> {
    let entry = self.entries.get(&source)?;
    let age = Utc::now().signed_duration_since(entry.fetched_at);
    if age < Duration::zero() || age > Duration::seconds(ttl_secs as i64) {
      return None;
    }
    Some(entry.version)
  }

  pub fn record(&mut self, source: VersionSource, version: VersionTag) {
    self.entries.insert(
      source,
      CacheEntry {
        version,
        fetched_at: Utc::now(),
      },
    );
  }

  /// Persist to disk; failures are swallowed because the cache is advisory
  pub fn store(&mut self, path: &Path) {
    self.checksum = Self::checksum_of(&self.fingerprint, &self.entries);
    let Ok(json) = serde_json::to_string_pretty(self) else {
      return;
    };
    if let Some(parent) = path.parent() {
      let _ = fs::create_dir_all(parent);
    }
    let _ = fs::write(path, json);
  }

  fn checksum_of(fingerprint: &str, entries: &BTreeMap<VersionSource, CacheEntry>) -> String {
    let json = serde_json::to_vec(entries).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hasher.update(b"\n");
    hasher.update(&json);
    format!("{:x}", hasher.finalize())
  }
}
