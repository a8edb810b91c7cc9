/* crates/strata-core/src/content.rs */

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::BoxFuture;
use crate::errors::StrataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
  Image,
  Video,
}

/// A locale-scoped content entry: plain text or a typed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
  Text(String),
  RichText {
    format: String,
    content: String,
  },
  Media {
    media_type: MediaKind,
    src: String,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    caption: Option<String>,
  },
}

impl ContentValue {
  /// Collapse a typed entry to the text the prop pipeline substitutes.
  /// Rich text passes its raw content through (format-specific sanitization
  /// belongs to the consuming component). Media reduces to its best textual
  /// stand-in.
  pub fn resolved_text(&self) -> String {
    match self {
      Self::Text(text) => text.clone(),
      Self::RichText { content, .. } => content.clone(),
      Self::Media { media_type: MediaKind::Image, src, alt, caption } => {
        alt.clone().or_else(|| caption.clone()).unwrap_or_else(|| src.clone())
      }
      Self::Media { media_type: MediaKind::Video, src, caption, .. } => {
        caption.clone().unwrap_or_else(|| src.clone())
      }
    }
  }
}

/// Backing store for content: given `(key, locale)`, reports existence and
/// value in one call (`Ok(None)` means "does not have this key") or fails.
pub trait ContentSource: Send + Sync {
  fn name(&self) -> &str;
  fn get(&self, key: &str, locale: &str) -> BoxFuture<Result<Option<ContentValue>, StrataError>>;
  fn keys(&self, locale: &str) -> BoxFuture<Vec<String>>;
}

/// In-memory source, locale -> key -> value.
#[derive(Default)]
pub struct StaticContentSource {
  name: String,
  entries: RwLock<HashMap<String, HashMap<String, ContentValue>>>,
}

impl StaticContentSource {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), entries: RwLock::new(HashMap::new()) }
  }

  pub fn set(&self, locale: impl Into<String>, key: impl Into<String>, value: ContentValue) {
    let mut entries = self.entries.write().expect("content source lock poisoned");
    entries.entry(locale.into()).or_default().insert(key.into(), value);
  }

  pub fn remove(&self, locale: &str, key: &str) {
    let mut entries = self.entries.write().expect("content source lock poisoned");
    if let Some(map) = entries.get_mut(locale) {
      map.remove(key);
    }
  }
}

impl ContentSource for StaticContentSource {
  fn name(&self) -> &str {
    &self.name
  }

  fn get(&self, key: &str, locale: &str) -> BoxFuture<Result<Option<ContentValue>, StrataError>> {
    let entries = self.entries.read().expect("content source lock poisoned");
    let value = entries.get(locale).and_then(|map| map.get(key)).cloned();
    Box::pin(async move { Ok(value) })
  }

  fn keys(&self, locale: &str) -> BoxFuture<Vec<String>> {
    let entries = self.entries.read().expect("content source lock poisoned");
    let keys = entries.get(locale).map(|map| map.keys().cloned().collect()).unwrap_or_default();
    Box::pin(async move { keys })
  }
}

struct CacheEntry {
  value: String,
  expires: Instant,
}

/// Locale-aware content resolution across prioritized sources, with a TTL
/// cache and a fallback-locale retry.
pub struct ContentLoader {
  sources: Vec<Arc<dyn ContentSource>>,
  cache: RwLock<HashMap<(String, String), CacheEntry>>,
  locale: RwLock<String>,
  fallback_locale: String,
  ttl: Duration,
}

impl ContentLoader {
  pub fn new(fallback_locale: impl Into<String>) -> Self {
    let fallback_locale = fallback_locale.into();
    Self {
      sources: Vec::new(),
      cache: RwLock::new(HashMap::new()),
      locale: RwLock::new(fallback_locale.clone()),
      fallback_locale,
      ttl: Duration::from_secs(300),
    }
  }

  /// Sources are consulted in registration order; the first that reports
  /// existence wins.
  pub fn source(mut self, source: Arc<dyn ContentSource>) -> Self {
    self.sources.push(source);
    self
  }

  pub fn ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn set_locale(&self, locale: impl Into<String>) {
    *self.locale.write().expect("locale lock poisoned") = locale.into();
  }

  pub fn locale(&self) -> String {
    self.locale.read().expect("locale lock poisoned").clone()
  }

  pub fn fallback_locale(&self) -> &str {
    &self.fallback_locale
  }

  /// Resolve one key: cache, then the source chain, then (for a non-fallback
  /// locale) the same walk against the fallback locale. A source error is
  /// logged and treated as a miss for that source only.
  pub async fn load(&self, key: &str, locale: Option<&str>) -> Option<String> {
    let requested = locale.map_or_else(|| self.locale(), ToString::to_string);
    let mut attempt = requested;

    loop {
      if let Some(hit) = self.cached(key, &attempt) {
        return Some(hit);
      }

      for source in &self.sources {
        match source.get(key, &attempt).await {
          Ok(Some(value)) => {
            let text = value.resolved_text();
            self.store(key, &attempt, &text);
            return Some(text);
          }
          Ok(None) => {}
          Err(err) => {
            log::warn!("content source {:?} failed for {key}/{attempt}: {err}", source.name());
          }
        }
      }

      if attempt == self.fallback_locale {
        return None;
      }
      attempt = self.fallback_locale.clone();
    }
  }

  /// All keys under `namespace.` (plus the bare namespace key itself).
  pub async fn load_namespace(
    &self,
    namespace: &str,
    locale: Option<&str>,
  ) -> BTreeMap<String, String> {
    let prefix = format!("{namespace}.");
    let keys = self.known_keys(locale).await;
    let mut out = BTreeMap::new();
    for key in keys {
      if key == namespace || key.starts_with(&prefix) {
        if let Some(value) = self.load(&key, locale).await {
          out.insert(key, value);
        }
      }
    }
    out
  }

  pub async fn load_all(&self, locale: Option<&str>) -> BTreeMap<String, String> {
    let keys = self.known_keys(locale).await;
    let mut out = BTreeMap::new();
    for key in keys {
      if let Some(value) = self.load(&key, locale).await {
        out.insert(key, value);
      }
    }
    out
  }

  pub async fn reload(&self, key: &str, locale: Option<&str>) -> Option<String> {
    let requested = locale.map_or_else(|| self.locale(), ToString::to_string);
    self.invalidate(key, Some(&requested));
    self.load(key, Some(&requested)).await
  }

  /// Warm the cache for a key list. Misses and source failures are tolerated;
  /// every key is attempted.
  pub async fn preload(&self, keys: &[String], locale: Option<&str>) {
    let loads = keys.iter().map(|key| self.load(key, locale));
    futures_util::future::join_all(loads).await;
  }

  /// Drop one `(key, locale)` entry, or every locale's entry for the key.
  pub fn invalidate(&self, key: &str, locale: Option<&str>) {
    let mut cache = self.cache.write().expect("content cache lock poisoned");
    match locale {
      Some(locale) => {
        cache.remove(&(key.to_string(), locale.to_string()));
      }
      None => cache.retain(|(k, _), _| k != key),
    }
  }

  /// Drop one locale's entries, or everything.
  pub fn clear(&self, locale: Option<&str>) {
    let mut cache = self.cache.write().expect("content cache lock poisoned");
    match locale {
      Some(locale) => cache.retain(|(_, l), _| l != locale),
      None => cache.clear(),
    }
  }

  /// Cached-only peek used by synchronous rendering. Never touches sources.
  pub fn peek(&self, key: &str, locale: &str) -> Option<String> {
    self.cached(key, locale).or_else(|| {
      if locale == self.fallback_locale { None } else { self.cached(key, &self.fallback_locale) }
    })
  }

  async fn known_keys(&self, locale: Option<&str>) -> Vec<String> {
    let requested = locale.map_or_else(|| self.locale(), ToString::to_string);
    let mut keys = BTreeSet::new();
    for source in &self.sources {
      for locale in [requested.as_str(), self.fallback_locale.as_str()] {
        keys.extend(source.keys(locale).await);
      }
    }
    keys.into_iter().collect()
  }

  fn cached(&self, key: &str, locale: &str) -> Option<String> {
    let cache_key = (key.to_string(), locale.to_string());
    let mut cache = self.cache.write().expect("content cache lock poisoned");
    match cache.get(&cache_key) {
      Some(entry) if entry.expires > Instant::now() => Some(entry.value.clone()),
      Some(_) => {
        // Expired entries are evicted lazily on read.
        cache.remove(&cache_key);
        None
      }
      None => None,
    }
  }

  fn store(&self, key: &str, locale: &str, value: &str) {
    let mut cache = self.cache.write().expect("content cache lock poisoned");
    cache.insert(
      (key.to_string(), locale.to_string()),
      CacheEntry { value: value.to_string(), expires: Instant::now() + self.ttl },
    );
  }
}
