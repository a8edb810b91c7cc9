/* crates/strata-core/src/routes.rs */

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::errors::StrataError;

/// Route table, typically loaded from `routes.json`: a static path map, an
/// ordered dynamic pattern list, and a redirect map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteTable {
  #[serde(default)]
  pub routes: BTreeMap<String, String>,
  #[serde(default)]
  pub patterns: Vec<RoutePattern>,
  #[serde(default)]
  pub redirects: BTreeMap<String, String>,
}

/// `[name]` segments bind a parameter; a `*` segment binds the remaining
/// path as `catch_all` and stops comparison.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutePattern {
  pub pattern: String,
  pub config: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteResolution {
  Page { config_path: String, params: HashMap<String, String> },
  Redirect { to: String },
  NotFound,
}

struct CachedResolution {
  resolution: RouteResolution,
  expires: Instant,
}

/// Maps incoming paths to page configurations with a TTL resolution cache.
pub struct RouteResolver {
  table: RouteTable,
  cache: RwLock<HashMap<String, CachedResolution>>,
  ttl: Duration,
}

impl RouteResolver {
  pub fn new(table: RouteTable) -> Self {
    Self { table, cache: RwLock::new(HashMap::new()), ttl: Duration::from_secs(60) }
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StrataError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
      .map_err(|err| StrataError::config(format!("reading {}: {err}", path.display())))?;
    let table: RouteTable = serde_json::from_str(&raw)
      .map_err(|err| StrataError::config(format!("parsing {}: {err}", path.display())))?;
    Ok(Self::new(table))
  }

  pub fn ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Matching order: exact static route, then dynamic patterns in
  /// registration order, then the redirect table, then not-found. When two
  /// dynamic patterns are equally specific the first registered wins; that
  /// is a documented choice, not an accident.
  pub fn resolve(&self, path: &str) -> RouteResolution {
    let normalized = normalize_path(path);
    if let Some(hit) = self.cached(&normalized) {
      return hit;
    }

    let resolution = self.resolve_uncached(&normalized);
    self.store(&normalized, &resolution);
    resolution
  }

  /// Routes with no dynamic or wildcard segments, for pre-generation.
  pub fn static_paths(&self) -> Vec<String> {
    self
      .table
      .routes
      .keys()
      .filter(|path| !path.contains('[') && !path.contains('*'))
      .cloned()
      .collect()
  }

  pub fn is_valid_path(&self, path: &str) -> bool {
    !matches!(self.resolve(path), RouteResolution::NotFound)
  }

  fn resolve_uncached(&self, normalized: &str) -> RouteResolution {
    if let Some(config_path) = self.table.routes.get(normalized) {
      return RouteResolution::Page { config_path: config_path.clone(), params: HashMap::new() };
    }

    for pattern in &self.table.patterns {
      if let Some(params) = match_pattern(&pattern.pattern, normalized) {
        return RouteResolution::Page { config_path: pattern.config.clone(), params };
      }
    }

    if let Some(to) = self.table.redirects.get(normalized) {
      return RouteResolution::Redirect { to: to.clone() };
    }

    RouteResolution::NotFound
  }

  fn cached(&self, normalized: &str) -> Option<RouteResolution> {
    let mut cache = self.cache.write().expect("route cache lock poisoned");
    match cache.get(normalized) {
      Some(entry) if entry.expires > Instant::now() => Some(entry.resolution.clone()),
      Some(_) => {
        cache.remove(normalized);
        None
      }
      None => None,
    }
  }

  fn store(&self, normalized: &str, resolution: &RouteResolution) {
    self.cache.write().expect("route cache lock poisoned").insert(
      normalized.to_string(),
      CachedResolution { resolution: resolution.clone(), expires: Instant::now() + self.ttl },
    );
  }
}

/// Strip surrounding slashes; the empty path is the index page.
pub fn normalize_path(path: &str) -> String {
  let trimmed = path.trim().trim_matches('/');
  if trimmed.is_empty() { "index".to_string() } else { trimmed.to_string() }
}

fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
  let pattern_segments: Vec<&str> = pattern.split('/').collect();
  let path_segments: Vec<&str> = path.split('/').collect();

  let has_wildcard = pattern_segments.contains(&"*");
  if !has_wildcard && pattern_segments.len() != path_segments.len() {
    return None;
  }

  let mut params = HashMap::new();
  for (index, segment) in pattern_segments.iter().enumerate() {
    if *segment == "*" {
      if index > path_segments.len() {
        return None;
      }
      params.insert("catch_all".to_string(), path_segments[index..].join("/"));
      return Some(params);
    }

    let Some(path_segment) = path_segments.get(index) else {
      return None;
    };

    if let Some(name) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
      params.insert(name.to_string(), (*path_segment).to_string());
    } else if segment != path_segment {
      return None;
    }
  }

  Some(params)
}
