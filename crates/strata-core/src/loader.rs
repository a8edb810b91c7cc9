/* crates/strata-core/src/loader.rs */

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::errors::StrataError;
use crate::types::PageConfiguration;
use crate::validate::ConfigValidator;

/// Validated-config cache TTL: short in dev so edits show up nearly
/// immediately, longer otherwise to bound re-validation under load.
const DEV_TTL: Duration = Duration::from_secs(1);
const PROD_TTL: Duration = Duration::from_secs(60);

struct CachedConfig {
  config: Arc<PageConfiguration>,
  expires: Instant,
}

/// Loads page configurations from disk: one JSON document per logical page
/// path (`services/mac-repair` -> `<base>/services/mac-repair.json`).
/// Configs are validated on load and cached with a TTL.
pub struct ConfigLoader {
  base_dir: PathBuf,
  validator: Arc<ConfigValidator>,
  cache: Arc<RwLock<HashMap<String, CachedConfig>>>,
  ttl: Duration,
}

impl ConfigLoader {
  pub fn new(base_dir: impl Into<PathBuf>, validator: Arc<ConfigValidator>, dev_mode: bool) -> Self {
    Self {
      base_dir: base_dir.into(),
      validator,
      cache: Arc::new(RwLock::new(HashMap::new())),
      ttl: if dev_mode { DEV_TTL } else { PROD_TTL },
    }
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  /// Load one configuration. `Ok(None)` means no config exists for the
  /// path; an unreadable or invalid document is an error.
  pub fn load(&self, path: &str) -> Result<Option<Arc<PageConfiguration>>, StrataError> {
    if let Some(hit) = self.cached(path) {
      return Ok(Some(hit));
    }

    let file = self.config_file(path)?;
    let raw = match std::fs::read_to_string(&file) {
      Ok(raw) => raw,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(err) => return Err(StrataError::config(format!("reading {}: {err}", file.display()))),
    };

    let value: serde_json::Value = serde_json::from_str(&raw)
      .map_err(|err| StrataError::config(format!("parsing {}: {err}", file.display())))?;

    let result = self.validator.validate_raw(&value);
    let Some(config) = result.config else {
      let codes: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
      return Err(StrataError::validation(format!("config {path:?} invalid: {}", codes.join(", "))));
    };
    for warning in &result.warnings {
      log::debug!("config {path:?} warning {}: {}", warning.code, warning.message);
    }

    let config = Arc::new(config);
    self.store(path, &config);
    Ok(Some(config))
  }

  /// Load every config under the base directory. Individual failures are
  /// logged and skipped so one broken document cannot hide the rest.
  pub fn load_all(&self) -> BTreeMap<String, Arc<PageConfiguration>> {
    let mut paths = Vec::new();
    collect_json_paths(&self.base_dir, &self.base_dir, &mut paths);
    paths.sort();

    let mut out = BTreeMap::new();
    for path in paths {
      match self.load(&path) {
        Ok(Some(config)) => {
          out.insert(path, config);
        }
        Ok(None) => {}
        Err(err) => log::warn!("skipping config {path:?}: {err}"),
      }
    }
    out
  }

  pub fn reload(&self, path: &str) -> Result<Option<Arc<PageConfiguration>>, StrataError> {
    self.invalidate(path);
    self.load(path)
  }

  pub fn invalidate(&self, path: &str) {
    self.cache.write().expect("config cache lock poisoned").remove(path);
  }

  pub fn clear(&self) {
    self.cache.write().expect("config cache lock poisoned").clear();
  }

  /// Watch the base directory for config changes. A changed document is
  /// invalidated from the cache and reported to the callback by logical
  /// path. The returned handle keeps the watcher alive.
  pub fn watch(
    &self,
    callback: impl Fn(String) + Send + 'static,
  ) -> Result<ConfigWatcher, StrataError> {
    let base_dir = self.base_dir.clone();
    let cache = Arc::clone(&self.cache);

    let mut watcher = RecommendedWatcher::new(
      move |res: Result<notify::Event, notify::Error>| {
        let Ok(event) = res else {
          return;
        };
        for path in &event.paths {
          if let Some(logical) = logical_path(&base_dir, path) {
            cache.write().expect("config cache lock poisoned").remove(&logical);
            callback(logical);
          }
        }
      },
      notify::Config::default(),
    )
    .map_err(|err| StrataError::config(format!("starting config watcher: {err}")))?;

    watcher
      .watch(&self.base_dir, RecursiveMode::Recursive)
      .map_err(|err| StrataError::config(format!("watching {}: {err}", self.base_dir.display())))?;

    Ok(ConfigWatcher { _watcher: watcher })
  }

  fn config_file(&self, path: &str) -> Result<PathBuf, StrataError> {
    if path.is_empty() || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
      return Err(StrataError::config(format!("invalid config path {path:?}")));
    }
    Ok(self.base_dir.join(format!("{path}.json")))
  }

  fn cached(&self, path: &str) -> Option<Arc<PageConfiguration>> {
    let mut cache = self.cache.write().expect("config cache lock poisoned");
    match cache.get(path) {
      Some(entry) if entry.expires > Instant::now() => Some(Arc::clone(&entry.config)),
      Some(_) => {
        cache.remove(path);
        None
      }
      None => None,
    }
  }

  fn store(&self, path: &str, config: &Arc<PageConfiguration>) {
    self.cache.write().expect("config cache lock poisoned").insert(
      path.to_string(),
      CachedConfig { config: Arc::clone(config), expires: Instant::now() + self.ttl },
    );
  }
}

/// Keeps the filesystem watcher registered; drop to stop watching.
pub struct ConfigWatcher {
  _watcher: RecommendedWatcher,
}

/// `<base>/services/mac-repair.json` -> `services/mac-repair`.
fn logical_path(base_dir: &Path, fs_path: &Path) -> Option<String> {
  if fs_path.extension().and_then(|e| e.to_str()) != Some("json") {
    return None;
  }
  let rel = fs_path.strip_prefix(base_dir).ok()?;
  let rel = rel.with_extension("");
  let segments: Vec<String> =
    rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
  if segments.is_empty() {
    return None;
  }
  Some(segments.join("/"))
}

fn collect_json_paths(base_dir: &Path, dir: &Path, out: &mut Vec<String>) {
  let Ok(entries) = std::fs::read_dir(dir) else {
    return;
  };
  for entry in entries.flatten() {
    let path = entry.path();
    if path.is_dir() {
      collect_json_paths(base_dir, &path, out);
    } else if let Some(logical) = logical_path(base_dir, &path) {
      out.push(logical);
    }
  }
}
