/* crates/strata-core/src/registry.rs */

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use strata_html::RenderNode;

use crate::context::RenderContext;
use crate::errors::StrataError;

/// A component implementation: props plus render context in, node tree out.
/// Visual internals live outside the engine; the registry only stores the
/// callable surface.
pub type ComponentFn =
  Arc<dyn Fn(&Map<String, Value>, &RenderContext) -> Result<RenderNode, StrataError> + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
  pub category: String,
  pub description: String,
  pub registered_at: DateTime<Utc>,
}

struct ComponentEntry {
  render: ComponentFn,
  info: ComponentInfo,
}

#[derive(Default)]
struct RegistryInner {
  components: HashMap<String, ComponentEntry>,
  aliases: HashMap<String, String>,
}

/// Name -> implementation lookup with aliasing and introspection.
#[derive(Default)]
pub struct ComponentRegistry {
  inner: RwLock<RegistryInner>,
}

impl ComponentRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registering over an existing name overwrites it. That is deliberate for
  /// hot-swapped implementations, but worth a trace in the log.
  pub fn register(&self, name: impl Into<String>, component: ComponentFn) {
    let name = name.into();
    let (category, description) = infer_category(&name);
    let entry = ComponentEntry {
      render: component,
      info: ComponentInfo { category, description, registered_at: Utc::now() },
    };
    let mut inner = self.inner.write().expect("registry lock poisoned");
    if inner.components.insert(name.clone(), entry).is_some() {
      log::warn!("component {name:?} re-registered, previous implementation replaced");
    }
  }

  pub fn register_batch(&self, components: Vec<(String, ComponentFn)>) {
    for (name, component) in components {
      self.register(name, component);
    }
  }

  /// Alias registration fails if the target is not registered yet.
  pub fn register_alias(
    &self,
    alias: impl Into<String>,
    target: impl Into<String>,
  ) -> Result<(), StrataError> {
    let alias = alias.into();
    let target = target.into();
    let mut inner = self.inner.write().expect("registry lock poisoned");
    if !inner.components.contains_key(&target) {
      return Err(StrataError::not_found(format!(
        "alias {alias:?} targets unregistered component {target:?}"
      )));
    }
    inner.aliases.insert(alias, target);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<ComponentFn> {
    let inner = self.inner.read().expect("registry lock poisoned");
    let resolved = inner.aliases.get(name).map_or(name, String::as_str);
    inner.components.get(resolved).map(|e| Arc::clone(&e.render))
  }

  pub fn has(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  pub fn unregister(&self, name: &str) -> bool {
    let mut inner = self.inner.write().expect("registry lock poisoned");
    inner.components.remove(name).is_some()
  }

  pub fn list(&self) -> Vec<String> {
    let inner = self.inner.read().expect("registry lock poisoned");
    let mut names: Vec<String> = inner.components.keys().cloned().collect();
    names.sort();
    names
  }

  pub fn info(&self, name: &str) -> Option<ComponentInfo> {
    let inner = self.inner.read().expect("registry lock poisoned");
    let resolved = inner.aliases.get(name).map_or(name, String::as_str);
    inner.components.get(resolved).map(|e| e.info.clone())
  }
}

/// Category vocabulary for introspection/tooling. Resolution never consults
/// this; a miscategorized component still renders.
const CATEGORY_MARKERS: &[(&str, &str)] = &[
  ("Section", "section"),
  ("Layout", "layout"),
  ("Form", "form"),
  ("Card", "card"),
  ("Nav", "navigation"),
];

fn infer_category(name: &str) -> (String, String) {
  let category = CATEGORY_MARKERS
    .iter()
    .find(|(marker, _)| name.contains(marker))
    .map_or("general", |(_, category)| *category);
  (category.to_string(), format!("{} ({category})", humanize(name)))
}

/// "HeroBanner" -> "Hero Banner".
fn humanize(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 4);
  for (i, ch) in name.chars().enumerate() {
    if ch.is_ascii_uppercase() && i > 0 {
      out.push(' ');
    }
    out.push(ch);
  }
  out
}

/// A pass-through component: emits an element node echoing its own name and
/// resolved props. Enough for pages whose real visuals live in the host app.
pub fn basic_component(name: impl Into<String>) -> ComponentFn {
  let name = name.into();
  Arc::new(move |props, _ctx| Ok(RenderNode::element(name.clone(), props.clone())))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn register_and_get() {
    let registry = ComponentRegistry::new();
    registry.register("HeroBanner", basic_component("HeroBanner"));
    assert!(registry.has("HeroBanner"));
    assert!(registry.get("HeroBanner").is_some());
    assert!(!registry.has("Missing"));
  }

  #[test]
  fn reregistration_overwrites() {
    let registry = ComponentRegistry::new();
    registry.register("Hero", basic_component("HeroV1"));
    registry.register("Hero", basic_component("HeroV2"));

    let component = registry.get("Hero").unwrap();
    let ctx = RenderContext::new("en");
    match component(&Map::new(), &ctx).unwrap() {
      RenderNode::Element { component, .. } => assert_eq!(component, "HeroV2"),
      other => panic!("unexpected node {other:?}"),
    }
  }

  #[test]
  fn alias_requires_registered_target() {
    let registry = ComponentRegistry::new();
    let err = registry.register_alias("Banner", "HeroBanner").unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    registry.register("HeroBanner", basic_component("HeroBanner"));
    registry.register_alias("Banner", "HeroBanner").unwrap();
    assert!(registry.has("Banner"));
    assert_eq!(registry.info("Banner").unwrap().category, "general");
  }

  #[test]
  fn unregister_removes() {
    let registry = ComponentRegistry::new();
    registry.register("ContactForm", basic_component("ContactForm"));
    assert!(registry.unregister("ContactForm"));
    assert!(!registry.unregister("ContactForm"));
    assert!(!registry.has("ContactForm"));
  }

  #[test]
  fn list_is_sorted() {
    let registry = ComponentRegistry::new();
    registry.register("PricingTable", basic_component("PricingTable"));
    registry.register("HeroBanner", basic_component("HeroBanner"));
    assert_eq!(registry.list(), vec!["HeroBanner".to_string(), "PricingTable".to_string()]);
  }

  #[test]
  fn category_inference_from_name() {
    let registry = ComponentRegistry::new();
    registry.register_batch(vec![
      ("ServicesSection".to_string(), basic_component("ServicesSection")),
      ("SiteNavBar".to_string(), basic_component("SiteNavBar")),
      ("ContactForm".to_string(), basic_component("ContactForm")),
      ("HeroBanner".to_string(), basic_component("HeroBanner")),
    ]);
    assert_eq!(registry.info("ServicesSection").unwrap().category, "section");
    assert_eq!(registry.info("SiteNavBar").unwrap().category, "navigation");
    assert_eq!(registry.info("ContactForm").unwrap().category, "form");
    assert_eq!(registry.info("HeroBanner").unwrap().category, "general");
  }

  #[test]
  fn humanize_splits_camel_case() {
    assert_eq!(humanize("PricingTable"), "Pricing Table");
    assert_eq!(humanize("Nav"), "Nav");
  }
}
