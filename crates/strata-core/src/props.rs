/* crates/strata-core/src/props.rs */

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use crate::conditions::evaluate_prop_condition;
use crate::content::ContentLoader;
use crate::context::{DeviceKind, RenderContext};

/// String prop values starting with this prefix are content references.
pub const CONTENT_PREFIX: &str = "content:";

/// Closed theme-suffix vocabulary for `<name>_<theme>` prop keys. The active
/// theme is always recognized even when it is not in this list.
pub const THEME_SUFFIXES: &[&str] = &["light", "dark", "contrast"];

/// Run the full pipeline in its fixed order: content substitution, then
/// conditional promotion, then responsive promotion, then theme promotion.
/// The order is a contract — later stages consume keys rewritten by earlier
/// ones (a `then:` value may itself be a content reference).
pub async fn transform_props(
  props: &Map<String, Value>,
  ctx: &RenderContext,
  content: &ContentLoader,
) -> Map<String, Value> {
  let mut refs = BTreeSet::new();
  for value in props.values() {
    collect_content_refs(value, &mut refs);
  }

  let mut resolved = HashMap::new();
  for key in refs {
    if let Some(text) = content.load(&key, Some(&ctx.locale)).await {
      resolved.insert(key, text);
    }
  }

  finish_pipeline(props, ctx, &resolved)
}

/// Synchronous variant for warm caches: content references resolve from the
/// cache only, falling back to their literal form on a cold key.
pub fn transform_props_cached(
  props: &Map<String, Value>,
  ctx: &RenderContext,
  content: &ContentLoader,
) -> Map<String, Value> {
  let mut refs = BTreeSet::new();
  for value in props.values() {
    collect_content_refs(value, &mut refs);
  }

  let mut resolved = HashMap::new();
  for key in refs {
    if let Some(text) = content.peek(&key, &ctx.locale) {
      resolved.insert(key, text);
    }
  }

  finish_pipeline(props, ctx, &resolved)
}

fn finish_pipeline(
  props: &Map<String, Value>,
  ctx: &RenderContext,
  resolved: &HashMap<String, String>,
) -> Map<String, Value> {
  let mut map = props.clone();
  for value in map.values_mut() {
    substitute_content(value, resolved);
  }
  apply_conditionals(&mut map, ctx);
  apply_responsive(&mut map, ctx);
  apply_theme(&mut map, ctx);
  map
}

/// Gather every content-reference key in a value tree, nested structures
/// included.
pub fn collect_content_refs(value: &Value, out: &mut BTreeSet<String>) {
  match value {
    Value::String(s) => {
      if let Some(key) = s.strip_prefix(CONTENT_PREFIX) {
        out.insert(key.to_string());
      }
    }
    Value::Array(items) => {
      for item in items {
        collect_content_refs(item, out);
      }
    }
    Value::Object(map) => {
      for item in map.values() {
        collect_content_refs(item, out);
      }
    }
    _ => {}
  }
}

/// Replace resolved content references in place. Unresolved references keep
/// their literal value.
pub fn substitute_content(value: &mut Value, resolved: &HashMap<String, String>) {
  match value {
    Value::String(s) => {
      if let Some(key) = s.strip_prefix(CONTENT_PREFIX) {
        if let Some(text) = resolved.get(key) {
          *value = Value::String(text.clone());
        }
      }
    }
    Value::Array(items) => {
      for item in items {
        substitute_content(item, resolved);
      }
    }
    Value::Object(map) => {
      for item in map.values_mut() {
        substitute_content(item, resolved);
      }
    }
    _ => {}
  }
}

/// `if:<cond>` / `then:<cond>` pairs: when the condition holds, the paired
/// `then:` value is promoted to the bare `<cond>` key. Both special keys are
/// removed whether or not the condition held.
pub fn apply_conditionals(props: &mut Map<String, Value>, ctx: &RenderContext) {
  let conditions: Vec<String> = props
    .keys()
    .filter_map(|key| key.strip_prefix("if:").map(ToString::to_string))
    .collect();

  for condition in conditions {
    let then_key = format!("then:{condition}");
    let then_value = props.get(&then_key).cloned();
    if evaluate_prop_condition(&condition, ctx) {
      if let Some(value) = then_value {
        props.insert(condition.clone(), value);
      }
    }
    props.remove(&format!("if:{condition}"));
    props.remove(&then_key);
  }
}

/// `<name>:<device>` keys: the variant matching the context's device kind is
/// promoted to `<name>`; every device-suffixed variant is removed.
pub fn apply_responsive(props: &mut Map<String, Value>, ctx: &RenderContext) {
  let device = ctx.device_kind();
  let mut promotions: Vec<(String, Value)> = Vec::new();
  let mut removals: Vec<String> = Vec::new();

  for (key, value) in props.iter() {
    let Some((base, suffix)) = key.split_once(':') else {
      continue;
    };
    let Some(kind) = DeviceKind::parse(suffix) else {
      continue;
    };
    removals.push(key.clone());
    if kind == device {
      promotions.push((base.to_string(), value.clone()));
    }
  }

  for key in removals {
    props.remove(&key);
  }
  for (base, value) in promotions {
    props.insert(base, value);
  }
}

/// `<name>_<theme>` keys against the closed theme vocabulary: the active
/// theme's variant is promoted to `<name>`; recognized theme variants are
/// removed.
pub fn apply_theme(props: &mut Map<String, Value>, ctx: &RenderContext) {
  let mut recognized: Vec<&str> = THEME_SUFFIXES.to_vec();
  if !recognized.contains(&ctx.theme.as_str()) {
    recognized.push(ctx.theme.as_str());
  }

  let mut promotions: Vec<(String, Value)> = Vec::new();
  let mut removals: Vec<String> = Vec::new();

  for (key, value) in props.iter() {
    for theme in &recognized {
      let Some(base) = key.strip_suffix(&format!("_{theme}")) else {
        continue;
      };
      if base.is_empty() {
        continue;
      }
      removals.push(key.clone());
      if *theme == ctx.theme {
        promotions.push((base.to_string(), value.clone()));
      }
      break;
    }
  }

  for key in removals {
    props.remove(&key);
  }
  for (base, value) in promotions {
    props.insert(base, value);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crate::content::{ContentValue, StaticContentSource};
  use crate::context::DeviceInfo;

  use super::*;

  fn props(raw: Value) -> Map<String, Value> {
    match raw {
      Value::Object(map) => map,
      other => panic!("expected object, got {other:?}"),
    }
  }

  fn loader_with(entries: &[(&str, &str, &str)]) -> ContentLoader {
    let source = StaticContentSource::new("test");
    for (locale, key, value) in entries {
      source.set(*locale, *key, ContentValue::Text((*value).to_string()));
    }
    ContentLoader::new("en").source(Arc::new(source))
  }

  #[tokio::test]
  async fn content_substitution_is_recursive() {
    let loader = loader_with(&[("en", "hero.title", "We fix Macs")]);
    let ctx = RenderContext::new("en");
    let input = props(serde_json::json!({
      "title": "content:hero.title",
      "nested": {"items": ["content:hero.title", "plain"]},
      "missing": "content:ghost",
    }));

    let out = transform_props(&input, &ctx, &loader).await;
    assert_eq!(out["title"], "We fix Macs");
    assert_eq!(out["nested"]["items"][0], "We fix Macs");
    assert_eq!(out["nested"]["items"][1], "plain");
    // Miss keeps the literal value.
    assert_eq!(out["missing"], "content:ghost");
  }

  #[tokio::test]
  async fn conditional_promotes_on_feature() {
    let loader = loader_with(&[]);
    let mut ctx = RenderContext::new("en");
    ctx.features.insert("promo-banner".to_string());

    let input = props(serde_json::json!({
      "if:promo-banner": true,
      "then:promo-banner": "Summer sale",
      "if:authenticated": true,
      "then:authenticated": "Welcome back",
    }));

    let out = transform_props(&input, &ctx, &loader).await;
    assert_eq!(out["promo-banner"], "Summer sale");
    assert!(!out.contains_key("authenticated"));
    assert!(out.keys().all(|k| !k.starts_with("if:") && !k.starts_with("then:")));
  }

  #[tokio::test]
  async fn responsive_promotes_matching_device() {
    let loader = loader_with(&[]);
    let mut ctx = RenderContext::new("en");
    ctx.device = DeviceInfo::of_kind(DeviceKind::Mobile);

    let input = props(serde_json::json!({
      "columns": 4,
      "columns:mobile": 1,
      "columns:tablet": 2,
      "spacing:desktop": "wide",
    }));

    let out = transform_props(&input, &ctx, &loader).await;
    assert_eq!(out["columns"], 1);
    assert!(!out.contains_key("columns:mobile"));
    assert!(!out.contains_key("columns:tablet"));
    assert!(!out.contains_key("spacing:desktop"));
    assert!(!out.contains_key("spacing"));
  }

  #[tokio::test]
  async fn theme_promotes_active_theme() {
    let loader = loader_with(&[]);
    let mut ctx = RenderContext::new("en");
    ctx.theme = "dark".to_string();

    let input = props(serde_json::json!({
      "background": "#fff",
      "background_dark": "#111",
      "background_light": "#fefefe",
      "social_image": "/og.png",
    }));

    let out = transform_props(&input, &ctx, &loader).await;
    assert_eq!(out["background"], "#111");
    assert!(!out.contains_key("background_dark"));
    assert!(!out.contains_key("background_light"));
    // Ordinary snake_case props are not theme variants.
    assert_eq!(out["social_image"], "/og.png");
  }

  #[tokio::test]
  async fn pipeline_is_idempotent_once_resolved() {
    let loader = loader_with(&[("en", "cta", "Book now")]);
    let mut ctx = RenderContext::new("en");
    ctx.device = DeviceInfo::of_kind(DeviceKind::Tablet);
    ctx.theme = "dark".to_string();

    let input = props(serde_json::json!({
      "cta": "content:cta",
      "columns:tablet": 2,
      "accent_dark": "#30d158",
      "if:preview": true,
      "then:preview": "draft",
    }));

    let once = transform_props(&input, &ctx, &loader).await;
    let twice = transform_props(&once, &ctx, &loader).await;
    assert_eq!(once, twice);
  }

  #[tokio::test]
  async fn stages_apply_in_fixed_order() {
    // The then: value is a content reference: stage (a) must run before (b)
    // for it to resolve.
    let loader = loader_with(&[("en", "banner.text", "Holiday hours")]);
    let mut ctx = RenderContext::new("en");
    ctx.features.insert("promo-banner".to_string());

    let input = props(serde_json::json!({
      "if:promo-banner": true,
      "then:promo-banner": "content:banner.text",
    }));

    let out = transform_props(&input, &ctx, &loader).await;
    assert_eq!(out["promo-banner"], "Holiday hours");
  }

  #[test]
  fn cached_variant_keeps_cold_refs_literal() {
    let loader = loader_with(&[("en", "cta", "Book now")]);
    let ctx = RenderContext::new("en");
    let input = props(serde_json::json!({"cta": "content:cta"}));

    let out = transform_props_cached(&input, &ctx, &loader);
    assert_eq!(out["cta"], "content:cta");
  }
}
