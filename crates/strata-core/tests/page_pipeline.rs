/* crates/strata-core/tests/page_pipeline.rs */

use std::path::Path;
use std::sync::Arc;

use strata_core::{
  ContentValue, Engine, RenderContext, RenderNode, RoutePattern, RouteResolution, RouteTable,
  StaticContentSource, basic_component,
};

fn write_config(dir: &Path, logical: &str, body: serde_json::Value) {
  let file = dir.join(format!("{logical}.json"));
  if let Some(parent) = file.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(file, serde_json::to_string(&body).unwrap()).unwrap();
}

fn engine(dir: &Path) -> Engine {
  let _ = env_logger::builder().is_test(true).try_init();

  let content = StaticContentSource::new("copy");
  content.set("en", "pricing.heading", ContentValue::Text("Repair pricing".into()));
  content.set("fr", "pricing.heading", ContentValue::Text("Tarifs de réparation".into()));

  Engine::builder(dir)
    .routes(RouteTable {
      routes: [("pricing".to_string(), "pricing".to_string())].into_iter().collect(),
      patterns: vec![RoutePattern {
        pattern: "pricing/[device]".into(),
        config: "pricing".into(),
      }],
      redirects: Default::default(),
    })
    .locales(vec!["en".to_string(), "fr".to_string()], "en")
    .component("HeroBanner", basic_component("HeroBanner"))
    .component("PricingTable", basic_component("PricingTable"))
    .component("ContactForm", basic_component("ContactForm"))
    .content_source(Arc::new(content))
    .build()
}

fn pricing_config() -> serde_json::Value {
  serde_json::json!({
    "meta": {"title": "Repair Pricing", "description": "Transparent pricing for every repair"},
    "layout": "default",
    "sections": [
      {"id": "hero", "component": "HeroBanner", "props": {"heading": "content:pricing.heading"}},
      {"id": "table", "component": "PricingTable"},
      {"id": "contact", "component": "ContactForm"},
    ],
  })
}

#[tokio::test]
async fn route_to_page_end_to_end() {
  let dir = tempfile::tempdir().unwrap();
  write_config(dir.path(), "pricing", pricing_config());
  let engine = engine(dir.path());

  let RouteResolution::Page { config_path, params } = engine.resolver.resolve("/pricing/") else {
    panic!("expected page resolution");
  };
  assert!(params.is_empty());

  let config = engine.loader.load(&config_path).unwrap().unwrap();
  let page = engine.factory.create_page(&config, &RenderContext::new("en")).await.unwrap();

  assert_eq!(page.sections.len(), config.sections.len());
  let ids: Vec<&str> = page.sections.iter().map(|s| s.id.as_str()).collect();
  assert_eq!(ids, vec!["hero", "table", "contact"]);
  assert_eq!(page.sections[0].props["heading"], "Repair pricing");
  assert!(page.sections.iter().all(|s| matches!(s.node, RenderNode::Element { .. })));
}

#[tokio::test]
async fn locale_flows_from_context_into_content() {
  let dir = tempfile::tempdir().unwrap();
  write_config(dir.path(), "pricing", pricing_config());
  let engine = engine(dir.path());

  let config = engine.loader.load("pricing").unwrap().unwrap();
  let page = engine.factory.create_page(&config, &RenderContext::new("fr")).await.unwrap();
  assert_eq!(page.sections[0].props["heading"], "Tarifs de réparation");
}

#[tokio::test]
async fn dynamic_route_params_reach_resolution() {
  let dir = tempfile::tempdir().unwrap();
  write_config(dir.path(), "pricing", pricing_config());
  let engine = engine(dir.path());

  let RouteResolution::Page { params, .. } = engine.resolver.resolve("pricing/macbook") else {
    panic!("expected page resolution");
  };
  assert_eq!(params.get("device").map(String::as_str), Some("macbook"));
}

#[tokio::test]
async fn preview_of_loaded_config_scores_clean() {
  let dir = tempfile::tempdir().unwrap();
  write_config(dir.path(), "pricing", pricing_config());
  let engine = engine(dir.path());

  let config = engine.loader.load("pricing").unwrap().unwrap();
  let preview = engine.previews.create_preview(&config, Default::default()).await.unwrap();
  assert!(preview.valid);
  let metadata = preview.metadata.unwrap();
  assert_eq!(metadata.performance.score, 100);
}

#[test]
fn static_paths_enumerable_for_pregeneration() {
  let dir = tempfile::tempdir().unwrap();
  write_config(dir.path(), "pricing", pricing_config());
  let engine = engine(dir.path());
  assert_eq!(engine.resolver.static_paths(), vec!["pricing".to_string()]);
}
