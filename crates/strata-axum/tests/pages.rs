/* crates/strata-axum/tests/pages.rs */

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use strata_axum::IntoAxumRouter;
use strata_core::{
  ContentValue, Engine, RoutePattern, RouteTable, StaticContentSource, basic_component,
};
use tower::util::ServiceExt;

fn write_config(dir: &Path, logical: &str, body: serde_json::Value) {
  let file = dir.join(format!("{logical}.json"));
  if let Some(parent) = file.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(file, serde_json::to_string_pretty(&body).unwrap()).unwrap();
}

fn test_engine(dir: &Path) -> Engine {
  write_config(
    dir,
    "index",
    serde_json::json!({
      "meta": {
        "title": "FixLab Device Repair",
        "description": "Same-day phone, tablet and laptop repair",
        "keywords": ["repair", "devices"],
      },
      "layout": "default",
      "sections": [
        {"id": "hero", "component": "HeroBanner", "props": {"title": "content:hero.title"}},
        {"id": "mystery", "component": "Nonexistent"},
      ],
    }),
  );
  write_config(
    dir,
    "account",
    serde_json::json!({
      "meta": {"title": "Your account", "description": "Repair history and invoices"},
      "layout": "default",
      "sections": [{"id": "orders", "component": "HeroBanner"}],
      "auth": {"required": true},
    }),
  );
  write_config(
    dir,
    "services/detail",
    serde_json::json!({
      "meta": {"title": "{slug} repair", "description": "Repair service for {slug} devices"},
      "layout": "default",
      "sections": [{"id": "info", "component": "HeroBanner"}],
    }),
  );

  let content = StaticContentSource::new("copy");
  content.set("en", "hero.title", ContentValue::Text("We fix it same day".into()));

  let routes = RouteTable {
    routes: [
      ("index".to_string(), "index".to_string()),
      ("account".to_string(), "account".to_string()),
    ]
    .into_iter()
    .collect(),
    patterns: vec![RoutePattern {
      pattern: "services/[slug]".into(),
      config: "services/detail".into(),
    }],
    redirects: [("repair".to_string(), "/services/mac".to_string())].into_iter().collect(),
  };

  Engine::builder(dir)
    .routes(routes)
    .base_url("https://fixlab.test")
    .site_name("FixLab")
    .component("HeroBanner", basic_component("HeroBanner"))
    .content_source(Arc::new(content))
    .build()
}

async fn get(router: axum::Router, path: &str) -> (StatusCode, axum::http::HeaderMap, String) {
  let response = router
    .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
    .await
    .unwrap();
  let status = response.status();
  let headers = response.headers().clone();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn serves_index_with_content_and_headers() {
  let dir = tempfile::tempdir().unwrap();
  let router = test_engine(dir.path()).into_axum_router();

  let (status, headers, body) = get(router, "/").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    headers.get(header::CACHE_CONTROL).unwrap(),
    "public, max-age=3600, s-maxage=7200"
  );
  assert_eq!(headers.get("x-strata-config").unwrap(), "index");
  assert!(headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap().starts_with("text/html"));

  assert!(body.contains("<title>FixLab Device Repair</title>"));
  // Content reference resolved through the loader.
  assert!(body.contains("We fix it same day"));
  // Missing component degrades to a placeholder, page still serves.
  assert!(body.contains("Component &quot;Nonexistent&quot; not found"));
  // Site-level structured data.
  assert!(body.contains("\"@type\":\"WebSite\""));
}

#[tokio::test]
async fn auth_pages_are_never_cached() {
  let dir = tempfile::tempdir().unwrap();
  let router = test_engine(dir.path()).into_axum_router();

  let (status, headers, _) = get(router, "/account").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache, no-store, must-revalidate");
}

#[tokio::test]
async fn dynamic_route_substitutes_params_into_metadata() {
  let dir = tempfile::tempdir().unwrap();
  let router = test_engine(dir.path()).into_axum_router();

  let (status, headers, body) = get(router, "/services/iphone").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(headers.get("x-strata-config").unwrap(), "services/detail");
  assert!(body.contains("<title>iphone repair</title>"));
}

#[tokio::test]
async fn redirect_and_not_found() {
  let dir = tempfile::tempdir().unwrap();
  let engine = test_engine(dir.path());
  let router = engine.into_axum_router();

  let (status, headers, _) = get(router.clone(), "/repair").await;
  assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
  assert_eq!(headers.get(header::LOCATION).unwrap(), "/services/mac");

  let (status, _, body) = get(router, "/no/such/page").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body.contains("Page not found"));
}
