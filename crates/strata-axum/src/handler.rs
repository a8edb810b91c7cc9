/* crates/strata-axum/src/handler.rs */

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use strata_core::{
  DeviceInfo, Engine, PageConfiguration, PageInstance, PageMetadata, RenderContext,
  ResolveContext, RouteResolution, StrataError, parse_cookie_value, resolve_locale, sniff_device,
};
use strata_html::{RenderNode, escape_html, render_nodes};

use crate::error::AxumError;

pub(crate) fn build_router(engine: Arc<Engine>) -> axum::Router {
  axum::Router::new().fallback(axum::routing::get(handle_page)).with_state(engine)
}

async fn handle_page(
  State(engine): State<Arc<Engine>>,
  uri: Uri,
  headers: HeaderMap,
) -> Result<Response, AxumError> {
  let path = uri.path().to_string();

  match engine.resolver.resolve(&path) {
    RouteResolution::NotFound => Ok(not_found_response(&path)),
    RouteResolution::Redirect { to } => Ok(redirect_response(&to)),
    RouteResolution::Page { config_path, params } => {
      let config = engine
        .loader
        .load(&config_path)?
        .ok_or_else(|| StrataError::not_found(format!("no config for {config_path:?}")))?;

      let mut ctx = build_context(&engine, &uri, &headers, &config);
      ctx.params = params;

      let page = engine.factory.create_page(&config, &ctx).await?;
      let metadata = engine.metadata.page_metadata(&config, &ctx.params, &path);
      let html = render_document(&metadata, &ctx.locale, &page);

      let response = (
        [
          (header::CACHE_CONTROL.as_str(), cache_control(&config)),
          ("x-strata-config", config_path.as_str()),
        ],
        Html(html),
      );
      Ok(response.into_response())
    }
  }
}

/// Assemble the per-request render context from raw request signals.
fn build_context(
  engine: &Engine,
  uri: &Uri,
  headers: &HeaderMap,
  config: &PageConfiguration,
) -> RenderContext {
  let query_locale = query_param(uri.query(), "locale");
  let cookie_header = header_str(headers, header::COOKIE.as_str());
  let accept_language = header_str(headers, header::ACCEPT_LANGUAGE.as_str());
  let user_agent = header_str(headers, header::USER_AGENT.as_str());

  let locale = resolve_locale(&ResolveContext {
    query_locale: query_locale.as_deref(),
    cookie_header,
    accept_language,
    locales: &engine.locales,
    default_locale: &engine.default_locale,
  });

  let mut device = DeviceInfo::of_kind(sniff_device(user_agent));
  device.user_agent = user_agent.map(ToString::to_string);

  let theme = cookie_header
    .and_then(|h| parse_cookie_value(h, "strata-theme"))
    .unwrap_or("light")
    .to_string();

  let mut ctx = RenderContext::new(locale);
  ctx.device = device;
  ctx.theme = theme;
  ctx.features = config.features.iter().cloned().collect();
  ctx
}

/// Header policy: authenticated pages must never be cached, realtime pages
/// revalidate every time, everything else is shared-cacheable for an hour.
pub fn cache_control(config: &PageConfiguration) -> &'static str {
  if config.auth.as_ref().is_some_and(|a| a.required) {
    "no-cache, no-store, must-revalidate"
  } else if config.has_feature("realtime") {
    "no-cache, must-revalidate"
  } else {
    "public, max-age=3600, s-maxage=7200"
  }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers.get(name).and_then(|v| v.to_str().ok())
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
  for pair in query?.split('&') {
    if let Some((k, v)) = pair.split_once('=') {
      if k == name {
        return Some(v.to_string());
      }
    }
  }
  None
}

/// Full HTML document: derived head metadata plus the rendered section list.
fn render_document(metadata: &PageMetadata, locale: &str, page: &PageInstance) -> String {
  let mut head = String::new();
  head.push_str(&format!("<title>{}</title>", escape_html(&metadata.title)));
  head.push_str(&format!(
    "<meta name=\"description\" content=\"{}\">",
    escape_html(&metadata.description)
  ));
  if !metadata.keywords.is_empty() {
    head.push_str(&format!(
      "<meta name=\"keywords\" content=\"{}\">",
      escape_html(&metadata.keywords.join(", "))
    ));
  }
  if let Some(robots) = &metadata.robots {
    head.push_str(&format!("<meta name=\"robots\" content=\"{}\">", escape_html(robots)));
  }
  head.push_str(&format!("<link rel=\"canonical\" href=\"{}\">", escape_html(&metadata.canonical)));

  head.push_str(&format!(
    "<meta property=\"og:type\" content=\"{}\">",
    escape_html(&metadata.social.card_type)
  ));
  head.push_str(&format!(
    "<meta property=\"og:title\" content=\"{}\">",
    escape_html(&metadata.social.title)
  ));
  head.push_str(&format!(
    "<meta property=\"og:description\" content=\"{}\">",
    escape_html(&metadata.social.description)
  ));
  if let Some(image) = &metadata.social.image {
    head.push_str(&format!("<meta property=\"og:image\" content=\"{}\">", escape_html(image)));
  }

  for document in &metadata.structured_data {
    let json = serde_json::to_string(document).unwrap_or_default();
    head.push_str(&format!(
      "<script type=\"application/ld+json\">{}</script>",
      json.replace("</", "<\\/"),
    ));
  }

  let nodes: Vec<RenderNode> = page.sections.iter().map(|s| s.node.clone()).collect();
  let body = render_nodes(&nodes);

  format!(
    "<!DOCTYPE html><html lang=\"{}\"><head><meta charset=\"utf-8\">{head}</head>\
     <body data-layout=\"{}\">{body}</body></html>",
    escape_html(locale),
    escape_html(&page.layout),
  )
}

fn not_found_response(path: &str) -> Response {
  let body = format!("<h1>Page not found</h1><p>{}</p>", escape_html(path));
  (StatusCode::NOT_FOUND, Html(body)).into_response()
}

fn redirect_response(to: &str) -> Response {
  (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION.as_str(), to.to_string())], ())
    .into_response()
}
