/* crates/strata-core/src/metadata.rs */

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

use crate::routes::normalize_path;
use crate::types::PageConfiguration;
use crate::validate::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, ValidationIssue};

#[derive(Debug, Clone, Serialize)]
pub struct SocialCard {
  pub card_type: String,
  pub title: String,
  pub description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
}

/// Derived head metadata for one page render.
#[derive(Debug, Clone, Serialize)]
pub struct PageMetadata {
  pub title: String,
  pub description: String,
  pub canonical: String,
  pub keywords: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub robots: Option<String>,
  pub social: SocialCard,
  pub structured_data: Vec<Value>,
}

/// Derives SEO/social tags and structured data from a configuration.
pub struct MetadataManager {
  base_url: String,
  site_name: String,
}

impl MetadataManager {
  pub fn new(base_url: impl Into<String>, site_name: impl Into<String>) -> Self {
    let base_url = base_url.into();
    Self { base_url: base_url.trim_end_matches('/').to_string(), site_name: site_name.into() }
  }

  pub fn page_metadata(
    &self,
    config: &PageConfiguration,
    params: &HashMap<String, String>,
    path: &str,
  ) -> PageMetadata {
    let title = substitute_params(&config.meta.title, params);
    let description = substitute_params(&config.meta.description, params);
    let page_type = config.analytics.as_ref().and_then(|a| a.page_type.as_deref());
    let card_type = social_card_type(page_type);

    PageMetadata {
      canonical: self.canonical_url(path),
      keywords: config.meta.keywords.clone(),
      robots: config.meta.robots.clone(),
      social: SocialCard {
        card_type: card_type.to_string(),
        title: title.clone(),
        description: description.clone(),
        image: config.meta.social_image.clone(),
      },
      structured_data: self.structured_data(&title, &description, page_type),
      title,
      description,
    }
  }

  pub fn canonical_url(&self, path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized == "index" {
      format!("{}/", self.base_url)
    } else {
      format!("{}/{normalized}", self.base_url)
    }
  }

  /// Site-level WebSite and Organization documents always; a page-type
  /// document when the analytics page type calls for one.
  fn structured_data(&self, title: &str, description: &str, page_type: Option<&str>) -> Vec<Value> {
    let mut docs = vec![
      serde_json::json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": self.site_name,
        "url": format!("{}/", self.base_url),
      }),
      serde_json::json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": self.site_name,
        "url": format!("{}/", self.base_url),
      }),
    ];

    match page_type {
      Some("service") => docs.push(serde_json::json!({
        "@context": "https://schema.org",
        "@type": "Service",
        "name": title,
        "description": description,
        "provider": {"@type": "Organization", "name": self.site_name},
      })),
      Some("article") => docs.push(serde_json::json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": title,
        "description": description,
        "publisher": {"@type": "Organization", "name": self.site_name},
      })),
      Some("product") => docs.push(serde_json::json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "name": title,
        "description": description,
      })),
      _ => {}
    }

    docs
  }
}

fn social_card_type(page_type: Option<&str>) -> &'static str {
  match page_type {
    Some("article") => "article",
    Some("product") => "product",
    Some("profile") => "profile",
    _ => "website",
  }
}

/// Replace `{param}` placeholders from route params; unknown placeholders
/// keep their literal form.
pub fn substitute_params(text: &str, params: &HashMap<String, String>) -> String {
  static PARAM_RE: OnceLock<Regex> = OnceLock::new();
  let re = PARAM_RE
    .get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("param placeholder regex"));
  re.replace_all(text, |caps: &Captures<'_>| {
    params.get(&caps[1]).cloned().unwrap_or_else(|| caps[0].to_string())
  })
  .into_owned()
}

/// Flags problems in a derived metadata object. Missing title/description
/// are errors; the rest is advisory.
pub fn validate_metadata(meta: &PageMetadata) -> Vec<ValidationIssue> {
  let mut issues = Vec::new();

  if meta.title.trim().is_empty() {
    issues.push(ValidationIssue::error("MISSING_META_TITLE", "metadata title is empty"));
  } else {
    let len = meta.title.chars().count();
    if !(5..=MAX_TITLE_LEN).contains(&len) {
      issues.push(ValidationIssue::warning(
        "TITLE_LENGTH",
        format!("title is {len} characters (recommended 5-{MAX_TITLE_LEN})"),
      ));
    }
  }

  if meta.description.trim().is_empty() {
    issues
      .push(ValidationIssue::error("MISSING_META_DESCRIPTION", "metadata description is empty"));
  } else {
    let len = meta.description.chars().count();
    if !(25..=MAX_DESCRIPTION_LEN).contains(&len) {
      issues.push(ValidationIssue::warning(
        "DESCRIPTION_LENGTH",
        format!("description is {len} characters (recommended 25-{MAX_DESCRIPTION_LEN})"),
      ));
    }
  }

  if meta.social.image.is_none() {
    issues.push(ValidationIssue::warning("MISSING_SOCIAL_IMAGE", "no social card image set"));
  }

  if meta.keywords.is_empty() {
    issues.push(
      ValidationIssue::suggestion("NO_KEYWORDS", "keyword set is empty")
        .with_hint("a few targeted keywords help search snippets"),
    );
  }

  issues
}
