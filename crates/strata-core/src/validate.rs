/* crates/strata-core/src/validate.rs */

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::registry::ComponentRegistry;
use crate::types::{PageConfiguration, SectionSpec};

pub const MAX_TITLE_LEN: usize = 60;
pub const MAX_DESCRIPTION_LEN: usize = 160;

/// Feature flags the engine knows about. An unknown flag is advisory only —
/// the flag still flows through to conditions and components.
pub const KNOWN_FEATURES: &[&str] =
  &["accessibility", "analytics", "dark-mode", "lazy-media", "promo-banner", "realtime"];

const ACCESSIBILITY_FEATURE: &str = "accessibility";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Error,
  Warning,
  Suggestion,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
  pub code: String,
  pub message: String,
  pub severity: Severity,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub section_index: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub suggestion: Option<String>,
}

impl ValidationIssue {
  pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      code: code.into(),
      message: message.into(),
      severity: Severity::Error,
      section_index: None,
      suggestion: None,
    }
  }

  pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self { severity: Severity::Warning, ..Self::error(code, message) }
  }

  pub fn suggestion(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self { severity: Severity::Suggestion, ..Self::error(code, message) }
  }

  pub fn at_section(mut self, index: usize) -> Self {
    self.section_index = Some(index);
    self
  }

  pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
    self.suggestion = Some(hint.into());
    self
  }
}

/// Structured validation outcome. Business-rule violations never surface as
/// a bare error; callers get the whole issue list at once.
#[derive(Debug, Serialize)]
pub struct ValidationResult {
  pub valid: bool,
  pub errors: Vec<ValidationIssue>,
  pub warnings: Vec<ValidationIssue>,
  #[serde(skip)]
  pub config: Option<PageConfiguration>,
}

#[derive(Default)]
pub struct ConfigValidator {
  registry: Option<Arc<ComponentRegistry>>,
}

impl ConfigValidator {
  pub fn new() -> Self {
    Self::default()
  }

  /// With a registry attached, unregistered component names produce
  /// warnings. Without one, that check is skipped entirely (the registry may
  /// not exist yet at validation time).
  pub fn with_registry(registry: Arc<ComponentRegistry>) -> Self {
    Self { registry: Some(registry) }
  }

  /// Validate a raw JSON document. Structural failures are fatal and skip
  /// the semantic tier; string-length and similar bounds are advisory.
  pub fn validate_raw(&self, raw: &Value) -> ValidationResult {
    let errors = structural_errors(raw);
    if !errors.is_empty() {
      return ValidationResult { valid: false, errors, warnings: Vec::new(), config: None };
    }

    match serde_json::from_value::<PageConfiguration>(raw.clone()) {
      Ok(config) => self.validate_config(&config),
      Err(err) => ValidationResult {
        valid: false,
        errors: vec![ValidationIssue::error("INVALID_CONFIG", err.to_string())],
        warnings: Vec::new(),
        config: None,
      },
    }
  }

  /// Semantic tier over an already-typed configuration.
  pub fn validate_config(&self, config: &PageConfiguration) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for (index, section) in config.sections.iter().enumerate() {
      if !seen_ids.insert(section.id.as_str()) {
        errors.push(
          ValidationIssue::error(
            "DUPLICATE_SECTION_ID",
            format!("section id {:?} is used more than once", section.id),
          )
          .at_section(index),
        );
      }
    }

    if let Some(registry) = &self.registry {
      for (index, section) in config.sections.iter().enumerate() {
        if !registry.has(&section.component) {
          warnings.push(
            ValidationIssue::warning(
              "UNKNOWN_COMPONENT",
              format!("component {:?} is not registered", section.component),
            )
            .at_section(index)
            .with_hint("the registry may populate later; missing components degrade to placeholders"),
          );
        }
      }
    }

    let title_len = config.meta.title.chars().count();
    if title_len > MAX_TITLE_LEN {
      warnings.push(
        ValidationIssue::warning(
          "LONG_TITLE",
          format!("title is {title_len} characters (recommended max {MAX_TITLE_LEN})"),
        )
        .with_hint("search results truncate titles past 60 characters"),
      );
    }

    let description_len = config.meta.description.chars().count();
    if description_len > MAX_DESCRIPTION_LEN {
      warnings.push(
        ValidationIssue::warning(
          "LONG_DESCRIPTION",
          format!(
            "description is {description_len} characters (recommended max {MAX_DESCRIPTION_LEN})"
          ),
        )
        .with_hint("search results truncate descriptions past 160 characters"),
      );
    }

    for feature in &config.features {
      if !KNOWN_FEATURES.contains(&feature.as_str()) {
        warnings.push(ValidationIssue::warning(
          "UNKNOWN_FEATURE",
          format!("unknown feature flag {:?}; known flags: {}", feature, KNOWN_FEATURES.join(", ")),
        ));
      }
    }

    if config.has_feature(ACCESSIBILITY_FEATURE) {
      for (index, section) in config.sections.iter().enumerate() {
        if section_missing_alt(section) {
          warnings.push(
            ValidationIssue::warning(
              "MISSING_ALT_TEXT",
              format!("section {:?} carries an image but no alt text", section.id),
            )
            .at_section(index)
            .with_hint("add an \"alt\" prop describing the image"),
          );
        }
      }
    }

    let valid = errors.is_empty();
    let config = valid.then(|| config.clone());
    ValidationResult { valid, errors, warnings, config }
  }
}

fn structural_errors(raw: &Value) -> Vec<ValidationIssue> {
  let mut errors = Vec::new();

  let meta = raw.get("meta");
  if !has_string(meta, "title") {
    errors.push(ValidationIssue::error("MISSING_TITLE", "meta.title is required"));
  }
  if !has_string(meta, "description") {
    errors.push(ValidationIssue::error("MISSING_DESCRIPTION", "meta.description is required"));
  }
  if !is_nonempty_string(raw.get("layout")) {
    errors.push(ValidationIssue::error("MISSING_LAYOUT", "layout is required"));
  }

  match raw.get("sections").and_then(Value::as_array) {
    None => errors.push(ValidationIssue::error("EMPTY_SECTIONS", "sections must be an array")),
    Some(sections) if sections.is_empty() => {
      errors.push(ValidationIssue::error("EMPTY_SECTIONS", "sections must not be empty"));
    }
    Some(sections) => {
      for (index, section) in sections.iter().enumerate() {
        if !is_nonempty_string(section.get("id")) || !is_nonempty_string(section.get("component")) {
          errors.push(
            ValidationIssue::error(
              "INVALID_SECTION",
              format!("section at index {index} needs both \"id\" and \"component\""),
            )
            .at_section(index),
          );
        }
      }
    }
  }

  errors
}

fn has_string(parent: Option<&Value>, field: &str) -> bool {
  is_nonempty_string(parent.and_then(|p| p.get(field)))
}

fn is_nonempty_string(value: Option<&Value>) -> bool {
  value.and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty())
}

/// Keys whose string values mark a section as image-bearing.
const MEDIA_PROP_KEYS: &[&str] = &["image", "src", "media", "background_image"];
const ALT_PROP_KEYS: &[&str] = &["alt", "image_alt"];

pub(crate) fn section_has_media(section: &SectionSpec) -> bool {
  props_have_key(&section.props, MEDIA_PROP_KEYS)
}

pub(crate) fn section_missing_alt(section: &SectionSpec) -> bool {
  section_has_media(section) && !props_have_key(&section.props, ALT_PROP_KEYS)
}

fn props_have_key(props: &Map<String, Value>, keys: &[&str]) -> bool {
  keys
    .iter()
    .any(|key| props.get(*key).and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty()))
}
