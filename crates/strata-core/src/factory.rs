/* crates/strata-core/src/factory.rs */

use std::sync::Arc;

use strata_html::RenderNode;

use crate::context::RenderContext;
use crate::errors::StrataError;
use crate::renderer::{RenderedSection, SectionRenderer};
use crate::types::{AnalyticsSpec, PageConfiguration, PageMeta, SectionSpec};
use crate::validate::{ConfigValidator, ValidationResult};

/// A finished page: metadata plus processed sections in configuration order.
#[derive(Debug, Clone)]
pub struct PageInstance {
  pub meta: PageMeta,
  pub layout: String,
  pub sections: Vec<RenderedSection>,
  pub features: Vec<String>,
  pub analytics: Option<AnalyticsSpec>,
}

/// The single entry point consumers call to turn a configuration into a
/// page. Validation errors are the hard boundary here: warnings (including
/// unregistered components) never block, but an invalid configuration is
/// refused outright.
pub struct PageFactory {
  renderer: Arc<SectionRenderer>,
  validator: ConfigValidator,
}

impl PageFactory {
  pub fn new(renderer: Arc<SectionRenderer>, validator: ConfigValidator) -> Self {
    Self { renderer, validator }
  }

  pub fn validate_config(&self, config: &PageConfiguration) -> ValidationResult {
    self.validator.validate_config(config)
  }

  pub fn page_meta(&self, config: &PageConfiguration) -> PageMeta {
    config.meta.clone()
  }

  pub async fn render_section(&self, section: &SectionSpec, ctx: &RenderContext) -> RenderNode {
    self.renderer.render(section, ctx).await
  }

  /// Validate, then process every section in array order. Section order is
  /// the page's visual order and is preserved verbatim. Ordinary per-section
  /// failures (missing components, content misses, component faults) are
  /// absorbed into degraded nodes by the renderer; only a validation error
  /// fails page creation.
  pub async fn create_page(
    &self,
    config: &PageConfiguration,
    ctx: &RenderContext,
  ) -> Result<PageInstance, StrataError> {
    let result = self.validator.validate_config(config);
    if !result.valid {
      let summary: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
      return Err(StrataError::validation(format!(
        "configuration rejected: {}",
        summary.join(", ")
      )));
    }
    for warning in &result.warnings {
      log::debug!("config warning {}: {}", warning.code, warning.message);
    }

    let mut sections = Vec::with_capacity(config.sections.len());
    for section in &config.sections {
      sections.push(self.renderer.process(section, ctx).await);
    }

    Ok(PageInstance {
      meta: config.meta.clone(),
      layout: config.layout.clone(),
      sections,
      features: config.features.clone(),
      analytics: config.analytics.clone(),
    })
  }
}
