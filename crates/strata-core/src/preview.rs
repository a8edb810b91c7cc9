/* crates/strata-core/src/preview.rs */

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::BoxFuture;
use crate::context::DeviceKind;
use crate::errors::StrataError;
use crate::types::PageConfiguration;
use crate::validate::{ConfigValidator, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, section_missing_alt};

/// A preview is accepted only when validation passes and performance clears
/// this bar; accessibility and SEO scores are advisory.
const PERFORMANCE_THRESHOLD: u8 = 80;

const RECOMMENDED_MAX_SECTIONS: usize = 10;

/// Components known to dominate render cost.
const HEAVY_COMPONENTS: &[&str] =
  &["AnalyticsChart", "Carousel", "GalleryGrid", "MapEmbed", "VideoHero"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
  Generating,
  Ready,
  Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewOptions {
  pub locale: String,
  pub device: DeviceKind,
  pub theme: String,
  pub viewport: (u32, u32),
  pub features: Vec<String>,
  pub debug: bool,
}

impl Default for PreviewOptions {
  fn default() -> Self {
    Self {
      locale: "en".to_string(),
      device: DeviceKind::Desktop,
      theme: "light".to_string(),
      viewport: (1440, 900),
      features: Vec::new(),
      debug: false,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreIssue {
  pub kind: String,
  pub message: String,
}

/// One heuristic scorer's outcome: 0-100 plus what dragged it down.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
  pub score: u8,
  pub issues: Vec<ScoreIssue>,
  pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewMetadata {
  pub performance: ScoreReport,
  pub accessibility: ScoreReport,
  pub seo: ScoreReport,
}

/// A sandboxed, scored, time-limited rendering of a configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
  pub id: String,
  pub config: PageConfiguration,
  pub options: PreviewOptions,
  pub status: PreviewStatus,
  pub valid: bool,
  pub metadata: Option<PreviewMetadata>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub created: DateTime<Utc>,
  pub updated: DateTime<Utc>,
  pub expires: DateTime<Utc>,
}

impl Preview {
  pub fn is_expired(&self) -> bool {
    Utc::now() >= self.expires
  }
}

/// Storage collaborator for preview records.
pub trait PreviewStore: Send + Sync {
  fn put(&self, preview: Preview) -> BoxFuture<Result<(), StrataError>>;
  fn get(&self, id: &str) -> BoxFuture<Result<Option<Preview>, StrataError>>;
  fn remove(&self, id: &str) -> BoxFuture<Result<(), StrataError>>;
  fn list_ids(&self) -> BoxFuture<Vec<String>>;
}

#[derive(Default)]
pub struct MemoryPreviewStore {
  entries: RwLock<HashMap<String, Preview>>,
}

impl MemoryPreviewStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl PreviewStore for MemoryPreviewStore {
  fn put(&self, preview: Preview) -> BoxFuture<Result<(), StrataError>> {
    self.entries.write().expect("preview store lock poisoned").insert(preview.id.clone(), preview);
    Box::pin(async { Ok(()) })
  }

  fn get(&self, id: &str) -> BoxFuture<Result<Option<Preview>, StrataError>> {
    let found = self.entries.read().expect("preview store lock poisoned").get(id).cloned();
    Box::pin(async move { Ok(found) })
  }

  fn remove(&self, id: &str) -> BoxFuture<Result<(), StrataError>> {
    self.entries.write().expect("preview store lock poisoned").remove(id);
    Box::pin(async { Ok(()) })
  }

  fn list_ids(&self) -> BoxFuture<Vec<String>> {
    let ids = self.entries.read().expect("preview store lock poisoned").keys().cloned().collect();
    Box::pin(async move { ids })
  }
}

/// Generates scored previews for authoring workflows. Generation failures
/// are captured into an error-status preview so authors can inspect them.
pub struct PreviewManager {
  validator: Arc<ConfigValidator>,
  store: Arc<dyn PreviewStore>,
  ttl: chrono::Duration,
}

impl PreviewManager {
  pub fn new(validator: Arc<ConfigValidator>, store: Arc<dyn PreviewStore>) -> Self {
    Self { validator, store, ttl: chrono::Duration::hours(24) }
  }

  pub fn ttl(mut self, ttl: chrono::Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub async fn create_preview(
    &self,
    config: &PageConfiguration,
    options: PreviewOptions,
  ) -> Result<Preview, StrataError> {
    let now = Utc::now();
    let mut preview = Preview {
      id: Uuid::new_v4().to_string(),
      config: config.clone(),
      options,
      status: PreviewStatus::Generating,
      valid: false,
      metadata: None,
      error: None,
      created: now,
      updated: now,
      expires: now + self.ttl,
    };
    self.store.put(preview.clone()).await?;

    match self.generate(config) {
      Ok((validation_ok, metadata)) => {
        preview.valid =
          validation_ok && metadata.performance.score >= PERFORMANCE_THRESHOLD;
        preview.metadata = Some(metadata);
        preview.status = PreviewStatus::Ready;
      }
      Err(err) => {
        log::warn!("preview generation failed: {err}");
        preview.status = PreviewStatus::Error;
        preview.error = Some(err.to_string());
      }
    }
    preview.updated = Utc::now();

    self.store.put(preview.clone()).await?;
    Ok(preview)
  }

  pub async fn get_preview(&self, id: &str) -> Result<Option<Preview>, StrataError> {
    match self.store.get(id).await? {
      Some(preview) if preview.is_expired() => {
        self.store.remove(id).await?;
        Ok(None)
      }
      other => Ok(other),
    }
  }

  /// Remove every expired preview; returns how many were collected.
  pub async fn sweep(&self) -> Result<usize, StrataError> {
    let mut removed = 0;
    for id in self.store.list_ids().await {
      if let Some(preview) = self.store.get(&id).await? {
        if preview.is_expired() {
          self.store.remove(&id).await?;
          removed += 1;
        }
      }
    }
    Ok(removed)
  }

  fn generate(
    &self,
    config: &PageConfiguration,
  ) -> Result<(bool, PreviewMetadata), StrataError> {
    let raw = serde_json::to_value(config)
      .map_err(|err| StrataError::internal(format!("serializing config: {err}")))?;
    let result = self.validator.validate_raw(&raw);

    let metadata = PreviewMetadata {
      performance: score_performance(config),
      accessibility: score_accessibility(config),
      seo: score_seo(config),
    };
    Ok((result.valid, metadata))
  }
}

fn clamp_score(score: i32) -> u8 {
  score.clamp(0, 100) as u8
}

/// Penalizes section counts past ten and known heavy components.
pub fn score_performance(config: &PageConfiguration) -> ScoreReport {
  let mut score = 100_i32;
  let mut issues = Vec::new();
  let mut recommendations = Vec::new();

  let count = config.sections.len();
  if count > RECOMMENDED_MAX_SECTIONS {
    score -= ((count - RECOMMENDED_MAX_SECTIONS) * 5) as i32;
    issues.push(ScoreIssue {
      kind: "render".to_string(),
      message: format!("{count} sections exceeds the recommended {RECOMMENDED_MAX_SECTIONS}"),
    });
    recommendations
      .push("split the page or move below-the-fold sections behind lazy loading".to_string());
  }

  for section in &config.sections {
    if HEAVY_COMPONENTS.contains(&section.component.as_str()) {
      score -= 10;
      issues.push(ScoreIssue {
        kind: "component".to_string(),
        message: format!("section {:?} uses heavy component {:?}", section.id, section.component),
      });
    }
  }

  ScoreReport { score: clamp_score(score), issues, recommendations }
}

/// Penalizes image-bearing sections without alt text.
pub fn score_accessibility(config: &PageConfiguration) -> ScoreReport {
  let mut score = 100_i32;
  let mut issues = Vec::new();
  let mut recommendations = Vec::new();

  for section in &config.sections {
    if section_missing_alt(section) {
      score -= 15;
      issues.push(ScoreIssue {
        kind: "accessibility".to_string(),
        message: format!("section {:?} carries an image without alt text", section.id),
      });
    }
  }
  if !issues.is_empty() {
    recommendations.push("add alt text to every image-bearing section".to_string());
  }

  ScoreReport { score: clamp_score(score), issues, recommendations }
}

/// Penalizes over-length title/description; a missing keyword set costs a
/// little, so keyword presence is effectively rewarded.
pub fn score_seo(config: &PageConfiguration) -> ScoreReport {
  let mut score = 100_i32;
  let mut issues = Vec::new();
  let mut recommendations = Vec::new();

  let title_len = config.meta.title.chars().count();
  if title_len > MAX_TITLE_LEN {
    score -= 15;
    issues.push(ScoreIssue {
      kind: "seo".to_string(),
      message: format!("title is {title_len} characters (max {MAX_TITLE_LEN} recommended)"),
    });
  }

  let description_len = config.meta.description.chars().count();
  if description_len > MAX_DESCRIPTION_LEN {
    score -= 10;
    issues.push(ScoreIssue {
      kind: "seo".to_string(),
      message: format!(
        "description is {description_len} characters (max {MAX_DESCRIPTION_LEN} recommended)"
      ),
    });
  }

  if config.meta.keywords.is_empty() {
    score -= 10;
    issues.push(ScoreIssue { kind: "seo".to_string(), message: "keyword set is empty".to_string() });
    recommendations.push("add a few targeted keywords".to_string());
  }

  ScoreReport { score: clamp_score(score), issues, recommendations }
}

#[cfg(test)]
mod tests {
  use serde_json::Map;

  use crate::types::{PageMeta, SectionSpec};

  use super::*;

  fn config_with_sections(count: usize) -> PageConfiguration {
    PageConfiguration {
      meta: PageMeta {
        title: "Mac Repair".into(),
        description: "Same-day Mac repair".into(),
        keywords: vec!["repair".into()],
        social_image: None,
        robots: None,
      },
      layout: "default".into(),
      sections: (0..count)
        .map(|i| SectionSpec {
          id: format!("section-{i}"),
          component: "InfoCard".into(),
          props: Map::new(),
          visibility: None,
          variants: Vec::new(),
        })
        .collect(),
      features: Vec::new(),
      auth: None,
      analytics: None,
    }
  }

  fn manager() -> PreviewManager {
    PreviewManager::new(Arc::new(ConfigValidator::new()), Arc::new(MemoryPreviewStore::new()))
  }

  #[test]
  fn twelve_sections_penalized_with_render_issue() {
    let report = score_performance(&config_with_sections(12));
    assert!(report.score <= 90);
    assert!(report.issues.iter().any(|i| i.kind == "render"));
  }

  #[test]
  fn ten_sections_unpenalized() {
    let report = score_performance(&config_with_sections(10));
    assert_eq!(report.score, 100);
    assert!(report.issues.is_empty());
  }

  #[test]
  fn heavy_components_cost_points() {
    let mut config = config_with_sections(2);
    config.sections[0].component = "VideoHero".into();
    let report = score_performance(&config);
    assert_eq!(report.score, 90);
    assert!(report.issues.iter().any(|i| i.kind == "component"));
  }

  #[test]
  fn accessibility_penalizes_missing_alt() {
    let mut config = config_with_sections(2);
    config.sections[0].props.insert("image".into(), serde_json::json!("/a.png"));
    config.sections[1].props.insert("image".into(), serde_json::json!("/b.png"));
    config.sections[1].props.insert("alt".into(), serde_json::json!("Bench"));

    let report = score_accessibility(&config);
    assert_eq!(report.score, 85);
    assert_eq!(report.issues.len(), 1);
  }

  #[test]
  fn seo_penalizes_lengths_and_missing_keywords() {
    let mut config = config_with_sections(1);
    config.meta.title = "t".repeat(80);
    config.meta.keywords.clear();

    let report = score_seo(&config);
    assert_eq!(report.score, 75);
    assert_eq!(report.issues.len(), 2);
  }

  #[tokio::test]
  async fn preview_ready_and_valid_for_clean_config() {
    let preview = manager()
      .create_preview(&config_with_sections(3), PreviewOptions::default())
      .await
      .unwrap();
    assert_eq!(preview.status, PreviewStatus::Ready);
    assert!(preview.valid);
    assert!(preview.metadata.is_some());
    assert!(preview.expires > preview.created);
  }

  #[tokio::test]
  async fn low_performance_score_rejects_preview() {
    // 15 sections: 25-point penalty drops performance below the threshold.
    let preview = manager()
      .create_preview(&config_with_sections(15), PreviewOptions::default())
      .await
      .unwrap();
    assert_eq!(preview.status, PreviewStatus::Ready);
    assert!(!preview.valid);
    let metadata = preview.metadata.unwrap();
    assert!(metadata.performance.score < PERFORMANCE_THRESHOLD);
  }

  #[tokio::test]
  async fn invalid_config_rejects_preview_but_still_scores() {
    let mut config = config_with_sections(2);
    config.sections[1].id = config.sections[0].id.clone();

    let preview = manager().create_preview(&config, PreviewOptions::default()).await.unwrap();
    assert_eq!(preview.status, PreviewStatus::Ready);
    assert!(!preview.valid);
    assert!(preview.metadata.is_some());
  }

  #[tokio::test]
  async fn stored_preview_round_trips() {
    let manager = manager();
    let preview =
      manager.create_preview(&config_with_sections(2), PreviewOptions::default()).await.unwrap();
    let fetched = manager.get_preview(&preview.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, preview.id);
    assert_eq!(fetched.status, PreviewStatus::Ready);
  }

  #[tokio::test]
  async fn expired_previews_are_collected_on_access() {
    let manager = manager().ttl(chrono::Duration::milliseconds(-1));
    let preview =
      manager.create_preview(&config_with_sections(2), PreviewOptions::default()).await.unwrap();
    assert!(manager.get_preview(&preview.id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn sweep_removes_expired_only() {
    let store = Arc::new(MemoryPreviewStore::new());
    let expired_manager =
      PreviewManager::new(Arc::new(ConfigValidator::new()), Arc::clone(&store) as Arc<dyn PreviewStore>)
        .ttl(chrono::Duration::milliseconds(-1));
    let live_manager =
      PreviewManager::new(Arc::new(ConfigValidator::new()), Arc::clone(&store) as Arc<dyn PreviewStore>);

    expired_manager.create_preview(&config_with_sections(1), PreviewOptions::default()).await.unwrap();
    let live =
      live_manager.create_preview(&config_with_sections(1), PreviewOptions::default()).await.unwrap();

    assert_eq!(live_manager.sweep().await.unwrap(), 1);
    assert!(live_manager.get_preview(&live.id).await.unwrap().is_some());
  }
}
