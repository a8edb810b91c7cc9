/* crates/strata-core/src/context.rs */

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
  Mobile,
  Tablet,
  Desktop,
}

impl DeviceKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Mobile => "mobile",
      Self::Tablet => "tablet",
      Self::Desktop => "desktop",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "mobile" => Some(Self::Mobile),
      "tablet" => Some(Self::Tablet),
      "desktop" => Some(Self::Desktop),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct DeviceInfo {
  pub kind: DeviceKind,
  pub width: u32,
  pub height: u32,
  pub user_agent: Option<String>,
}

impl DeviceInfo {
  /// Default viewport dimensions per device class.
  pub fn of_kind(kind: DeviceKind) -> Self {
    let (width, height) = match kind {
      DeviceKind::Mobile => (390, 844),
      DeviceKind::Tablet => (820, 1180),
      DeviceKind::Desktop => (1440, 900),
    };
    Self { kind, width, height, user_agent: None }
  }
}

impl Default for DeviceInfo {
  fn default() -> Self {
    Self::of_kind(DeviceKind::Desktop)
  }
}

#[derive(Debug, Clone)]
pub struct UserInfo {
  pub id: String,
  pub role: String,
}

/// Per-request render state. Created for one render and discarded after.
#[derive(Debug, Clone)]
pub struct RenderContext {
  pub locale: String,
  pub user: Option<UserInfo>,
  pub features: HashSet<String>,
  pub device: DeviceInfo,
  pub theme: String,
  pub preview: bool,
  pub params: HashMap<String, String>,
}

impl RenderContext {
  pub fn new(locale: impl Into<String>) -> Self {
    Self {
      locale: locale.into(),
      user: None,
      features: HashSet::new(),
      device: DeviceInfo::default(),
      theme: "light".to_string(),
      preview: false,
      params: HashMap::new(),
    }
  }

  pub fn has_feature(&self, name: &str) -> bool {
    self.features.contains(name)
  }

  pub fn device_kind(&self) -> DeviceKind {
    self.device.kind
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn device_kind_round_trips() {
    for kind in [DeviceKind::Mobile, DeviceKind::Tablet, DeviceKind::Desktop] {
      assert_eq!(DeviceKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(DeviceKind::parse("watch"), None);
  }

  #[test]
  fn new_context_defaults() {
    let ctx = RenderContext::new("en");
    assert_eq!(ctx.locale, "en");
    assert_eq!(ctx.device_kind(), DeviceKind::Desktop);
    assert_eq!(ctx.theme, "light");
    assert!(!ctx.preview);
    assert!(ctx.user.is_none());
  }

  #[test]
  fn feature_membership() {
    let mut ctx = RenderContext::new("en");
    ctx.features.insert("dark-mode".to_string());
    assert!(ctx.has_feature("dark-mode"));
    assert!(!ctx.has_feature("realtime"));
  }
}
