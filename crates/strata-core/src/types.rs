/* crates/strata-core/src/types.rs */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A declarative page description: metadata plus an ordered list of section
/// descriptors. Authored externally, loaded read-only by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfiguration {
  pub meta: PageMeta,
  pub layout: String,
  pub sections: Vec<SectionSpec>,
  #[serde(default)]
  pub features: Vec<String>,
  #[serde(default)]
  pub auth: Option<AuthSpec>,
  #[serde(default)]
  pub analytics: Option<AnalyticsSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
  pub title: String,
  pub description: String,
  #[serde(default)]
  pub keywords: Vec<String>,
  #[serde(default)]
  pub social_image: Option<String>,
  #[serde(default)]
  pub robots: Option<String>,
}

/// One named, independently-failable unit of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSpec {
  pub id: String,
  pub component: String,
  #[serde(default)]
  pub props: Map<String, Value>,
  #[serde(default)]
  pub visibility: Option<VisibilitySpec>,
  #[serde(default)]
  pub variants: Vec<String>,
}

/// Conditions are AND-joined; the device map defaults to visible for any
/// device kind it does not mention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisibilitySpec {
  #[serde(default)]
  pub conditions: Vec<String>,
  #[serde(default)]
  pub devices: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSpec {
  #[serde(default)]
  pub required: bool,
  #[serde(default)]
  pub roles: Vec<String>,
  #[serde(default)]
  pub redirect_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSpec {
  #[serde(default)]
  pub page_type: Option<String>,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub dimensions: BTreeMap<String, String>,
}

impl PageConfiguration {
  pub fn has_feature(&self, name: &str) -> bool {
    self.features.iter().any(|f| f == name)
  }

  pub fn section(&self, id: &str) -> Option<&SectionSpec> {
    self.sections.iter().find(|s| s.id == id)
  }
}
