/* crates/strata-html/src/node.rs */

use serde::Serialize;
use serde_json::{Map, Value};

/// One node in a rendered page tree.
///
/// `Element` carries real component output. The remaining variants are the
/// degraded outcomes of a section render: a gated-out section (`Empty`), a
/// component that could not be resolved (`Placeholder`), a section whose
/// construction faulted (`ErrorBoundary`), and a section whose async
/// dependencies are still cold (`Loading`). Degraded variants are scoped to
/// one section so one bad section never takes out its neighbours.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
  Element { component: String, props: Map<String, Value>, children: Vec<RenderNode> },
  Text { text: String },
  Placeholder { section_id: String, component: String, message: String },
  ErrorBoundary { section_id: String, message: String },
  Loading { section_id: String },
  Empty,
}

impl RenderNode {
  pub fn element(component: impl Into<String>, props: Map<String, Value>) -> Self {
    Self::Element { component: component.into(), props, children: Vec::new() }
  }

  pub fn text(text: impl Into<String>) -> Self {
    Self::Text { text: text.into() }
  }

  pub fn placeholder(section_id: impl Into<String>, component: impl Into<String>) -> Self {
    let component = component.into();
    let message = component_missing_message(&component);
    Self::Placeholder { section_id: section_id.into(), component, message }
  }

  pub fn error(section_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self::ErrorBoundary { section_id: section_id.into(), message: message.into() }
  }

  pub fn loading(section_id: impl Into<String>) -> Self {
    Self::Loading { section_id: section_id.into() }
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, Self::Empty)
  }
}

/// Message carried by a component-miss placeholder.
pub fn component_missing_message(component: &str) -> String {
  format!("Component \"{component}\" not found")
}
