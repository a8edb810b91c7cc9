/* crates/strata-html/src/render.rs */

use serde_json::Value;

use crate::escape::escape_html;
use crate::node::RenderNode;

/// Serialize one node to HTML.
pub fn render_node(node: &RenderNode) -> String {
  let mut out = String::new();
  write_node(node, &mut out);
  out
}

/// Serialize a node list in order, skipping empties.
pub fn render_nodes(nodes: &[RenderNode]) -> String {
  let mut out = String::new();
  for node in nodes {
    write_node(node, &mut out);
  }
  out
}

fn write_node(node: &RenderNode, out: &mut String) {
  match node {
    RenderNode::Element { component, props, children } => {
      out.push_str(&format!("<div data-component=\"{}\"", escape_html(component)));
      for (key, value) in props {
        if let Some(attr) = prop_attr(value) {
          out.push_str(&format!(" data-prop-{}=\"{}\"", attr_name(key), escape_html(&attr)));
        }
      }
      out.push('>');
      for child in children {
        write_node(child, out);
      }
      out.push_str("</div>");
    }
    RenderNode::Text { text } => out.push_str(&escape_html(text)),
    RenderNode::Placeholder { section_id, message, .. } => {
      out.push_str(&format!(
        "<div class=\"strata-placeholder\" data-section=\"{}\">{}</div>",
        escape_html(section_id),
        escape_html(message),
      ));
    }
    RenderNode::ErrorBoundary { section_id, message } => {
      out.push_str(&format!(
        "<div class=\"strata-error\" data-section=\"{}\">{}</div>",
        escape_html(section_id),
        escape_html(message),
      ));
    }
    RenderNode::Loading { section_id } => {
      out.push_str(&format!(
        "<div class=\"strata-loading\" data-section=\"{}\" aria-busy=\"true\"></div>",
        escape_html(section_id),
      ));
    }
    RenderNode::Empty => {}
  }
}

/// Scalar props become data attributes; nested structures are left to the
/// component's own markup and skipped here.
fn prop_attr(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Number(n) => Some(n.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

/// Attribute names allow a narrower alphabet than prop keys.
fn attr_name(key: &str) -> String {
  key
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '-' })
    .collect()
}

#[cfg(test)]
mod tests {
  use serde_json::Map;

  use super::*;

  fn props(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
  }

  #[test]
  fn element_renders_scalar_props_as_data_attrs() {
    let node = RenderNode::element("HeroBanner", props(&[("title", Value::String("Fix it".into()))]));
    let html = render_node(&node);
    assert!(html.contains("data-component=\"HeroBanner\""));
    assert!(html.contains("data-prop-title=\"Fix it\""));
  }

  #[test]
  fn element_skips_structured_props() {
    let node =
      RenderNode::element("PricingTable", props(&[("rows", serde_json::json!([1, 2, 3]))]));
    assert!(!render_node(&node).contains("data-prop-rows"));
  }

  #[test]
  fn placeholder_message_is_visible_in_output() {
    let html = render_node(&RenderNode::placeholder("hero", "Nonexistent"));
    assert!(html.contains("Component &quot;Nonexistent&quot; not found"));
  }

  #[test]
  fn text_is_escaped() {
    assert_eq!(render_node(&RenderNode::text("<script>")), "&lt;script&gt;");
  }

  #[test]
  fn empty_renders_nothing() {
    assert_eq!(render_node(&RenderNode::Empty), "");
  }

  #[test]
  fn nodes_render_in_order() {
    let html = render_nodes(&[RenderNode::text("a"), RenderNode::Empty, RenderNode::text("b")]);
    assert_eq!(html, "ab");
  }

  #[test]
  fn children_nest_inside_parent() {
    let mut node = RenderNode::element("Card", Map::new());
    if let RenderNode::Element { children, .. } = &mut node {
      children.push(RenderNode::text("inner"));
    }
    let html = render_node(&node);
    assert!(html.contains(">inner</div>"));
  }
}
