/* crates/strata-core/src/renderer.rs */

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use strata_html::RenderNode;
use tokio::task::JoinSet;

use crate::BoxFuture;
use crate::conditions::evaluate_all;
use crate::content::ContentLoader;
use crate::context::RenderContext;
use crate::errors::StrataError;
use crate::props::{transform_props, transform_props_cached};
use crate::registry::{ComponentFn, ComponentRegistry};
use crate::types::SectionSpec;

/// Deferred component production, used by lazy sources.
pub type ComponentLoaderFn =
  Arc<dyn Fn() -> BoxFuture<Result<ComponentFn, StrataError>> + Send + Sync>;

/// A place components can be resolved from when the registry misses.
/// Sources are consulted first-match-wins; a successful resolution is
/// registered so later renders hit the registry directly.
pub trait ComponentSource: Send + Sync {
  fn name(&self) -> &str;
  fn resolve(&self, name: &str) -> BoxFuture<Option<ComponentFn>>;
}

/// Fixed name -> implementation map.
#[derive(Default)]
pub struct StaticComponentSource {
  name: String,
  map: HashMap<String, ComponentFn>,
}

impl StaticComponentSource {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), map: HashMap::new() }
  }

  pub fn with(mut self, name: impl Into<String>, component: ComponentFn) -> Self {
    self.map.insert(name.into(), component);
    self
  }
}

impl ComponentSource for StaticComponentSource {
  fn name(&self) -> &str {
    &self.name
  }

  fn resolve(&self, name: &str) -> BoxFuture<Option<ComponentFn>> {
    let found = self.map.get(name).map(Arc::clone);
    Box::pin(async move { found })
  }
}

/// Name -> loader map for implementations that are expensive to produce.
/// A loader failure is logged and treated as a miss.
#[derive(Default)]
pub struct LazyComponentSource {
  name: String,
  loaders: RwLock<HashMap<String, ComponentLoaderFn>>,
}

impl LazyComponentSource {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), loaders: RwLock::new(HashMap::new()) }
  }

  pub fn add_loader(&self, name: impl Into<String>, loader: ComponentLoaderFn) {
    self.loaders.write().expect("lazy source lock poisoned").insert(name.into(), loader);
  }
}

impl ComponentSource for LazyComponentSource {
  fn name(&self) -> &str {
    &self.name
  }

  fn resolve(&self, name: &str) -> BoxFuture<Option<ComponentFn>> {
    let loader = self.loaders.read().expect("lazy source lock poisoned").get(name).cloned();
    let source_name = self.name.clone();
    let component = name.to_string();
    Box::pin(async move {
      let loader = loader?;
      match loader().await {
        Ok(resolved) => Some(resolved),
        Err(err) => {
          log::warn!("lazy source {source_name:?} failed to load {component:?}: {err}");
          None
        }
      }
    })
  }
}

/// Post-evaluation visibility record for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVisibility {
  pub conditions_passed: bool,
  pub device_visible: bool,
}

impl ResolvedVisibility {
  pub fn visible(self) -> bool {
    self.conditions_passed && self.device_visible
  }
}

/// One processed section: the node plus everything the assembly step needs.
#[derive(Debug, Clone)]
pub struct RenderedSection {
  pub id: String,
  pub component: String,
  pub node: RenderNode,
  pub props: Map<String, Value>,
  pub visibility: ResolvedVisibility,
}

/// Per-section pipeline: visibility gate, component resolution, prop
/// transformation, node construction inside an isolating boundary.
pub struct SectionRenderer {
  registry: Arc<ComponentRegistry>,
  content: Arc<ContentLoader>,
  sources: Vec<Arc<dyn ComponentSource>>,
}

impl SectionRenderer {
  pub fn new(registry: Arc<ComponentRegistry>, content: Arc<ContentLoader>) -> Self {
    Self { registry, content, sources: Vec::new() }
  }

  pub fn source(mut self, source: Arc<dyn ComponentSource>) -> Self {
    self.sources.push(source);
    self
  }

  pub fn resolved_visibility(
    &self,
    section: &SectionSpec,
    ctx: &RenderContext,
  ) -> ResolvedVisibility {
    let Some(visibility) = &section.visibility else {
      return ResolvedVisibility { conditions_passed: true, device_visible: true };
    };
    let conditions_passed = evaluate_all(&visibility.conditions, ctx);
    let device_visible =
      visibility.devices.get(ctx.device_kind().as_str()).copied().unwrap_or(true);
    ResolvedVisibility { conditions_passed, device_visible }
  }

  /// Full per-section pipeline. Never fails: degraded outcomes become nodes.
  pub async fn process(&self, section: &SectionSpec, ctx: &RenderContext) -> RenderedSection {
    let visibility = self.resolved_visibility(section, ctx);
    if !visibility.visible() {
      return RenderedSection {
        id: section.id.clone(),
        component: section.component.clone(),
        node: RenderNode::Empty,
        props: section.props.clone(),
        visibility,
      };
    }

    let props = transform_props(&section.props, ctx, &self.content).await;
    let node = match self.resolve_component(&section.component).await {
      Some(component) => construct_node(&component, section, &props, ctx),
      None => {
        log::warn!("component {:?} not found for section {:?}", section.component, section.id);
        RenderNode::placeholder(&section.id, &section.component)
      }
    };

    RenderedSection {
      id: section.id.clone(),
      component: section.component.clone(),
      node,
      props,
      visibility,
    }
  }

  pub async fn render(&self, section: &SectionSpec, ctx: &RenderContext) -> RenderNode {
    self.process(section, ctx).await.node
  }

  /// Warm-path render: registry and content cache only, no suspension. A
  /// component the registry does not hold yet renders as a loading
  /// placeholder rather than blocking on a dynamic load.
  pub fn render_sync(&self, section: &SectionSpec, ctx: &RenderContext) -> RenderNode {
    if !self.resolved_visibility(section, ctx).visible() {
      return RenderNode::Empty;
    }
    let props = transform_props_cached(&section.props, ctx, &self.content);
    match self.registry.get(&section.component) {
      Some(component) => construct_node(&component, section, &props, ctx),
      None => RenderNode::loading(&section.id),
    }
  }

  pub fn can_render(&self, name: &str) -> bool {
    self.registry.has(name)
  }

  /// The section's props after the full transformation pipeline.
  pub async fn component_props(
    &self,
    section: &SectionSpec,
    ctx: &RenderContext,
  ) -> Map<String, Value> {
    transform_props(&section.props, ctx, &self.content).await
  }

  /// Resolve component names ahead of render. Individual failures are
  /// tolerated; every name is attempted.
  pub async fn preload(&self, sections: &[SectionSpec]) {
    let mut names: Vec<String> = sections.iter().map(|s| s.component.clone()).collect();
    names.sort();
    names.dedup();

    let mut join_set = JoinSet::new();
    for name in names {
      if self.registry.has(&name) {
        continue;
      }
      let registry = Arc::clone(&self.registry);
      let sources = self.sources.clone();
      join_set.spawn(async move {
        resolve_from_sources(&registry, &sources, &name).await;
      });
    }
    while join_set.join_next().await.is_some() {}
  }

  async fn resolve_component(&self, name: &str) -> Option<ComponentFn> {
    if let Some(component) = self.registry.get(name) {
      return Some(component);
    }
    resolve_from_sources(&self.registry, &self.sources, name).await
  }
}

async fn resolve_from_sources(
  registry: &ComponentRegistry,
  sources: &[Arc<dyn ComponentSource>],
  name: &str,
) -> Option<ComponentFn> {
  for source in sources {
    if let Some(component) = source.resolve(name).await {
      log::debug!("component {name:?} resolved via source {:?}", source.name());
      registry.register(name, Arc::clone(&component));
      return Some(component);
    }
  }
  None
}

/// The isolating boundary around node construction: a component that returns
/// an error or panics yields an inline error node scoped to this section.
fn construct_node(
  component: &ComponentFn,
  section: &SectionSpec,
  props: &Map<String, Value>,
  ctx: &RenderContext,
) -> RenderNode {
  match catch_unwind(AssertUnwindSafe(|| component(props, ctx))) {
    Ok(Ok(node)) => node,
    Ok(Err(err)) => {
      log::warn!("section {:?} render failed: {err}", section.id);
      RenderNode::error(&section.id, err.message())
    }
    Err(payload) => {
      let message = panic_message(payload.as_ref());
      log::warn!("section {:?} render panicked: {message}", section.id);
      RenderNode::error(&section.id, message)
    }
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "section render panicked".to_string()
  }
}
