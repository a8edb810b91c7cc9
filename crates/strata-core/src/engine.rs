/* crates/strata-core/src/engine.rs */

use std::path::PathBuf;
use std::sync::Arc;

use crate::content::{ContentLoader, ContentSource};
use crate::factory::PageFactory;
use crate::loader::ConfigLoader;
use crate::metadata::MetadataManager;
use crate::preview::{MemoryPreviewStore, PreviewManager, PreviewStore};
use crate::registry::{ComponentFn, ComponentRegistry};
use crate::renderer::{ComponentSource, SectionRenderer};
use crate::routes::{RouteResolver, RouteTable};
use crate::validate::ConfigValidator;

/// The wired-up engine: every collaborator constructed, shared state
/// injected. Adapter crates consume this to serve pages.
pub struct Engine {
  pub registry: Arc<ComponentRegistry>,
  pub content: Arc<ContentLoader>,
  pub loader: Arc<ConfigLoader>,
  pub renderer: Arc<SectionRenderer>,
  pub factory: Arc<PageFactory>,
  pub resolver: Arc<RouteResolver>,
  pub metadata: Arc<MetadataManager>,
  pub previews: Arc<PreviewManager>,
  pub locales: Vec<String>,
  pub default_locale: String,
}

impl Engine {
  pub fn builder(config_dir: impl Into<PathBuf>) -> EngineBuilder {
    EngineBuilder {
      config_dir: config_dir.into(),
      routes: RouteTable::default(),
      base_url: "http://localhost:3000".to_string(),
      site_name: "Strata".to_string(),
      locales: vec!["en".to_string()],
      default_locale: "en".to_string(),
      dev_mode: false,
      components: Vec::new(),
      component_sources: Vec::new(),
      content_sources: Vec::new(),
      preview_store: None,
    }
  }
}

pub struct EngineBuilder {
  config_dir: PathBuf,
  routes: RouteTable,
  base_url: String,
  site_name: String,
  locales: Vec<String>,
  default_locale: String,
  dev_mode: bool,
  components: Vec<(String, ComponentFn)>,
  component_sources: Vec<Arc<dyn ComponentSource>>,
  content_sources: Vec<Arc<dyn ContentSource>>,
  preview_store: Option<Arc<dyn PreviewStore>>,
}

impl EngineBuilder {
  pub fn routes(mut self, routes: RouteTable) -> Self {
    self.routes = routes;
    self
  }

  pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn site_name(mut self, site_name: impl Into<String>) -> Self {
    self.site_name = site_name.into();
    self
  }

  pub fn locales(mut self, locales: Vec<String>, default_locale: impl Into<String>) -> Self {
    self.locales = locales;
    self.default_locale = default_locale.into();
    self
  }

  pub fn dev_mode(mut self, dev_mode: bool) -> Self {
    self.dev_mode = dev_mode;
    self
  }

  pub fn component(mut self, name: impl Into<String>, component: ComponentFn) -> Self {
    self.components.push((name.into(), component));
    self
  }

  pub fn component_source(mut self, source: Arc<dyn ComponentSource>) -> Self {
    self.component_sources.push(source);
    self
  }

  pub fn content_source(mut self, source: Arc<dyn ContentSource>) -> Self {
    self.content_sources.push(source);
    self
  }

  pub fn preview_store(mut self, store: Arc<dyn PreviewStore>) -> Self {
    self.preview_store = Some(store);
    self
  }

  pub fn build(self) -> Engine {
    let registry = Arc::new(ComponentRegistry::new());
    registry.register_batch(self.components);

    let mut content = ContentLoader::new(self.default_locale.clone());
    for source in self.content_sources {
      content = content.source(source);
    }
    let content = Arc::new(content);

    let validator = Arc::new(ConfigValidator::with_registry(Arc::clone(&registry)));
    let loader =
      Arc::new(ConfigLoader::new(self.config_dir, Arc::clone(&validator), self.dev_mode));

    let mut renderer = SectionRenderer::new(Arc::clone(&registry), Arc::clone(&content));
    for source in self.component_sources {
      renderer = renderer.source(source);
    }
    let renderer = Arc::new(renderer);

    let factory = Arc::new(PageFactory::new(
      Arc::clone(&renderer),
      ConfigValidator::with_registry(Arc::clone(&registry)),
    ));

    let store =
      self.preview_store.unwrap_or_else(|| Arc::new(MemoryPreviewStore::new()));
    let previews = Arc::new(PreviewManager::new(Arc::clone(&validator), store));

    Engine {
      registry,
      content,
      loader,
      renderer,
      factory,
      resolver: Arc::new(RouteResolver::new(self.routes)),
      metadata: Arc::new(MetadataManager::new(self.base_url, self.site_name)),
      previews,
      locales: self.locales,
      default_locale: self.default_locale,
    }
  }
}
