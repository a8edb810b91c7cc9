/* crates/strata-core/src/lib.rs */

pub mod conditions;
pub mod content;
pub mod context;
pub mod engine;
pub mod errors;
pub mod factory;
pub mod loader;
pub mod metadata;
pub mod preview;
pub mod props;
pub mod registry;
pub mod renderer;
pub mod resolve;
pub mod routes;
pub mod types;
pub mod validate;

use std::future::Future;
use std::pin::Pin;

/// Boxed future used across the engine's collaborator traits.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

// Re-exports for ergonomic use
pub use content::{ContentLoader, ContentSource, ContentValue, MediaKind, StaticContentSource};
pub use context::{DeviceInfo, DeviceKind, RenderContext, UserInfo};
pub use engine::{Engine, EngineBuilder};
pub use errors::StrataError;
pub use factory::{PageFactory, PageInstance};
pub use loader::{ConfigLoader, ConfigWatcher};
pub use metadata::{MetadataManager, PageMetadata, SocialCard, substitute_params, validate_metadata};
pub use preview::{
  MemoryPreviewStore, Preview, PreviewManager, PreviewMetadata, PreviewOptions, PreviewStatus,
  PreviewStore, ScoreIssue, ScoreReport,
};
pub use registry::{ComponentFn, ComponentInfo, ComponentRegistry, basic_component};
pub use renderer::{
  ComponentLoaderFn, ComponentSource, LazyComponentSource, RenderedSection, ResolvedVisibility,
  SectionRenderer, StaticComponentSource,
};
pub use resolve::{ResolveContext, parse_cookie_value, resolve_locale, sniff_device};
pub use routes::{RoutePattern, RouteResolution, RouteResolver, RouteTable, normalize_path};
pub use strata_html::RenderNode;
pub use types::{
  AnalyticsSpec, AuthSpec, PageConfiguration, PageMeta, SectionSpec, VisibilitySpec,
};
pub use validate::{ConfigValidator, Severity, ValidationIssue, ValidationResult};
