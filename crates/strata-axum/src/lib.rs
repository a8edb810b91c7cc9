/* crates/strata-axum/src/lib.rs */

mod error;
mod handler;

use std::sync::Arc;

use strata_core::Engine;

/// Re-export the engine core for convenience
pub use strata_core;

pub use handler::cache_control;

/// Extension trait that converts a wired `Engine` into an Axum router.
pub trait IntoAxumRouter {
  fn into_axum_router(self) -> axum::Router;
  fn serve(
    self,
    addr: &str,
  ) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error>>> + Send;
}

impl IntoAxumRouter for Engine {
  fn into_axum_router(self) -> axum::Router {
    handler::build_router(Arc::new(self))
  }

  async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = self.into_axum_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    log::info!("strata serving pages on http://localhost:{}", local_addr.port());
    axum::serve(listener, router).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn into_axum_router_builds_without_panic() {
    let engine = Engine::builder("/tmp/strata-configs").build();
    let _router = engine.into_axum_router();
  }
}
