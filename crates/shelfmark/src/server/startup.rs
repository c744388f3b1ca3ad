//! REST server startup and configuration

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::Result;
use crate::ratings::SqliteRatingStore;
use crate::recommend::Recommender;
use crate::server::routing::create_router;
use crate::server::state::{AppState, ServerSettings};
use crate::session::SessionSigner;

/// Load every asset and open the rating store. Asset failures abort startup.
pub fn build_state(config: &Config) -> Result<AppState> {
  let recommender = Recommender::load(config)?;
  tracing::info!(
    books = recommender.catalog().len(),
    popular = recommender.popular().len(),
    "Loaded recommendation assets from {}",
    config.data_dir.display()
  );

  let store = SqliteRatingStore::open(&config.database_path)?;
  tracing::info!("Rating store ready at {}", config.database_path.display());

  let sessions = match &config.session_secret {
    Some(secret) => SessionSigner::new(secret)?,
    None => {
      tracing::warn!("No session_secret configured; sessions will not survive a restart");
      SessionSigner::ephemeral()?
    }
  };

  let settings = ServerSettings { popular_limit: config.popular_limit, rating_bounds: config.rating_bounds };
  Ok(AppState::new(Arc::new(recommender), Arc::new(store), Arc::new(sessions), settings))
}

/// Start the REST server
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
  let state = build_state(config)?;
  let app = create_router(state);

  let addr = config.bind;
  let listener = TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {addr}"))?;
  tracing::info!("Shelfmark listening on {}", addr);

  match axum::serve(listener, app).await {
    Ok(()) => {
      tracing::info!("Server shutdown gracefully");
      Ok(())
    }
    Err(e) => {
      tracing::error!("Server error: {}", e);
      Err(anyhow::anyhow!("Server error: {}", e))
    }
  }
}
