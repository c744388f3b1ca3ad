//! Shared application state handed to every handler

use std::sync::Arc;

use crate::ratings::RatingStore;
use crate::recommend::Recommender;
use crate::session::SessionSigner;

#[derive(Clone)]
pub struct AppState {
  /// Read-only catalog and similarity tables
  pub recommender: Arc<Recommender>,
  /// The only mutable shared resource
  pub ratings: Arc<dyn RatingStore>,
  pub sessions: Arc<SessionSigner>,
  pub settings: ServerSettings,
}

/// Request-boundary knobs taken from the configuration
#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
  pub popular_limit: usize,
  pub rating_bounds: Option<(i64, i64)>,
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self { popular_limit: 50, rating_bounds: None }
  }
}

impl AppState {
  pub fn new(
    recommender: Arc<Recommender>,
    ratings: Arc<dyn RatingStore>,
    sessions: Arc<SessionSigner>,
    settings: ServerSettings,
  ) -> Self {
    Self { recommender, ratings, sessions, settings }
  }
}
