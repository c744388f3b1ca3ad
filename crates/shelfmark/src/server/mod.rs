//! REST API module for the recommendation service
//!
//! Exposes popularity, recommendation and rating endpoints over HTTP.
//! Uses axum for routing and schemars for request schema publication.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod state;
pub mod types;

pub use routing::create_router;
pub use startup::{build_state, start_server};
pub use state::{AppState, ServerSettings};
