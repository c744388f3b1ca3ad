//! Request context and session middleware for the REST API
//!
//! Every request gets a `RequestContext` (request id plus method and path
//! for log correlation) and a `SessionId`, both injected as extensions.

use axum::{
  extract::{Request, State},
  http::{header, HeaderValue, Method, Uri},
  middleware::Next,
  response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::server::state::AppState;
use crate::session::{find_cookie, session_cookie_header, SessionId, SESSION_COOKIE};

/// Request context containing request metadata
#[derive(Clone, Debug)]
pub struct RequestContext {
  /// Unique ID for this request
  pub request_id: Uuid,
  /// HTTP method
  pub method: Method,
  /// Request URI
  pub uri: Uri,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri }
  }

  pub fn log_info(&self, message: &str, component: &str) {
    tracing::info!(request_id = %self.request_id, component, "{} {} - {}", self.method, self.uri.path(), message);
  }

  pub fn log_warn(&self, message: &str, component: &str) {
    tracing::warn!(request_id = %self.request_id, component, "{} {} - {}", self.method, self.uri.path(), message);
  }

  pub fn log_error(&self, message: &str, component: &str) {
    tracing::error!(request_id = %self.request_id, component, "{} {} - {}", self.method, self.uri.path(), message);
  }

  /// Log request completion with status
  pub fn log_request_complete(&self, status_code: u16, duration_ms: f64) {
    tracing::info!(
      request_id = %self.request_id,
      status = status_code,
      duration_ms,
      "{} {} - Request completed",
      self.method,
      self.uri.path()
    );
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
  let context = RequestContext::new(request.method().clone(), request.uri().clone());
  let start_time = Instant::now();
  tracing::debug!(request_id = %context.request_id, "{} {} - Request started", context.method, context.uri.path());

  request.extensions_mut().insert(context.clone());
  let response = next.run(request).await;

  let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
  context.log_request_complete(response.status().as_u16(), duration_ms);
  response
}

/// Middleware that attaches the caller's session, issuing a new one when the
/// cookie is missing or fails verification
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
  let existing = request
    .headers()
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|value| value.to_str().ok())
    .find_map(|cookies| find_cookie(cookies, SESSION_COOKIE))
    .and_then(|value| state.sessions.verify(value));

  let (session, issued) = match existing {
    Some(session) => (session, false),
    None => (SessionId::generate(), true),
  };

  request.extensions_mut().insert(session.clone());
  let mut response = next.run(request).await;

  if issued {
    let cookie = session_cookie_header(&state.sessions.sign(&session));
    match HeaderValue::from_str(&cookie) {
      Ok(value) => {
        response.headers_mut().append(header::SET_COOKIE, value);
      }
      Err(e) => tracing::error!("Could not encode session cookie: {}", e),
    }
  }

  response
}
