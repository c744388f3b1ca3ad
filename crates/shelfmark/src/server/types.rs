//! REST API types with schemars annotations for schema publication

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::catalog::PopularBook;
use crate::ratings::UpsertOutcome;
use crate::recommend::{Model, Recommendation};

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

/// API error information
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub context: serde_json::Value,
}

// Status/Version Endpoints
// =======================

/// Response for /status endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// Distinct titles in the catalog
  pub catalog_titles: usize,
  /// Titles known to the collaborative table
  pub collaborative_titles: usize,
  /// Titles known to the content table
  pub content_titles: usize,
}

/// Response for /version endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  pub version: String,
}

/// Response for /api endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiInfoResponse {
  pub latest: String,

  /// JSON schemas of the request bodies, keyed by type name
  pub schemas: BTreeMap<String, serde_json::Value>,
}

// Books Endpoints
// ===============

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PopularQuery {
  /// Number of books to return (defaults to the configured popular_limit)
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PopularBookData {
  pub title: String,
  pub author: String,
  pub image_url: String,
  pub num_ratings: u64,
  pub avg_rating: f64,
}

impl From<&PopularBook> for PopularBookData {
  fn from(book: &PopularBook) -> Self {
    Self {
      title: book.title.clone(),
      author: book.author.clone(),
      image_url: book.image_url.clone(),
      num_ratings: book.num_ratings,
      avg_rating: book.avg_rating,
    }
  }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PopularResponse {
  pub books: Vec<PopularBookData>,
  pub count: usize,
}

// Recommendation Endpoints
// ========================

/// Request for /recommendations endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecommendRequest {
  /// Book title as typed by the user
  #[serde(default)]
  pub title: String,

  /// Which similarity signal to use
  #[serde(default)]
  pub model: Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationData {
  pub title: String,
  pub author: String,
  pub image_url: String,
}

impl From<Recommendation> for RecommendationData {
  fn from(recommendation: Recommendation) -> Self {
    Self {
      title: recommendation.title,
      author: recommendation.author,
      image_url: recommendation.image_url,
    }
  }
}

/// Response for /recommendations endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecommendResponse {
  /// Input as received
  pub query: String,

  /// Canonical title the input resolved to
  pub title: String,

  pub model: Model,

  pub recommendations: Vec<RecommendationData>,

  pub count: usize,
}

// Rating Endpoints
// ================

/// Request for POST /ratings. `rating` may be a JSON integer or a string holding one.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RateBookRequest {
  #[serde(default)]
  pub book_title: String,

  #[serde(default)]
  pub rating: serde_json::Value,
}

/// Response for POST /ratings
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RateBookResponse {
  pub book_title: String,
  pub rating: i64,
  pub outcome: UpsertOutcomeData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcomeData {
  Created,
  Updated,
}

impl From<UpsertOutcome> for UpsertOutcomeData {
  fn from(outcome: UpsertOutcome) -> Self {
    match outcome {
      UpsertOutcome::Created => Self::Created,
      UpsertOutcome::Updated => Self::Updated,
    }
  }
}

/// Response for GET /ratings
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RatingsResponse {
  pub ratings: BTreeMap<String, i64>,
  pub count: usize,
}

// Helper Functions
// ================

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), resolved: version.to_string() }
  }
}

impl ApiError {
  /// Create a new API error
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }

  pub fn with_context(mut self, context: serde_json::Value) -> Self {
    self.context = context;
    self
  }
}
