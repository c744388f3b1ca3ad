//! Status and version endpoint handlers

use axum::{extract::State, response::Json};
use schemars::schema_for;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::server::state::AppState;
use crate::server::types::{
  ApiInfoResponse, BaseResponse, PopularQuery, RateBookRequest, RecommendRequest, StatusResponse,
  VersionResponse,
};
use crate::similarity::Signal;

/// GET /status - Health check endpoint
pub async fn status(State(state): State<AppState>) -> Json<BaseResponse<StatusResponse>> {
  let recommender = &state.recommender;
  let response = StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    catalog_titles: recommender.catalog().len(),
    collaborative_titles: recommender.index(Signal::Collaborative).len(),
    content_titles: recommender.index(Signal::Content).len(),
  };

  Json(BaseResponse::success(response, Uuid::new_v4()))
}

/// GET /version - Returns current API version
pub async fn version() -> Json<BaseResponse<VersionResponse>> {
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };
  Json(BaseResponse::success(response, Uuid::new_v4()))
}

/// GET /api - Returns API version and request schemas
pub async fn api_info() -> Json<BaseResponse<ApiInfoResponse>> {
  let mut schemas = BTreeMap::new();
  schemas.insert("RecommendRequest".to_string(), schema_json(schema_for!(RecommendRequest)));
  schemas.insert("RateBookRequest".to_string(), schema_json(schema_for!(RateBookRequest)));
  schemas.insert("PopularQuery".to_string(), schema_json(schema_for!(PopularQuery)));

  let response = ApiInfoResponse { latest: env!("CARGO_PKG_VERSION").to_string(), schemas };
  Json(BaseResponse::success(response, Uuid::new_v4()))
}

fn schema_json(schema: schemars::schema::RootSchema) -> serde_json::Value {
  serde_json::to_value(schema).unwrap_or_default()
}
