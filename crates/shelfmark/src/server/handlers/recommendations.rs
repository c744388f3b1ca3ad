//! Recommendation endpoint handler

use axum::{
  extract::{rejection::JsonRejection, Extension, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use uuid::Uuid;

use super::{failure, invalid_request, ApiFailure};
use crate::recommend::NO_RECOMMENDATIONS_MESSAGE;
use crate::server::middleware::RequestContext;
use crate::server::state::AppState;
use crate::server::types::{ApiError, BaseResponse, RecommendRequest, RecommendResponse, RecommendationData};

/// POST /recommendations - Recommend books similar to a title
pub async fn recommend(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<ResponseJson<BaseResponse<RecommendResponse>>, ApiFailure> {
  let transaction_id = Uuid::new_v4();
  let Json(request) =
    payload.map_err(|rejection| invalid_request(rejection.status(), rejection.body_text(), transaction_id))?;

  if request.title.trim().is_empty() {
    let error = ApiError::new("missing_title", "A book title is required");
    return Err(failure(StatusCode::BAD_REQUEST, error, transaction_id));
  }

  let no_match = || {
    let error = ApiError::new("no_recommendations", NO_RECOMMENDATIONS_MESSAGE)
      .with_context(serde_json::json!({ "query": request.title, "model": request.model }));
    failure(StatusCode::NOT_FOUND, error, transaction_id)
  };

  let Some(title) = state.recommender.resolve_title(&request.title) else {
    context.log_info(&format!("No similarity entry for '{}'", request.title), "recommendations");
    return Err(no_match());
  };

  let recommendations = state.recommender.recommend(&title, request.model);
  if recommendations.is_empty() {
    context.log_info(&format!("'{}' has no {} candidates in the catalog", title, request.model), "recommendations");
    return Err(no_match());
  }

  context.log_info(
    &format!("{} {} recommendations for '{}'", recommendations.len(), request.model, title),
    "recommendations",
  );

  let recommendations: Vec<RecommendationData> =
    recommendations.into_iter().map(RecommendationData::from).collect();
  let response = RecommendResponse {
    query: request.title.clone(),
    title,
    model: request.model,
    count: recommendations.len(),
    recommendations,
  };

  Ok(ResponseJson(BaseResponse::success(response, transaction_id)))
}
