//! Rating endpoint handlers
//!
//! Store calls run on the blocking pool; SQLite work never sits on an async worker.

use axum::{
  extract::{rejection::JsonRejection, Extension, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{failure, invalid_request, ApiFailure};
use crate::error::{Result, ShelfmarkError};
use crate::ratings::{check_bounds, parse_rating, validate_title, RatingStore};
use crate::server::middleware::RequestContext;
use crate::server::state::AppState;
use crate::server::types::{ApiError, BaseResponse, RateBookRequest, RateBookResponse, RatingsResponse};
use crate::session::SessionId;

pub const STORE_FAILURE_MESSAGE: &str = "Could not save rating";

/// POST /ratings - Create or update the session's rating for a book
pub async fn rate_book(
  State(state): State<AppState>,
  Extension(session): Extension<SessionId>,
  Extension(context): Extension<RequestContext>,
  payload: std::result::Result<Json<RateBookRequest>, JsonRejection>,
) -> std::result::Result<(StatusCode, ResponseJson<BaseResponse<RateBookResponse>>), ApiFailure> {
  let transaction_id = Uuid::new_v4();
  let Json(request) =
    payload.map_err(|rejection| invalid_request(rejection.status(), rejection.body_text(), transaction_id))?;

  let (book_title, rating) = match validate_request(&request, state.settings.rating_bounds) {
    Ok(valid) => valid,
    Err(e) => {
      context.log_warn(&format!("Rejected rating: {e}"), "ratings");
      return Err(failure(StatusCode::BAD_REQUEST, validation_error(&e), transaction_id));
    }
  };

  let store = Arc::clone(&state.ratings);
  let title = book_title.clone();
  let result =
    run_blocking(move || store.upsert_rating(&session, &title, rating)).await;

  match result {
    Ok(outcome) => {
      context.log_info(&format!("Rating for '{book_title}' {outcome:?}"), "ratings");
      let status = match outcome {
        crate::ratings::UpsertOutcome::Created => StatusCode::CREATED,
        crate::ratings::UpsertOutcome::Updated => StatusCode::OK,
      };
      let response = RateBookResponse { book_title, rating, outcome: outcome.into() };
      Ok((status, ResponseJson(BaseResponse::success(response, transaction_id))))
    }
    Err(e) => {
      context.log_error(&format!("Failed to store rating for '{book_title}': {e}"), "ratings");
      let error = ApiError::new("rating_store_failed", STORE_FAILURE_MESSAGE);
      Err(failure(StatusCode::INTERNAL_SERVER_ERROR, error, transaction_id))
    }
  }
}

/// GET /ratings - Ratings previously submitted by this session
pub async fn list_ratings(
  State(state): State<AppState>,
  Extension(session): Extension<SessionId>,
  Extension(context): Extension<RequestContext>,
) -> std::result::Result<ResponseJson<BaseResponse<RatingsResponse>>, ApiFailure> {
  let transaction_id = Uuid::new_v4();
  let store = Arc::clone(&state.ratings);

  match run_blocking(move || store.ratings_for_session(&session)).await {
    Ok(ratings) => {
      let count = ratings.len();
      Ok(ResponseJson(BaseResponse::success(RatingsResponse { ratings, count }, transaction_id)))
    }
    Err(e) => {
      context.log_error(&format!("Failed to read ratings: {e}"), "ratings");
      let error = ApiError::new("rating_store_failed", "Could not load ratings");
      Err(failure(StatusCode::INTERNAL_SERVER_ERROR, error, transaction_id))
    }
  }
}

fn validate_request(request: &RateBookRequest, bounds: Option<(i64, i64)>) -> Result<(String, i64)> {
  let title = validate_title(&request.book_title)?.to_string();
  let rating = rating_from_json(&request.rating)?;
  let rating = check_bounds(rating, bounds)?;
  Ok((title, rating))
}

/// Accept JSON integers and strings that parse as integers; nothing else
fn rating_from_json(value: &serde_json::Value) -> Result<i64> {
  match value {
    serde_json::Value::Number(number) => number
      .as_i64()
      .ok_or_else(|| ShelfmarkError::validation("rating", format!("'{number}' is not an integer"))),
    serde_json::Value::String(text) => parse_rating(text),
    serde_json::Value::Null => Err(ShelfmarkError::validation("rating", "a rating value is required")),
    other => Err(ShelfmarkError::validation("rating", format!("'{other}' is not an integer"))),
  }
}

fn validation_error(error: &ShelfmarkError) -> ApiError {
  match error {
    ShelfmarkError::Validation { field, message } if field == "book_title" => {
      ApiError::new("missing_title", message)
    }
    ShelfmarkError::Validation { message, .. } => ApiError::new("invalid_rating", message),
    other => ApiError::new("invalid_rating", &other.to_string()),
  }
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
  F: FnOnce() -> Result<T> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(work)
    .await
    .map_err(|e| ShelfmarkError::store(format!("rating task failed: {e}")))?
}
