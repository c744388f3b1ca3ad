pub mod books;
pub mod ratings;
pub mod recommendations;
pub mod status;

use axum::{http::StatusCode, response::Json};
use uuid::Uuid;

use crate::server::types::{ApiError, BaseResponse};

/// Error half of every handler result
pub type ApiFailure = (StatusCode, Json<BaseResponse<()>>);

pub(crate) fn failure(status: StatusCode, error: ApiError, transaction_id: Uuid) -> ApiFailure {
  (status, Json(BaseResponse::<()>::error(vec![error], transaction_id)))
}

/// Body or query string the extractors could not decode, kept in the envelope
pub(crate) fn invalid_request(status: StatusCode, message: String, transaction_id: Uuid) -> ApiFailure {
  tracing::debug!("Rejected request ({}): {}", status, message);
  failure(status, ApiError::new("invalid_request", &message), transaction_id)
}
