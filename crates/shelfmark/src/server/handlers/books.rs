//! Popular books endpoint handler

use axum::{
  extract::{rejection::QueryRejection, Query, State},
  response::Json,
};
use uuid::Uuid;

use super::{invalid_request, ApiFailure};
use crate::server::state::AppState;
use crate::server::types::{BaseResponse, PopularBookData, PopularQuery, PopularResponse};

/// GET /books/popular - Precomputed popularity ranking
pub async fn popular(
  State(state): State<AppState>,
  query: Result<Query<PopularQuery>, QueryRejection>,
) -> Result<Json<BaseResponse<PopularResponse>>, ApiFailure> {
  let transaction_id = Uuid::new_v4();
  let Query(query) =
    query.map_err(|rejection| invalid_request(rejection.status(), rejection.body_text(), transaction_id))?;

  let limit = query.limit.unwrap_or(state.settings.popular_limit);
  let books: Vec<PopularBookData> =
    state.recommender.popular().top(limit).iter().map(PopularBookData::from).collect();

  let count = books.len();
  Ok(Json(BaseResponse::success(PopularResponse { books, count }, transaction_id)))
}
