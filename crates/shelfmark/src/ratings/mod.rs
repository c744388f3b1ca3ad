//! Per-session rating storage
//!
//! The store keeps at most one rating per (session, title). That invariant is
//! maintained by `upsert_rating`, not by a table constraint.

pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, ShelfmarkError};
use crate::session::SessionId;

pub use sqlite::SqliteRatingStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub session_id: SessionId,
  pub book_title: String,
  pub rating: i64,
  pub timestamp: DateTime<Utc>,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
  Created,
  Updated,
}

/// Durable session-partitioned rating storage
#[cfg_attr(test, mockall::automock)]
pub trait RatingStore: Send + Sync {
  /// Insert or overwrite the rating for (session, title). Updates keep the original timestamp.
  fn upsert_rating(&self, session: &SessionId, book_title: &str, rating: i64) -> Result<UpsertOutcome>;

  /// Every rating the session has made, keyed by title
  fn ratings_for_session(&self, session: &SessionId) -> Result<BTreeMap<String, i64>>;

  fn get_rating(&self, session: &SessionId, book_title: &str) -> Result<Option<Rating>>;
}

/// Parse user input as a rating value. Any integer is accepted; range checks are the caller's.
pub fn parse_rating(input: &str) -> Result<i64> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(ShelfmarkError::validation("rating", "a rating value is required"));
  }
  trimmed
    .parse::<i64>()
    .map_err(|_| ShelfmarkError::validation("rating", format!("'{trimmed}' is not an integer")))
}

/// Optional inclusive range check applied at the request boundary
pub fn check_bounds(rating: i64, bounds: Option<(i64, i64)>) -> Result<i64> {
  match bounds {
    Some((min, max)) if rating < min || rating > max => Err(ShelfmarkError::validation(
      "rating",
      format!("{rating} is outside the accepted range {min}..={max}"),
    )),
    _ => Ok(rating),
  }
}

/// Titles are stored verbatim; only blank titles are refused
pub fn validate_title(book_title: &str) -> Result<&str> {
  if book_title.trim().is_empty() {
    return Err(ShelfmarkError::validation("book_title", "a book title is required"));
  }
  Ok(book_title)
}
