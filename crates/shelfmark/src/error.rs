//! Error taxonomy for the recommendation core and the rating store
//!
//! Absent titles are not errors: an unknown query title produces an empty
//! recommendation list.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfmarkError {
  #[error("Invalid {field}: {message}")]
  Validation { field: String, message: String },

  #[error("Rating store failure: {message}")]
  Store { message: String },

  #[error("Failed to load asset {path}: {message}")]
  AssetLoad { path: String, message: String },

  #[error("Invalid configuration: {message}")]
  Config { message: String },
}

impl ShelfmarkError {
  pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Validation { field: field.into(), message: message.into() }
  }

  pub fn store(message: impl Into<String>) -> Self {
    Self::Store { message: message.into() }
  }

  pub fn asset_load(path: &Path, message: impl Into<String>) -> Self {
    Self::AssetLoad { path: path.display().to_string(), message: message.into() }
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::Config { message: message.into() }
  }

  /// True for errors caused by the caller's input rather than the system
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation { .. })
  }
}

impl From<rusqlite::Error> for ShelfmarkError {
  fn from(error: rusqlite::Error) -> Self {
    Self::store(error.to_string())
  }
}

pub type Result<T> = std::result::Result<T, ShelfmarkError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages_name_the_failing_part() {
    let err = ShelfmarkError::validation("rating", "'abc' is not an integer");
    assert_eq!(err.to_string(), "Invalid rating: 'abc' is not an integer");
    assert!(err.is_validation());

    let err = ShelfmarkError::asset_load(Path::new("data/books.csv"), "file not found");
    assert!(err.to_string().contains("data/books.csv"));
    assert!(!err.is_validation());
  }

  #[test]
  fn test_sqlite_errors_become_store_errors() {
    let err: ShelfmarkError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, ShelfmarkError::Store { .. }));
  }
}
