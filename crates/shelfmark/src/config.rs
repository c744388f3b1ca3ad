//! Configuration management for Shelfmark
//!
//! Handles locating and loading the JSON configuration file, applying
//! environment overrides, and resolving asset paths against the data directory.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShelfmarkError};
use crate::recommend::MAX_HYBRID_RESULTS;
use crate::similarity::MAX_CANDIDATES;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
  /// Directory holding the precomputed CSV assets
  #[serde(default = "default_data_dir")]
  pub data_dir: PathBuf,
  /// Book catalog (title, author, cover image)
  #[serde(default = "default_books_file")]
  pub books_file: PathBuf,
  /// Precomputed popularity table
  #[serde(default = "default_popular_file")]
  pub popular_file: PathBuf,
  /// Collaborative similarity matrix
  #[serde(default = "default_collaborative_file")]
  pub collaborative_file: PathBuf,
  /// Content similarity matrix
  #[serde(default = "default_content_file")]
  pub content_file: PathBuf,
  /// SQLite database holding user ratings
  #[serde(default = "default_database_path")]
  pub database_path: PathBuf,
  /// Server bind address
  #[serde(default = "default_bind")]
  pub bind: SocketAddr,
  /// Candidates kept per signal after dropping the query book
  #[serde(default = "default_candidate_limit")]
  pub candidate_limit: usize,
  /// Maximum length of a hybrid recommendation list
  #[serde(default = "default_hybrid_limit")]
  pub hybrid_limit: usize,
  /// Default number of popular books returned
  #[serde(default = "default_popular_limit")]
  pub popular_limit: usize,
  /// Resolve user-entered titles case-insensitively when there is no exact match
  #[serde(default = "default_case_insensitive_lookup")]
  pub case_insensitive_lookup: bool,
  /// Inclusive [min, max] accepted by the rating endpoint; unbounded when unset
  #[serde(default)]
  pub rating_bounds: Option<(i64, i64)>,
  /// Secret used to sign session cookies
  #[serde(default, skip_serializing)]
  pub session_secret: Option<String>,
}

fn default_data_dir() -> PathBuf {
  PathBuf::from("data")
}
fn default_books_file() -> PathBuf {
  PathBuf::from("books.csv")
}
fn default_popular_file() -> PathBuf {
  PathBuf::from("popular.csv")
}
fn default_collaborative_file() -> PathBuf {
  PathBuf::from("collaborative.csv")
}
fn default_content_file() -> PathBuf {
  PathBuf::from("content.csv")
}
fn default_database_path() -> PathBuf {
  PathBuf::from("book_recommender.db")
}
fn default_bind() -> SocketAddr {
  SocketAddr::from(([127, 0, 0, 1], 5000))
}
fn default_candidate_limit() -> usize {
  6
}
fn default_hybrid_limit() -> usize {
  5
}
fn default_popular_limit() -> usize {
  50
}
fn default_case_insensitive_lookup() -> bool {
  true
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      books_file: default_books_file(),
      popular_file: default_popular_file(),
      collaborative_file: default_collaborative_file(),
      content_file: default_content_file(),
      database_path: default_database_path(),
      bind: default_bind(),
      candidate_limit: default_candidate_limit(),
      hybrid_limit: default_hybrid_limit(),
      popular_limit: default_popular_limit(),
      case_insensitive_lookup: default_case_insensitive_lookup(),
      rating_bounds: None,
      session_secret: None,
    }
  }
}

impl Config {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|e| ShelfmarkError::config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
      .map_err(|e| ShelfmarkError::config(format!("cannot parse {}: {e}", path.display())))
  }

  /// Load configuration from an explicit path, the usual search locations, or defaults,
  /// then apply environment overrides and validate
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let mut config = match explicit {
      Some(path) => Self::load_from_file(path)?,
      None => match Self::search_paths().into_iter().find(|p| p.exists()) {
        Some(path) => Self::load_from_file(path)?,
        None => Config::default(),
      },
    };

    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
  }

  fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("shelfmark.json"), PathBuf::from(".shelfmark.json")];
    if let Some(dir) = dirs::config_dir() {
      paths.push(dir.join("shelfmark").join("config.json"));
    }
    paths
  }

  fn apply_env_overrides(&mut self) -> Result<()> {
    if let Ok(dir) = std::env::var("SHELFMARK_DATA_DIR") {
      self.data_dir = PathBuf::from(dir);
    }
    if let Ok(db) = std::env::var("SHELFMARK_DATABASE") {
      self.database_path = PathBuf::from(db);
    }
    if let Ok(bind) = std::env::var("SHELFMARK_BIND") {
      self.bind = bind
        .parse()
        .map_err(|e| ShelfmarkError::config(format!("SHELFMARK_BIND '{bind}': {e}")))?;
    }
    if let Ok(secret) = std::env::var("SHELFMARK_SESSION_SECRET") {
      self.session_secret = Some(secret);
    }
    Ok(())
  }

  /// Reject settings the recommender cannot work with
  pub fn validate(&self) -> Result<()> {
    if !(1..=MAX_CANDIDATES).contains(&self.candidate_limit) {
      return Err(ShelfmarkError::config(format!("candidate_limit must be between 1 and {MAX_CANDIDATES}")));
    }
    if !(1..=MAX_HYBRID_RESULTS).contains(&self.hybrid_limit) {
      return Err(ShelfmarkError::config(format!("hybrid_limit must be between 1 and {MAX_HYBRID_RESULTS}")));
    }
    if let Some((min, max)) = self.rating_bounds {
      if min > max {
        return Err(ShelfmarkError::config(format!("rating_bounds [{min}, {max}] is inverted")));
      }
    }
    if matches!(&self.session_secret, Some(secret) if secret.is_empty()) {
      return Err(ShelfmarkError::config("session_secret must not be empty"));
    }
    Ok(())
  }

  /// Resolve an asset file name against the data directory
  pub fn asset_path(&self, file: &Path) -> PathBuf {
    if file.is_absolute() {
      file.to_path_buf()
    } else {
      self.data_dir.join(file)
    }
  }

  pub fn books_path(&self) -> PathBuf {
    self.asset_path(&self.books_file)
  }

  pub fn popular_path(&self) -> PathBuf {
    self.asset_path(&self.popular_file)
  }

  pub fn collaborative_path(&self) -> PathBuf {
    self.asset_path(&self.collaborative_file)
  }

  pub fn content_path(&self) -> PathBuf {
    self.asset_path(&self.content_file)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.candidate_limit, 6);
    assert_eq!(config.hybrid_limit, 5);
    assert!(config.case_insensitive_lookup);
    assert!(config.rating_bounds.is_none());
    assert_eq!(config.books_path(), PathBuf::from("data/books.csv"));
  }

  #[test]
  fn test_config_load_nonexistent_file() {
    let result = Config::load_from_file(Path::new("nonexistent.json"));
    assert!(matches!(result, Err(ShelfmarkError::Config { .. })));
  }

  #[test]
  fn test_config_load_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("shelfmark.json");
    std::fs::write(
      &config_path,
      r#"{
        "data_dir": "/srv/books",
        "hybrid_limit": 3,
        "rating_bounds": [1, 10]
      }"#,
    )
    .unwrap();

    let config = Config::load_from_file(&config_path).unwrap();
    assert_eq!(config.data_dir, PathBuf::from("/srv/books"));
    assert_eq!(config.hybrid_limit, 3);
    assert_eq!(config.candidate_limit, 6);
    assert_eq!(config.rating_bounds, Some((1, 10)));
    assert_eq!(config.content_path(), PathBuf::from("/srv/books/content.csv"));
  }

  #[test]
  fn test_absolute_asset_paths_ignore_data_dir() {
    let config = Config { popular_file: PathBuf::from("/tmp/popular.csv"), ..Config::default() };
    assert_eq!(config.popular_path(), PathBuf::from("/tmp/popular.csv"));
  }

  #[test]
  fn test_validate_rejects_bad_settings() {
    let config = Config { candidate_limit: 0, ..Config::default() };
    assert!(config.validate().is_err());

    let config = Config { hybrid_limit: 0, ..Config::default() };
    assert!(config.validate().is_err());

    let config = Config { candidate_limit: 7, ..Config::default() };
    assert!(config.validate().is_err());

    let config = Config { hybrid_limit: 6, ..Config::default() };
    assert!(config.validate().is_err());

    let config = Config { candidate_limit: 3, hybrid_limit: 2, ..Config::default() };
    assert!(config.validate().is_ok());

    let config = Config { rating_bounds: Some((10, 1)), ..Config::default() };
    assert!(config.validate().is_err());

    let config = Config { session_secret: Some(String::new()), ..Config::default() };
    assert!(config.validate().is_err());

    assert!(Config::default().validate().is_ok());
  }

  #[test]
  fn test_session_secret_is_never_serialized() {
    let config = Config { session_secret: Some("hunter2".to_string()), ..Config::default() };
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("hunter2"));
  }
}
