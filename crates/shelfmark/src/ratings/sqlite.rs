//! SQLite-backed rating store
//!
//! One connection behind a mutex; every upsert runs in a `BEGIN IMMEDIATE`
//! transaction so the existence check and the write cannot interleave with
//! another writer, in this process or another.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{Rating, RatingStore, UpsertOutcome};
use crate::error::{Result, ShelfmarkError};
use crate::session::SessionId;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteRatingStore {
  db: Mutex<Connection>,
}

impl SqliteRatingStore {
  /// Open or create the database file and make sure the schema exists
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)
        .map_err(|e| ShelfmarkError::store(format!("cannot create {}: {e}", parent.display())))?;
    }

    let db = Connection::open(path)?;
    db.busy_timeout(BUSY_TIMEOUT)?;
    // WAL keeps readers from blocking the single writer; returns the mode as a row
    db.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    Self::init_schema(&db)?;

    tracing::info!("Opened rating store at {}", path.display());
    Ok(Self { db: Mutex::new(db) })
  }

  /// Private in-memory database, used by tests and dry runs
  pub fn open_in_memory() -> Result<Self> {
    let db = Connection::open_in_memory()?;
    Self::init_schema(&db)?;
    Ok(Self { db: Mutex::new(db) })
  }

  /// Idempotent schema creation
  pub fn init_schema(db: &Connection) -> Result<()> {
    db.execute_batch(
      "CREATE TABLE IF NOT EXISTS user_ratings (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         session_id TEXT NOT NULL,
         book_title TEXT NOT NULL,
         rating INTEGER NOT NULL,
         timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
       );
       CREATE INDEX IF NOT EXISTS idx_user_ratings_session_title
         ON user_ratings (session_id, book_title);",
    )?;
    Ok(())
  }

  fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
    self.db.lock().map_err(|_| ShelfmarkError::store("rating store lock poisoned"))
  }

  /// Total number of stored rows across all sessions
  pub fn row_count(&self) -> Result<usize> {
    let db = self.connection()?;
    let count: i64 = db.query_row("SELECT COUNT(*) FROM user_ratings", [], |row| row.get(0))?;
    Ok(count as usize)
  }
}

impl RatingStore for SqliteRatingStore {
  fn upsert_rating(&self, session: &SessionId, book_title: &str, rating: i64) -> Result<UpsertOutcome> {
    let mut db = self.connection()?;
    let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: Option<i64> = tx
      .query_row(
        "SELECT id FROM user_ratings WHERE session_id = ?1 AND book_title = ?2 ORDER BY id LIMIT 1",
        params![session.as_str(), book_title],
        |row| row.get(0),
      )
      .optional()?;

    let outcome = match existing {
      Some(id) => {
        tx.execute("UPDATE user_ratings SET rating = ?1 WHERE id = ?2", params![rating, id])?;
        UpsertOutcome::Updated
      }
      None => {
        tx.execute(
          "INSERT INTO user_ratings (session_id, book_title, rating, timestamp) VALUES (?1, ?2, ?3, ?4)",
          params![session.as_str(), book_title, rating, Utc::now()],
        )?;
        UpsertOutcome::Created
      }
    };

    tx.commit()?;
    tracing::debug!("Rating {:?} for session {} on '{}' = {}", outcome, session, book_title, rating);
    Ok(outcome)
  }

  fn ratings_for_session(&self, session: &SessionId) -> Result<BTreeMap<String, i64>> {
    let db = self.connection()?;
    let mut stmt =
      db.prepare("SELECT book_title, rating FROM user_ratings WHERE session_id = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![session.as_str()], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut ratings = BTreeMap::new();
    for row in rows {
      let (title, rating) = row?;
      // Duplicate rows written outside this store resolve to the oldest
      ratings.entry(title).or_insert(rating);
    }
    Ok(ratings)
  }

  fn get_rating(&self, session: &SessionId, book_title: &str) -> Result<Option<Rating>> {
    let db = self.connection()?;
    let row = db
      .query_row(
        "SELECT rating, timestamp FROM user_ratings
         WHERE session_id = ?1 AND book_title = ?2 ORDER BY id LIMIT 1",
        params![session.as_str(), book_title],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, DateTime<Utc>>(1)?)),
      )
      .optional()?;

    Ok(row.map(|(rating, timestamp)| Rating {
      session_id: session.clone(),
      book_title: book_title.to_string(),
      rating,
      timestamp,
    }))
  }
}
