use anyhow::{Context, Result};
use colored::*;

use crate::cli::display::{display_popular, display_ratings, display_recommendations};
use crate::config::Config;
use crate::ratings::{check_bounds, parse_rating, validate_title, RatingStore, SqliteRatingStore, UpsertOutcome};
use crate::recommend::{Model, Recommender, NO_RECOMMENDATIONS_MESSAGE};
use crate::session::SessionId;

fn load_recommender(config: &Config) -> Result<Recommender> {
  Recommender::load(config)
    .with_context(|| format!("Failed to load recommendation assets from {}", config.data_dir.display()))
}

fn open_store(config: &Config) -> Result<SqliteRatingStore> {
  SqliteRatingStore::open(&config.database_path)
    .with_context(|| format!("Failed to open rating store at {}", config.database_path.display()))
}

/// Print recommendations for a title
pub fn recommend(config: &Config, title: &str, model: Model) -> Result<()> {
  let recommender = load_recommender(config)?;

  let recommendations = recommender
    .resolve_title(title)
    .map(|resolved| recommender.recommend(&resolved, model))
    .unwrap_or_default();

  if recommendations.is_empty() {
    println!("{}", NO_RECOMMENDATIONS_MESSAGE.yellow());
    return Ok(());
  }

  display_recommendations(title, model, &recommendations);
  Ok(())
}

/// Print the popularity ranking
pub fn popular(config: &Config, limit: Option<usize>) -> Result<()> {
  let recommender = load_recommender(config)?;
  let books = recommender.popular().top(limit.unwrap_or(config.popular_limit));

  if books.is_empty() {
    println!("No popular books found.");
    return Ok(());
  }

  display_popular(books);
  Ok(())
}

/// Create the ratings schema
pub fn init_db(config: &Config) -> Result<()> {
  open_store(config)?;
  println!("{} Database setup complete.", "✓".green());
  println!("   {}", config.database_path.display().to_string().dimmed());
  Ok(())
}

/// Upsert a rating on behalf of a session
pub fn rate(config: &Config, session: &str, title: &str, rating: &str) -> Result<()> {
  let session = SessionId::parse(session)?;
  let title = validate_title(title)?;
  let rating = check_bounds(parse_rating(rating)?, config.rating_bounds)?;

  let store = open_store(config)?;
  let outcome = store.upsert_rating(&session, title, rating)?;

  let verb = match outcome {
    UpsertOutcome::Created => "Created",
    UpsertOutcome::Updated => "Updated",
  };
  println!("{} {} rating {} for {}", "✓".green(), verb, rating.to_string().yellow(), title.cyan());
  Ok(())
}

/// List every rating a session has submitted
pub fn ratings(config: &Config, session: &str) -> Result<()> {
  let session = SessionId::parse(session)?;
  let store = open_store(config)?;
  let ratings = store.ratings_for_session(&session)?;

  if ratings.is_empty() {
    println!("No ratings found for session {}", session.as_str().yellow());
    return Ok(());
  }

  display_ratings(&session, &ratings);
  Ok(())
}

/// Serve the REST API until the process is stopped
pub async fn serve(config: &Config) -> Result<()> {
  crate::server::start_server(config).await
}
