//! Display formatting utilities for CLI output

use colored::*;
use std::collections::BTreeMap;

use crate::catalog::PopularBook;
use crate::recommend::{Model, Recommendation};
use crate::session::SessionId;

pub fn display_recommendations(query: &str, model: Model, recommendations: &[Recommendation]) {
  println!("{} {} recommendations for {}", "📚".cyan(), model.to_string().blue().bold(), query.yellow());

  for (rank, book) in recommendations.iter().enumerate() {
    println!("  {}. {} {}", rank + 1, book.title.bold(), format!("by {}", book.author).dimmed());
  }
}

pub fn display_popular(books: &[PopularBook]) {
  let width = books.iter().map(|book| book.title.chars().count()).max().unwrap_or(0).min(60);

  for (rank, book) in books.iter().enumerate() {
    println!(
      "{:>3}. {}  {}  {}",
      rank + 1,
      format!("{:<width$}", truncate(&book.title, width)).bold(),
      format!("★ {:.2}", book.avg_rating).yellow(),
      format!("({} ratings)", book.num_ratings).dimmed(),
    );
  }
}

pub fn display_ratings(session: &SessionId, ratings: &BTreeMap<String, i64>) {
  println!("{} Ratings for session {}", "📝".cyan(), session.as_str().yellow());
  for (title, rating) in ratings {
    println!("  {} {}", format!("{rating:>3}").green().bold(), title);
  }
}

/// Shorten to `width` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> String {
  if text.chars().count() <= width {
    return text.to_string();
  }
  let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
  shortened.push('…');
  shortened
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_leaves_short_text_alone() {
    assert_eq!(truncate("Dune", 10), "Dune");
  }

  #[test]
  fn test_truncate_marks_cut() {
    let shortened = truncate("The Lord of the Rings", 8);
    assert_eq!(shortened.chars().count(), 8);
    assert!(shortened.ends_with('…'));
  }
}
