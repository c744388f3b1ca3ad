//! Recommendation merger
//!
//! `Recommender` is the read-only context built once at startup from the
//! catalog and both similarity tables, then shared with every request.
//! Lookups match titles exactly; `resolve_title` is the single place where
//! user input is mapped onto a canonical title.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::catalog::{Catalog, PopularBooks};
use crate::config::Config;
use crate::error::Result;
use crate::similarity::{Signal, SimilarityIndex};

/// Shown whenever a query produces no recommendations
pub const NO_RECOMMENDATIONS_MESSAGE: &str = "No recommendations found!";

/// Upper bound on a hybrid list, whatever the configured limit
pub const MAX_HYBRID_RESULTS: usize = 5;

/// Recommendation strategy selectable by the user
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Model {
  Collaborative,
  Content,
  #[default]
  Hybrid,
}

impl fmt::Display for Model {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Model::Collaborative => write!(f, "collaborative"),
      Model::Content => write!(f, "content"),
      Model::Hybrid => write!(f, "hybrid"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
  pub title: String,
  pub author: String,
  pub image_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RecommenderOptions {
  pub hybrid_limit: usize,
  pub case_insensitive_lookup: bool,
}

impl Default for RecommenderOptions {
  fn default() -> Self {
    Self { hybrid_limit: 5, case_insensitive_lookup: true }
  }
}

impl From<&Config> for RecommenderOptions {
  fn from(config: &Config) -> Self {
    Self {
      hybrid_limit: config.hybrid_limit.min(MAX_HYBRID_RESULTS),
      case_insensitive_lookup: config.case_insensitive_lookup,
    }
  }
}

pub struct Recommender {
  catalog: Catalog,
  popular: PopularBooks,
  collaborative: SimilarityIndex,
  content: SimilarityIndex,
  /// lowercase title -> canonical title, collaborative titles first
  folded_titles: HashMap<String, String>,
  options: RecommenderOptions,
}

impl Recommender {
  pub fn new(
    catalog: Catalog,
    popular: PopularBooks,
    collaborative: SimilarityIndex,
    content: SimilarityIndex,
    options: RecommenderOptions,
  ) -> Self {
    let mut folded_titles = HashMap::new();
    for title in collaborative.titles().chain(content.titles()) {
      folded_titles.entry(title.to_lowercase()).or_insert_with(|| title.to_string());
    }

    Self { catalog, popular, collaborative, content, folded_titles, options }
  }

  /// Load every asset named by the configuration. Any failure is fatal to startup.
  pub fn load(config: &Config) -> Result<Self> {
    let catalog = Catalog::load(&config.books_path())?;
    let popular = PopularBooks::load(&config.popular_path())?;
    let collaborative =
      SimilarityIndex::load(&config.collaborative_path(), Signal::Collaborative, config.candidate_limit)?;
    let content = SimilarityIndex::load(&config.content_path(), Signal::Content, config.candidate_limit)?;

    Ok(Self::new(catalog, popular, collaborative, content, RecommenderOptions::from(config)))
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn popular(&self) -> &PopularBooks {
    &self.popular
  }

  pub fn index(&self, signal: Signal) -> &SimilarityIndex {
    match signal {
      Signal::Collaborative => &self.collaborative,
      Signal::Content => &self.content,
    }
  }

  /// Map user input onto a title known to either similarity table
  pub fn resolve_title(&self, input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
      return None;
    }
    if self.collaborative.contains(input) || self.content.contains(input) {
      return Some(input.to_string());
    }
    if self.options.case_insensitive_lookup {
      return self.folded_titles.get(&input.to_lowercase()).cloned();
    }
    None
  }

  pub fn collaborative_recommend(&self, title: &str) -> Vec<Recommendation> {
    self.single_signal(Signal::Collaborative, title)
  }

  pub fn content_recommend(&self, title: &str) -> Vec<Recommendation> {
    self.single_signal(Signal::Content, title)
  }

  /// Interleave both signals, skipping titles already emitted and the query itself
  pub fn hybrid_recommend(&self, title: &str) -> Vec<Recommendation> {
    let collaborative = self.collaborative_recommend(title);
    let content = self.content_recommend(title);
    interleave(title, collaborative, content, self.options.hybrid_limit.min(MAX_HYBRID_RESULTS))
  }

  pub fn recommend(&self, title: &str, model: Model) -> Vec<Recommendation> {
    match model {
      Model::Collaborative => self.collaborative_recommend(title),
      Model::Content => self.content_recommend(title),
      Model::Hybrid => self.hybrid_recommend(title),
    }
  }

  fn single_signal(&self, signal: Signal, title: &str) -> Vec<Recommendation> {
    self
      .index(signal)
      .rank(title)
      .iter()
      .filter_map(|candidate| match self.catalog.lookup(&candidate.title) {
        Some(book) => Some(Recommendation {
          title: book.title.clone(),
          author: book.author.clone(),
          image_url: book.image_url.clone(),
        }),
        None => {
          tracing::debug!("Dropping {} candidate '{}': not in catalog", signal, candidate.title);
          None
        }
      })
      .collect()
  }
}

/// Round-robin merge of two ranked lists, collaborative first at each rank
pub fn interleave(
  query: &str,
  collaborative: Vec<Recommendation>,
  content: Vec<Recommendation>,
  limit: usize,
) -> Vec<Recommendation> {
  let mut seen: HashSet<String> = HashSet::from([query.to_string()]);
  let mut merged = Vec::new();

  let mut collaborative = collaborative.into_iter();
  let mut content = content.into_iter();
  loop {
    let pair = [collaborative.next(), content.next()];
    if pair.iter().all(Option::is_none) {
      break;
    }
    for candidate in pair.into_iter().flatten() {
      if seen.insert(candidate.title.clone()) {
        merged.push(candidate);
      }
    }
  }

  merged.truncate(limit);
  merged
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Book;

  fn rec(title: &str) -> Recommendation {
    Recommendation {
      title: title.to_string(),
      author: format!("{title} author"),
      image_url: format!("http://img/{title}.jpg"),
    }
  }

  fn titles_of(recommendations: &[Recommendation]) -> Vec<&str> {
    recommendations.iter().map(|r| r.title.as_str()).collect()
  }

  fn names(titles: &[&str]) -> Vec<String> {
    titles.iter().map(|t| t.to_string()).collect()
  }

  /// Matrix in which row i prefers columns in ascending order, except itself
  fn ordered_matrix(n: usize) -> Vec<Vec<f32>> {
    (0..n).map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.9 - j as f32 * 0.01 }).collect()).collect()
  }

  /// Matrix in which row i prefers columns in descending order, except itself
  fn reversed_matrix(n: usize) -> Vec<Vec<f32>> {
    (0..n).map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.5 + j as f32 * 0.01 }).collect()).collect()
  }

  fn recommender(catalog_titles: &[&str], collab: &[&str], content: &[&str]) -> Recommender {
    let catalog = Catalog::from_books(
      catalog_titles.iter().map(|t| Book::new(*t, format!("{t} author"), format!("http://img/{t}.jpg"))).collect(),
    );
    let collaborative =
      SimilarityIndex::from_matrix(Signal::Collaborative, names(collab), ordered_matrix(collab.len()), 6).unwrap();
    let content =
      SimilarityIndex::from_matrix(Signal::Content, names(content), reversed_matrix(content.len()), 6).unwrap();
    Recommender::new(catalog, PopularBooks::default(), collaborative, content, RecommenderOptions::default())
  }

  #[test]
  fn test_interleave_dedups_second_occurrence() {
    let merged = interleave("Q", vec![rec("X"), rec("Y")], vec![rec("Y"), rec("Z")], 5);
    assert_eq!(titles_of(&merged), vec!["X", "Y", "Z"]);
  }

  #[test]
  fn test_interleave_never_returns_query() {
    let merged = interleave("Q", vec![rec("Q"), rec("A")], vec![rec("B"), rec("Q")], 5);
    assert_eq!(titles_of(&merged), vec!["A", "B"]);
  }

  #[test]
  fn test_interleave_handles_uneven_lists_and_truncates() {
    let merged = interleave(
      "Q",
      vec![rec("A")],
      vec![rec("B"), rec("C"), rec("D"), rec("E"), rec("F"), rec("G")],
      5,
    );
    assert_eq!(titles_of(&merged), vec!["A", "B", "C", "D", "E"]);

    assert!(interleave("Q", Vec::new(), Vec::new(), 5).is_empty());
  }

  #[test]
  fn test_hybrid_alternates_signals() {
    let all = ["Q", "A", "B", "C", "D", "E", "F", "G"];
    let recommender = recommender(&all, &all, &all);

    // collaborative prefers A, B, C...; content prefers G, F, E...
    assert_eq!(titles_of(&recommender.collaborative_recommend("Q")), vec!["A", "B", "C", "D", "E", "F"]);
    assert_eq!(titles_of(&recommender.content_recommend("Q")), vec!["G", "F", "E", "D", "C", "B"]);
    assert_eq!(titles_of(&recommender.hybrid_recommend("Q")), vec!["A", "G", "B", "F", "C"]);
  }

  #[test]
  fn test_hybrid_output_bounded_and_excludes_query() {
    let all = ["Q", "A", "B", "C", "D", "E", "F", "G"];
    let recommender = recommender(&all, &all, &all);

    for title in all {
      let output = recommender.hybrid_recommend(title);
      assert!(output.len() <= 5);
      assert!(output.iter().all(|r| r.title != title));
    }
  }

  #[test]
  fn test_oversized_hybrid_limit_is_capped() {
    let all = ["Q", "A", "B", "C", "D", "E", "F", "G"];
    let mut recommender = recommender(&all, &all, &all);
    recommender.options.hybrid_limit = 10;

    assert_eq!(recommender.hybrid_recommend("Q").len(), MAX_HYBRID_RESULTS);
  }

  #[test]
  fn test_unknown_title_yields_empty_lists() {
    let recommender = recommender(&["Q", "A"], &["Q", "A"], &["Q", "A"]);
    for model in [Model::Collaborative, Model::Content, Model::Hybrid] {
      assert!(recommender.recommend("Nowhere", model).is_empty());
    }
  }

  #[test]
  fn test_candidates_missing_from_catalog_are_dropped() {
    let recommender = recommender(&["Q", "B"], &["Q", "A", "B"], &["Q", "A", "B"]);
    assert_eq!(titles_of(&recommender.collaborative_recommend("Q")), vec!["B"]);
    assert_eq!(titles_of(&recommender.hybrid_recommend("Q")), vec!["B"]);
  }

  #[test]
  fn test_single_signal_keeps_first_catalog_row() {
    let catalog = Catalog::from_books(vec![
      Book::new("Q", "q", ""),
      Book::new("A", "First Author", "http://img/a1.jpg"),
      Book::new("A", "Second Author", "http://img/a2.jpg"),
    ]);
    let index = || {
      SimilarityIndex::from_matrix(Signal::Collaborative, names(&["Q", "A"]), ordered_matrix(2), 6).unwrap()
    };
    let recommender =
      Recommender::new(catalog, PopularBooks::default(), index(), index(), RecommenderOptions::default());

    let output = recommender.collaborative_recommend("Q");
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].author, "First Author");
  }

  #[test]
  fn test_resolve_title_policy() {
    let recommender = recommender(&["Dune"], &["Dune", "Emma"], &["Emma", "Persuasion"]);

    assert_eq!(recommender.resolve_title("Dune").as_deref(), Some("Dune"));
    assert_eq!(recommender.resolve_title("  Persuasion ").as_deref(), Some("Persuasion"));
    assert_eq!(recommender.resolve_title("dUNE").as_deref(), Some("Dune"));
    assert_eq!(recommender.resolve_title("   "), None);
    assert_eq!(recommender.resolve_title("Middlemarch"), None);
  }

  #[test]
  fn test_resolve_title_exact_only_when_folding_disabled() {
    let index = |titles: &[&str]| {
      SimilarityIndex::from_matrix(Signal::Content, names(titles), ordered_matrix(titles.len()), 6).unwrap()
    };
    let recommender = Recommender::new(
      Catalog::default(),
      PopularBooks::default(),
      index(&["Dune", "Emma"]),
      index(&["Dune", "Emma"]),
      RecommenderOptions { hybrid_limit: 5, case_insensitive_lookup: false },
    );

    assert_eq!(recommender.resolve_title("Dune").as_deref(), Some("Dune"));
    assert_eq!(recommender.resolve_title("dune"), None);
  }

  #[test]
  fn test_model_parses_lowercase_names() {
    let model: Model = serde_json::from_str("\"content\"").unwrap();
    assert_eq!(model, Model::Content);
    assert_eq!(Model::default(), Model::Hybrid);
    assert_eq!(Model::Collaborative.to_string(), "collaborative");
  }
}
