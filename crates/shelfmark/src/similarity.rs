//! Precomputed similarity tables
//!
//! Each signal (collaborative, content) ships as a square score matrix. At
//! load time every row is ranked once and truncated to the configured
//! candidate limit, so a lookup is a hash probe plus a slice borrow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::assets::open_reader;
use crate::error::{Result, ShelfmarkError};

/// Upper bound on neighbours kept per title, whatever the configured limit
pub const MAX_CANDIDATES: usize = 6;

/// Which similarity table produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
  Collaborative,
  Content,
}

impl fmt::Display for Signal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Signal::Collaborative => write!(f, "collaborative"),
      Signal::Content => write!(f, "content"),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTitle {
  pub title: String,
  pub score: f32,
}

#[derive(Debug)]
pub struct SimilarityIndex {
  signal: Signal,
  /// Titles in matrix order
  titles: Vec<String>,
  /// Title -> ranked neighbours, query book excluded
  ranked: HashMap<String, Vec<ScoredTitle>>,
}

impl SimilarityIndex {
  /// Rank a square matrix. `scores[i][j]` is the similarity of `titles[i]` to `titles[j]`.
  pub fn from_matrix(
    signal: Signal,
    titles: Vec<String>,
    scores: Vec<Vec<f32>>,
    candidate_limit: usize,
  ) -> Result<Self> {
    let candidate_limit = candidate_limit.min(MAX_CANDIDATES);
    let n = titles.len();
    if scores.len() != n {
      return Err(ShelfmarkError::validation(
        "similarity matrix",
        format!("{n} titles but {} score rows", scores.len()),
      ));
    }

    let mut ranked = HashMap::with_capacity(n);
    for (row_index, row) in scores.iter().enumerate() {
      if row.len() != n {
        return Err(ShelfmarkError::validation(
          "similarity matrix",
          format!("row '{}' has {} scores, expected {n}", titles[row_index], row.len()),
        ));
      }
      if ranked.contains_key(&titles[row_index]) {
        // Repeated title: the first row already defines its neighbours
        continue;
      }
      let neighbours = rank_row(&titles, row, row_index, candidate_limit);
      ranked.insert(titles[row_index].clone(), neighbours);
    }

    Ok(Self { signal, titles, ranked })
  }

  /// Load a matrix CSV: header `title,<t1>,...,<tn>`, then one row per title in header order
  pub fn load(path: &Path, signal: Signal, candidate_limit: usize) -> Result<Self> {
    let mut reader = open_reader(path)?;
    let headers = reader
      .headers()
      .map_err(|e| ShelfmarkError::asset_load(path, format!("failed to read header: {e}")))?
      .clone();

    let titles: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    if titles.is_empty() {
      return Err(ShelfmarkError::asset_load(path, "matrix has no title columns"));
    }

    let mut scores = Vec::with_capacity(titles.len());
    for (row_index, record) in reader.records().enumerate() {
      let line = row_index + 2;
      let record =
        record.map_err(|e| ShelfmarkError::asset_load(path, format!("line {line}: {e}")))?;

      let row_title = record.get(0).unwrap_or_default();
      match titles.get(row_index) {
        Some(expected) if expected == row_title => {}
        Some(expected) => {
          return Err(ShelfmarkError::asset_load(
            path,
            format!("line {line}: row title '{row_title}' does not match column '{expected}'"),
          ));
        }
        None => {
          return Err(ShelfmarkError::asset_load(
            path,
            format!("line {line}: more rows than the {} title columns", titles.len()),
          ));
        }
      }

      let row = record
        .iter()
        .skip(1)
        .map(|cell| parse_score(cell))
        .collect::<std::result::Result<Vec<f32>, String>>()
        .map_err(|e| ShelfmarkError::asset_load(path, format!("line {line}: {e}")))?;
      scores.push(row);
    }

    if scores.is_empty() {
      return Err(ShelfmarkError::asset_load(path, "table is empty"));
    }

    let index = Self::from_matrix(signal, titles, scores, candidate_limit)
      .map_err(|e| ShelfmarkError::asset_load(path, e.to_string()))?;
    tracing::info!("Loaded {} similarity table with {} titles from {}", signal, index.len(), path.display());
    Ok(index)
  }

  pub fn signal(&self) -> Signal {
    self.signal
  }

  /// Ranked neighbours of `title`; empty for titles the table does not know
  pub fn rank(&self, title: &str) -> &[ScoredTitle] {
    self.ranked.get(title).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn contains(&self, title: &str) -> bool {
    self.ranked.contains_key(title)
  }

  /// Titles in matrix order, repeats included
  pub fn titles(&self) -> impl Iterator<Item = &str> {
    self.titles.iter().map(String::as_str)
  }

  /// Number of distinct titles
  pub fn len(&self) -> usize {
    self.ranked.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ranked.is_empty()
  }
}

fn parse_score(cell: &str) -> std::result::Result<f32, String> {
  let score: f32 = cell.parse().map_err(|_| format!("'{cell}' is not a number"))?;
  if !score.is_finite() {
    return Err(format!("'{cell}' is not a finite score"));
  }
  Ok(score)
}

/// Stable descending sort: equal scores keep column order
fn rank_row(titles: &[String], row: &[f32], own_column: usize, limit: usize) -> Vec<ScoredTitle> {
  let mut columns: Vec<usize> = (0..row.len()).filter(|&column| column != own_column).collect();
  columns.sort_by(|&a, &b| row[b].total_cmp(&row[a]));

  let mut seen = std::collections::HashSet::new();
  columns
    .into_iter()
    .filter(|&column| titles[column] != titles[own_column])
    .filter(|&column| seen.insert(titles[column].as_str()))
    .take(limit)
    .map(|column| ScoredTitle { title: titles[column].clone(), score: row[column] })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn titles(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
  }

  fn ranked_titles(index: &SimilarityIndex, title: &str) -> Vec<String> {
    index.rank(title).iter().map(|candidate| candidate.title.clone()).collect()
  }

  #[test]
  fn test_rank_orders_by_descending_score_and_excludes_query() {
    let index = SimilarityIndex::from_matrix(
      Signal::Collaborative,
      titles(&["A", "B", "C", "D"]),
      vec![
        vec![1.0, 0.2, 0.9, 0.5],
        vec![0.2, 1.0, 0.1, 0.3],
        vec![0.9, 0.1, 1.0, 0.4],
        vec![0.5, 0.3, 0.4, 1.0],
      ],
      6,
    )
    .unwrap();

    assert_eq!(ranked_titles(&index, "A"), vec!["C", "D", "B"]);
    assert_eq!(index.rank("A")[0].score, 0.9);
  }

  #[test]
  fn test_ties_keep_column_order() {
    let index = SimilarityIndex::from_matrix(
      Signal::Content,
      titles(&["Q", "X", "Y", "Z"]),
      vec![
        vec![1.0, 0.5, 0.5, 0.5],
        vec![0.5, 1.0, 0.0, 0.0],
        vec![0.5, 0.0, 1.0, 0.0],
        vec![0.5, 0.0, 0.0, 1.0],
      ],
      6,
    )
    .unwrap();

    assert_eq!(ranked_titles(&index, "Q"), vec!["X", "Y", "Z"]);
  }

  #[test]
  fn test_candidate_limit_caps_each_list() {
    let names = ["Q", "A", "B", "C", "D", "E", "F", "G", "H"];
    let n = names.len();
    let scores: Vec<Vec<f32>> = (0..n)
      .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 1.0 / (j as f32 + 2.0) }).collect())
      .collect();

    let index = SimilarityIndex::from_matrix(Signal::Collaborative, titles(&names), scores, 6).unwrap();
    assert_eq!(ranked_titles(&index, "Q"), vec!["A", "B", "C", "D", "E", "F"]);
  }

  #[test]
  fn test_oversized_candidate_limit_is_capped() {
    let names = ["Q", "A", "B", "C", "D", "E", "F", "G", "H"];
    let n = names.len();
    let scores: Vec<Vec<f32>> = (0..n)
      .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 1.0 / (j as f32 + 2.0) }).collect())
      .collect();

    let index = SimilarityIndex::from_matrix(Signal::Collaborative, titles(&names), scores, 50).unwrap();
    assert_eq!(index.rank("Q").len(), MAX_CANDIDATES);
  }

  #[test]
  fn test_unknown_title_ranks_nothing() {
    let index = SimilarityIndex::from_matrix(
      Signal::Collaborative,
      titles(&["A", "B"]),
      vec![vec![1.0, 0.5], vec![0.5, 1.0]],
      6,
    )
    .unwrap();

    assert!(index.rank("Missing").is_empty());
    assert!(index.rank("a").is_empty());
    assert!(!index.contains("Missing"));
  }

  #[test]
  fn test_non_square_matrix_is_rejected() {
    let result = SimilarityIndex::from_matrix(
      Signal::Collaborative,
      titles(&["A", "B"]),
      vec![vec![1.0, 0.5], vec![0.5]],
      6,
    );
    assert!(result.is_err());
  }

  #[test]
  fn test_load_matrix_csv() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("collaborative.csv");
    std::fs::write(
      &path,
      "title,Dune,Emma,Persuasion\n\
       Dune,1.0,0.1,0.2\n\
       Emma,0.1,1.0,0.8\n\
       Persuasion,0.2,0.8,1.0\n",
    )
    .unwrap();

    let index = SimilarityIndex::load(&path, Signal::Collaborative, 6).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.signal(), Signal::Collaborative);
    assert_eq!(ranked_titles(&index, "Emma"), vec!["Persuasion", "Dune"]);
  }

  #[test]
  fn test_load_rejects_mismatched_rows_and_bad_scores() {
    let temp = TempDir::new().unwrap();

    let swapped = temp.path().join("swapped.csv");
    std::fs::write(&swapped, "title,Dune,Emma\nEmma,0.1,1.0\nDune,1.0,0.1\n").unwrap();
    let err = SimilarityIndex::load(&swapped, Signal::Content, 6).unwrap_err();
    assert!(matches!(err, ShelfmarkError::AssetLoad { .. }));

    let nan = temp.path().join("nan.csv");
    std::fs::write(&nan, "title,Dune,Emma\nDune,1.0,NaN\nEmma,0.1,1.0\n").unwrap();
    assert!(SimilarityIndex::load(&nan, Signal::Content, 6).is_err());

    let short = temp.path().join("short.csv");
    std::fs::write(&short, "title,Dune,Emma\nDune,1.0,0.1\n").unwrap();
    assert!(SimilarityIndex::load(&short, Signal::Content, 6).is_err());

    let empty = temp.path().join("empty.csv");
    std::fs::write(&empty, "title,Dune,Emma\n").unwrap();
    assert!(SimilarityIndex::load(&empty, Signal::Content, 6).is_err());
  }
}
