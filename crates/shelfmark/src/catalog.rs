//! Book catalog and popularity table
//!
//! Both are loaded once at startup and never mutated. Titles are the natural
//! key; when the source file repeats a title, the first row wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::assets::read_rows;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
  pub title: String,
  pub author: String,
  pub image_url: String,
}

impl Book {
  pub fn new(title: impl Into<String>, author: impl Into<String>, image_url: impl Into<String>) -> Self {
    Self { title: title.into(), author: author.into(), image_url: image_url.into() }
  }
}

/// Row layout of the Book-Crossing style catalog export
#[derive(Debug, Deserialize)]
struct BookRow {
  #[serde(rename = "Book-Title", alias = "title")]
  title: String,
  #[serde(rename = "Book-Author", alias = "author", default)]
  author: String,
  #[serde(rename = "Image-URL-M", alias = "image_url", default)]
  image_url: String,
}

impl From<BookRow> for Book {
  fn from(row: BookRow) -> Self {
    Book { title: row.title, author: row.author, image_url: row.image_url }
  }
}

/// Read-only title -> book lookup
#[derive(Debug, Default)]
pub struct Catalog {
  books: Vec<Book>,
  by_title: HashMap<String, usize>,
}

impl Catalog {
  /// Build a catalog from rows in source order
  pub fn from_books(books: Vec<Book>) -> Self {
    let mut by_title = HashMap::with_capacity(books.len());
    for (position, book) in books.iter().enumerate() {
      by_title.entry(book.title.clone()).or_insert(position);
    }
    Self { books, by_title }
  }

  pub fn load(path: &Path) -> Result<Self> {
    let rows: Vec<BookRow> = read_rows(path)?;
    let catalog = Self::from_books(rows.into_iter().map(Book::from).collect());
    tracing::info!(
      "Loaded {} catalog rows ({} distinct titles) from {}",
      catalog.books.len(),
      catalog.by_title.len(),
      path.display()
    );
    Ok(catalog)
  }

  /// Exact, case-sensitive lookup; duplicates resolve to the first row
  pub fn lookup(&self, title: &str) -> Option<&Book> {
    self.by_title.get(title).map(|&position| &self.books[position])
  }

  /// Number of distinct titles
  pub fn len(&self) -> usize {
    self.by_title.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_title.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularBook {
  pub title: String,
  pub author: String,
  pub image_url: String,
  pub num_ratings: u64,
  pub avg_rating: f64,
}

#[derive(Debug, Deserialize)]
struct PopularRow {
  #[serde(rename = "Book-Title", alias = "title")]
  title: String,
  #[serde(rename = "Book-Author", alias = "Book-Author_x", alias = "author", default)]
  author: String,
  #[serde(rename = "Image-URL-M", alias = "Image-URL-L_x", alias = "image_url", default)]
  image_url: String,
  #[serde(rename = "num_ratings", alias = "number_rating")]
  num_ratings: u64,
  #[serde(rename = "avg_rating", alias = "average_rating")]
  avg_rating: f64,
}

/// Precomputed popularity ranking, kept in file order
#[derive(Debug, Default)]
pub struct PopularBooks {
  books: Vec<PopularBook>,
}

impl PopularBooks {
  pub fn new(books: Vec<PopularBook>) -> Self {
    Self { books }
  }

  pub fn load(path: &Path) -> Result<Self> {
    let rows: Vec<PopularRow> = read_rows(path)?;
    let books: Vec<PopularBook> = rows
      .into_iter()
      .map(|row| PopularBook {
        title: row.title,
        author: row.author,
        image_url: row.image_url,
        num_ratings: row.num_ratings,
        avg_rating: row.avg_rating,
      })
      .collect();
    tracing::info!("Loaded {} popular books from {}", books.len(), path.display());
    Ok(Self { books })
  }

  pub fn top(&self, limit: usize) -> &[PopularBook] {
    &self.books[..limit.min(self.books.len())]
  }

  pub fn len(&self) -> usize {
    self.books.len()
  }

  pub fn is_empty(&self) -> bool {
    self.books.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ShelfmarkError;
  use tempfile::TempDir;

  #[test]
  fn test_lookup_is_first_row_wins() {
    let catalog = Catalog::from_books(vec![
      Book::new("Dune", "Frank Herbert", "http://img/dune-1.jpg"),
      Book::new("Emma", "Jane Austen", "http://img/emma.jpg"),
      Book::new("Dune", "Someone Else", "http://img/dune-2.jpg"),
    ]);

    assert_eq!(catalog.len(), 2);
    let dune = catalog.lookup("Dune").unwrap();
    assert_eq!(dune.author, "Frank Herbert");
    assert_eq!(dune.image_url, "http://img/dune-1.jpg");
  }

  #[test]
  fn test_lookup_is_case_sensitive() {
    let catalog = Catalog::from_books(vec![Book::new("Dune", "Frank Herbert", "")]);
    assert!(catalog.lookup("dune").is_none());
    assert!(catalog.lookup("Dune ").is_none());
  }

  #[test]
  fn test_load_book_crossing_export() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("books.csv");
    std::fs::write(
      &path,
      "ISBN,Book-Title,Book-Author,Year-Of-Publication,Image-URL-M\n\
       0441013597,Dune,Frank Herbert,1965,http://img/dune.jpg\n\
       0141439580,\"Emma\",Jane Austen,1815,http://img/emma.jpg\n",
    )
    .unwrap();

    let catalog = Catalog::load(&path).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.lookup("Emma").unwrap().image_url, "http://img/emma.jpg");
  }

  #[test]
  fn test_load_missing_or_empty_catalog_fails() {
    let temp = TempDir::new().unwrap();
    let missing = Catalog::load(&temp.path().join("nope.csv"));
    assert!(matches!(missing, Err(ShelfmarkError::AssetLoad { .. })));

    let empty_path = temp.path().join("empty.csv");
    std::fs::write(&empty_path, "Book-Title,Book-Author,Image-URL-M\n").unwrap();
    let empty = Catalog::load(&empty_path);
    assert!(matches!(empty, Err(ShelfmarkError::AssetLoad { .. })));
  }

  #[test]
  fn test_load_popular_with_merge_suffixed_columns() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("popular.csv");
    std::fs::write(
      &path,
      "Book-Title,Book-Author_x,Image-URL-L_x,number_rating,average_rating\n\
       Dune,Frank Herbert,http://img/dune.jpg,412,8.1\n\
       Emma,Jane Austen,http://img/emma.jpg,300,7.4\n",
    )
    .unwrap();

    let popular = PopularBooks::load(&path).unwrap();
    assert_eq!(popular.len(), 2);
    assert_eq!(popular.top(1)[0].title, "Dune");
    assert_eq!(popular.top(1)[0].num_ratings, 412);
    assert_eq!(popular.top(10).len(), 2);
  }

  #[test]
  fn test_malformed_popular_row_reports_line() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("popular.csv");
    std::fs::write(
      &path,
      "Book-Title,Book-Author,Image-URL-M,num_ratings,avg_rating\n\
       Dune,Frank Herbert,http://img/dune.jpg,lots,8.1\n",
    )
    .unwrap();

    let err = PopularBooks::load(&path).unwrap_err();
    assert!(err.to_string().contains("line 2"));
  }
}
