//! CSV access shared by the catalog and similarity loaders

use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

use crate::error::{Result, ShelfmarkError};

/// Open a headed CSV file, mapping any failure to an asset load error
pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
  if !path.exists() {
    return Err(ShelfmarkError::asset_load(path, "file not found"));
  }
  csv::ReaderBuilder::new()
    .has_headers(true)
    .trim(csv::Trim::Fields)
    .from_path(path)
    .map_err(|e| ShelfmarkError::asset_load(path, format!("failed to open CSV: {e}")))
}

/// Deserialize every row of a headed CSV file. Unknown columns are ignored.
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
  let mut reader = open_reader(path)?;
  let mut rows = Vec::new();

  for (index, record) in reader.deserialize::<T>().enumerate() {
    // +2: one for the header row, one for 1-based line numbers
    let row = record
      .map_err(|e| ShelfmarkError::asset_load(path, format!("line {}: {e}", index + 2)))?;
    rows.push(row);
  }

  if rows.is_empty() {
    return Err(ShelfmarkError::asset_load(path, "table is empty"));
  }

  Ok(rows)
}
