//! Publication-year resolution.
//!
//! Corpus filenames encode a normalized DOI (the first underscore stands for
//! a slash). The year comes from the metadata table when the DOI is listed
//! there, otherwise from a 4-digit year embedded in the identifier.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::error::{Error, Result};

/// Publication years are only accepted inside this range.
pub const YEAR_MIN: i32 = 1900;
pub const YEAR_MAX: i32 = 2099;

static EMBEDDED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D((19|20)\d{2})\D").expect("valid regex"));

/// Identifier-to-year index loaded from the metadata CSV.
#[derive(Debug, Clone, Default)]
pub struct YearIndex {
    by_id: HashMap<String, i32>,
}

impl YearIndex {
    /// Load from a CSV with `DOI` and `PubYear` columns. Rows with a
    /// non-numeric or out-of-range year are dropped with a diagnostic.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let doi_col = headers.iter().position(|h| h == "DOI");
        let year_col = headers.iter().position(|h| h == "PubYear");
        let mut by_id = HashMap::new();
        if let (Some(doi_col), Some(year_col)) = (doi_col, year_col) {
            for record in reader.records() {
                let record = record?;
                let id = record.get(doi_col).unwrap_or("").trim();
                let year = record.get(year_col).unwrap_or("").trim();
                if id.is_empty() {
                    continue;
                }
                match year.parse::<i32>() {
                    Ok(y) if (YEAR_MIN..=YEAR_MAX).contains(&y) => {
                        by_id.insert(id.to_string(), y);
                    }
                    _ => warn!("metadata row for {id} has unusable year {year:?}"),
                }
            }
        } else {
            warn!(
                "metadata file {} lacks DOI/PubYear columns, falling back to filename years",
                path.display()
            );
        }
        Ok(Self { by_id })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<i32> {
        self.by_id.get(id).copied()
    }
}

/// Derive the document identifier from a corpus filename: the first `_`
/// becomes `/` (normalized DOI), the `.txt` suffix is removed.
pub fn doc_id_from_filename(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".txt").unwrap_or(file_name);
    match stem.split_once('_') {
        Some((prefix, rest)) => format!("{prefix}/{rest}"),
        None => stem.to_string(),
    }
}

/// Resolve a document's publication year: metadata lookup first, then a
/// 4-digit year embedded in the identifier. `None` means the document is
/// skipped by the caller.
pub fn resolve_year(index: &YearIndex, id: &str) -> Option<i32> {
    if let Some(year) = index.get(id) {
        return Some(year);
    }
    EMBEDDED_YEAR
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .filter(|y| (YEAR_MIN..=YEAR_MAX).contains(y))
}
