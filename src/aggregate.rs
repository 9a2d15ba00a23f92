//! Keyword × period aggregation.
//!
//! Reads the persisted per-period weight tables and merges them into one
//! sparse matrix per language: rows are terms in first-seen order, columns
//! are periods, cells are averaged weights. Missing period tables are
//! skipped, never recomputed; recomputation is the controller's job on its
//! next invocation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::controller::table_path;
use crate::error::Result;
use crate::language::Language;
use crate::loader::ReplaceTable;
use crate::period::Period;

/// Sparse keyword × period weight matrix for one language.
#[derive(Debug, Clone)]
pub struct KeywordMatrix {
    periods: Vec<String>,
    terms: Vec<String>,
    index: HashMap<String, usize>,
    /// Per term: period index -> weight.
    cells: Vec<HashMap<usize, f64>>,
}

impl KeywordMatrix {
    pub fn new(periods: Vec<String>) -> Self {
        Self {
            periods,
            terms: Vec::new(),
            index: HashMap::new(),
            cells: Vec::new(),
        }
    }

    /// Insert-or-update one cell.
    pub fn insert(&mut self, term: &str, period_idx: usize, weight: f64) {
        debug_assert!(period_idx < self.periods.len());
        let row = match self.index.get(term) {
            Some(&row) => row,
            None => {
                let row = self.terms.len();
                self.index.insert(term.to_string(), row);
                self.terms.push(term.to_string());
                self.cells.push(HashMap::new());
                row
            }
        };
        self.cells[row].insert(period_idx, weight);
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    /// Terms in first-seen order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn get(&self, term: &str, period: &str) -> Option<f64> {
        let row = *self.index.get(term)?;
        let col = self.periods.iter().position(|p| p == period)?;
        self.cells[row].get(&col).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Persist as CSV: `term` column followed by one column per period,
    /// empty cells where a term was not ranked.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["term".to_string()];
        header.extend(self.periods.iter().cloned());
        writer.write_record(&header)?;
        for (row, term) in self.terms.iter().enumerate() {
            let mut record = vec![term.clone()];
            for col in 0..self.periods.len() {
                record.push(match self.cells[row].get(&col) {
                    Some(weight) => weight.to_string(),
                    None => String::new(),
                });
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Path of the persisted matrix for one language.
pub fn matrix_path(output_dir: &Path, lang: Language) -> PathBuf {
    output_dir.join(format!("keywords-{}.csv", lang.code()))
}

/// Read one persisted period table back into `(term, weight)` rows.
pub fn read_table(path: &Path) -> Result<Vec<(String, f64)>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let term = record.get(0).unwrap_or("").to_string();
        let weight = record.get(1).and_then(|w| w.parse::<f64>().ok());
        match weight {
            Some(weight) if !term.is_empty() => rows.push((term, weight)),
            _ => warn!("{}: malformed row {record:?}", path.display()),
        }
    }
    Ok(rows)
}

/// Merge all period tables under `output_dir` into one matrix per language,
/// dropping every term listed in the exclusion table, and persist each
/// matrix next to the tables it came from.
pub fn aggregate(
    output_dir: &Path,
    periods: &[Period],
    exclusions: &ReplaceTable,
) -> Result<HashMap<Language, KeywordMatrix>> {
    let labels: Vec<String> = periods.iter().map(Period::label).collect();
    let mut matrices = HashMap::new();
    for lang in Language::ALL {
        let mut matrix = KeywordMatrix::new(labels.clone());
        for (col, period) in periods.iter().enumerate() {
            let path = table_path(output_dir, period, lang);
            if !path.is_file() {
                info!("skipping non-existent data for {period}/{}", lang.code());
                continue;
            }
            for (term, weight) in read_table(&path)? {
                if exclusions.is_excluded(&term) {
                    continue;
                }
                matrix.insert(&term, col, weight);
            }
        }
        matrix.write_csv(&matrix_path(output_dir, lang))?;
        matrices.insert(lang, matrix);
    }
    Ok(matrices)
}
