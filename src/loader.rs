//! Document loading and term replacement.
//!
//! Turns a raw corpus file into a flat ordered sequence of words: OCR
//! artifacts and hyphenation line breaks are repaired, the caller-supplied
//! replacement rules are applied, punctuation is stripped, and the remainder
//! is split on whitespace.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

// Hyphen followed by a line wrap re-joins a word split across lines.
static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- *[\r\n]+").expect("valid regex"));

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{P}").expect("valid regex"));

/// Ordered literal replacement rules, doubling as the term exclusion list.
///
/// Rules apply in table order; overlapping patterns must be pre-ordered by
/// the author of the table. An empty replacement deletes the matched text.
#[derive(Debug, Clone, Default)]
pub struct ReplaceTable {
    rules: Vec<(String, String)>,
}

impl ReplaceTable {
    pub fn new(rules: Vec<(String, String)>) -> Self {
        Self { rules }
    }

    /// Read a two-column CSV table: column 1 the literal text to replace,
    /// column 2 the replacement (absent or empty means delete). Rows
    /// starting with `#` and fully empty rows are ignored.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut rules = Vec::new();
        for record in reader.records() {
            let record = record?;
            let pattern = record.get(0).unwrap_or("").trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }
            let replacement = record.get(1).unwrap_or("").trim();
            rules.push((pattern.to_string(), replacement.to_string()));
        }
        Ok(Self { rules })
    }

    /// Apply every rule to `text` in table order.
    pub fn apply(&self, mut text: String) -> String {
        for (pattern, replacement) in &self.rules {
            text = text.replace(pattern.as_str(), replacement);
        }
        text
    }

    /// Whether `term` is a rule key and therefore excluded from all outputs.
    pub fn is_excluded(&self, term: &str) -> bool {
        self.rules.iter().any(|(pattern, _)| pattern == term)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Load one document as a flat ordered sequence of words.
///
/// Never fails on empty input; an unreadable file is an I/O error.
pub fn load_words(path: &Path, replace: &ReplaceTable) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(words_from_text(&text, replace))
}

/// The loading pipeline on an in-memory string, for callers that already
/// hold the text.
pub fn words_from_text(text: &str, replace: &ReplaceTable) -> Vec<String> {
    // "ﬁ" is the most common OCR ligature artifact in scanned journals.
    let text = text.replace('ﬁ', "fi");
    let text = HYPHEN_BREAK.replace_all(&text, "");
    let text = replace.apply(text.into_owned());
    let text = PUNCTUATION.replace_all(&text, "");
    text.split_whitespace().map(str::to_string).collect()
}
