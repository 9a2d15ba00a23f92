#![forbid(unsafe_code)]
//! # term_trends
//!
//! Extracts and tracks the relative weight of domain terminology across a
//! time-partitioned text corpus. Documents are grouped by publication year
//! into fixed-width periods and split by detected language; each
//! period/language bucket is ranked with an n-gram TextRank over a
//! co-occurrence graph, in memory-bounded sub-batches; the per-period weight
//! tables are finally merged into one keyword × period matrix per language.
//!
//! The pipeline is resumable: a period whose output tables exist on disk is
//! never recomputed.

pub mod aggregate;
pub mod batch;
pub mod controller;
pub mod error;
pub mod language;
pub mod loader;
pub mod metadata;
pub mod nlp;
pub mod period;
pub mod textrank;

pub use aggregate::{KeywordMatrix, aggregate, matrix_path, read_table};
pub use batch::{BatchBudget, average_weights, split_batches};
pub use controller::{CorpusProcessor, RunConfig, RunSummary, table_path};
pub use error::{Error, Result};
pub use language::{Language, LanguageDetector, WhatlangDetector, classify};
pub use loader::{ReplaceTable, load_words, words_from_text};
pub use metadata::{YearIndex, doc_id_from_filename, resolve_year};
pub use nlp::{Pos, Sentence, SimpleTagger, TaggedToken, Tagger};
pub use period::{Period, partition};
pub use textrank::{RankOptions, rank_terms, top_terms};
