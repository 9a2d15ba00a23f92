//! Tagger seam: sentence segmentation and part-of-speech annotation.
//!
//! The ranking engine never talks to a concrete NLP backend. It consumes
//! sentences of [`TaggedToken`]s through the [`Tagger`] trait, so a real
//! annotation library can be plugged in without touching the algorithm.
//! [`SimpleTagger`] is the built-in backend: terminal-punctuation sentence
//! splitting, whitespace tokens, a per-language stopword list, and every
//! remaining alphabetic token tagged as a noun.

use std::collections::HashSet;
use std::fmt;

use clap::ValueEnum;

use crate::language::Language;

/// Coarse part-of-speech tags, following the universal tagset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Pos {
    Noun,
    Verb,
    Adj,
    Adv,
    Propn,
    Other,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pos::Noun => "noun",
            Pos::Verb => "verb",
            Pos::Adj => "adj",
            Pos::Adv => "adv",
            Pos::Propn => "propn",
            Pos::Other => "other",
        })
    }
}

/// A single annotated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub pos: Pos,
    pub is_stop: bool,
}

impl TaggedToken {
    pub fn new(text: impl Into<String>, pos: Pos, is_stop: bool) -> Self {
        Self {
            text: text.into(),
            pos,
            is_stop,
        }
    }
}

/// One sentence of annotated tokens.
pub type Sentence = Vec<TaggedToken>;

/// Sentence segmentation and annotation backend.
///
/// Implementations are constructed once per run and injected into the
/// ranking engine.
pub trait Tagger {
    /// Split `text` into sentences of tagged tokens.
    fn segment(&self, text: &str) -> Vec<Sentence>;

    /// Maximum input length in chars this backend can annotate, if bounded.
    ///
    /// The engine refuses longer inputs instead of truncating them.
    fn max_len(&self) -> Option<usize> {
        None
    }
}

// Built-in stopword lists for the two supported languages. Deliberately
// modest; pass `--stopwords` for a domain-specific list.
const STOPWORDS_EN: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "but", "by", "can", "could", "did", "do",
    "does", "for", "from", "had", "has", "have", "he", "her", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "may", "more", "most", "no",
    "not", "of", "on", "one", "only", "or", "other", "our", "out", "she",
    "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "upon", "was", "we",
    "were", "what", "when", "which", "who", "will", "with", "would", "you",
];

const STOPWORDS_DE: &[&str] = &[
    "aber", "alle", "als", "also", "am", "an", "auch", "auf", "aus", "bei",
    "bis", "da", "damit", "dann", "das", "dass", "dem", "den", "der", "des",
    "die", "diese", "dieser", "doch", "durch", "ein", "eine", "einem",
    "einen", "einer", "eines", "er", "es", "für", "hat", "haben", "hier",
    "ich", "im", "in", "ist", "ja", "kann", "man", "mit", "nach", "nicht",
    "noch", "nur", "oder", "sein", "sich", "sie", "sind", "so", "über",
    "um", "und", "unter", "vom", "von", "vor", "war", "waren", "was",
    "wenn", "werden", "wie", "wird", "wurde", "zu", "zum", "zur",
];

/// Built-in annotation backend.
///
/// Good enough to run the pipeline end to end on plain text; swap in a real
/// POS tagger through the [`Tagger`] trait for tag-sensitive extraction.
#[derive(Debug, Clone)]
pub struct SimpleTagger {
    stopwords: HashSet<String>,
}

impl SimpleTagger {
    /// Tagger with the built-in stopword list for `lang`.
    pub fn for_language(lang: Language) -> Self {
        let list = match lang {
            Language::En => STOPWORDS_EN,
            Language::De => STOPWORDS_DE,
        };
        Self {
            stopwords: list.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Add extra stopwords to this tagger instance.
    pub fn add_stopwords<I: IntoIterator<Item = String>>(&mut self, words: I) {
        for w in words {
            self.stopwords.insert(w.to_lowercase());
        }
    }

    fn is_stop(&self, token: &str) -> bool {
        self.stopwords.contains(&token.to_lowercase())
    }
}

impl Tagger for SimpleTagger {
    fn segment(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        for raw in text.split(['.', '!', '?']) {
            let sentence: Sentence = raw
                .split_whitespace()
                .map(|tok| {
                    let pos = if tok.chars().any(|c| c.is_alphabetic()) {
                        Pos::Noun
                    } else {
                        Pos::Other
                    };
                    TaggedToken::new(tok, pos, self.is_stop(tok))
                })
                .collect();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
        }
        sentences
    }
}
