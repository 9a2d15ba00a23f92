//! Language partitioning.
//!
//! The corpus is split into the two supported languages before ranking, so
//! each period yields one weight table per language. Detection is delegated
//! to a [`LanguageDetector`]; the production implementation wraps `whatlang`.

use log::warn;

/// The two languages this pipeline supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    De,
}

impl Language {
    /// All supported languages, in the order outputs are produced.
    pub const ALL: [Language; 2] = [Language::En, Language::De];

    /// ISO 639-1 code used in output file names.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        match code {
            "en" => Some(Language::En),
            "de" => Some(Language::De),
            _ => None,
        }
    }
}

/// Language identification backend.
pub trait LanguageDetector {
    /// Detect the language of `text` as an ISO 639-1 code, if identifiable.
    fn detect(&self, text: &str) -> Option<String>;
}

/// Detector backed by `whatlang`.
#[derive(Debug, Clone, Default)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        let code = match info.lang() {
            whatlang::Lang::Eng => "en",
            whatlang::Lang::Deu => "de",
            other => other.code(),
        };
        Some(code.to_string())
    }
}

/// Classify a document into one of the supported languages.
///
/// Documents in any other language are skipped with a diagnostic, never a
/// hard failure.
pub fn classify(detector: &dyn LanguageDetector, id: &str, text: &str) -> Option<Language> {
    match detector.detect(text) {
        Some(code) => match Language::from_code(&code) {
            Some(lang) => Some(lang),
            None => {
                warn!("skipping {id}: unsupported language {code}");
                None
            }
        },
        None => {
            warn!("skipping {id}: language could not be detected");
            None
        }
    }
}
