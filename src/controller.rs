//! Period/batch controller.
//!
//! Walks the corpus in increasing year order, one period at a time:
//! skip-if-done check, language classification, memory-bounded sub-batching
//! through the ranking engine, averaging, and persistence of one weight
//! table per `(period, language)`. File existence is the only resumability
//! state; re-running after an interruption reprocesses exactly the periods
//! that never made it to disk.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::batch::{BatchBudget, average_weights, split_batches};
use crate::error::{Error, Result};
use crate::language::{Language, LanguageDetector, WhatlangDetector, classify};
use crate::loader::{ReplaceTable, load_words};
use crate::metadata::{YearIndex, doc_id_from_filename, resolve_year};
use crate::nlp::{SimpleTagger, Tagger};
use crate::period::{Period, partition};
use crate::textrank::{RankOptions, rank_terms};

/// Configuration of one corpus run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub corpus_dir: PathBuf,
    /// Output directory; derived from the corpus name and year range when absent.
    pub output_dir: Option<PathBuf>,
    /// Years per period.
    pub period_size: u32,
    pub budget: BatchBudget,
    pub rank: RankOptions,
}

/// What a run did, for logging and the machine-readable summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub periods: Vec<Period>,
    pub periods_processed: usize,
    pub periods_skipped: usize,
    pub documents: usize,
    pub documents_without_year: usize,
    pub documents_unreadable: usize,
    pub documents_unsupported_language: usize,
}

/// Path of the persisted weight table for one period and language.
pub fn table_path(output_dir: &Path, period: &Period, lang: Language) -> PathBuf {
    output_dir.join(format!("{}-{}.csv", period.label(), lang.code()))
}

/// Drives a full corpus run. Tagger and detector are injected once per run;
/// tests swap in stubs through [`CorpusProcessor::new`].
pub struct CorpusProcessor {
    config: RunConfig,
    replace: ReplaceTable,
    years: YearIndex,
    taggers: HashMap<Language, Box<dyn Tagger>>,
    detector: Box<dyn LanguageDetector>,
}

impl CorpusProcessor {
    pub fn new(
        config: RunConfig,
        replace: ReplaceTable,
        years: YearIndex,
        taggers: HashMap<Language, Box<dyn Tagger>>,
        detector: Box<dyn LanguageDetector>,
    ) -> Self {
        Self {
            config,
            replace,
            years,
            taggers,
            detector,
        }
    }

    /// Processor with the built-in tagger and `whatlang` detection.
    pub fn with_default_backends(
        config: RunConfig,
        replace: ReplaceTable,
        years: YearIndex,
    ) -> Self {
        let mut taggers: HashMap<Language, Box<dyn Tagger>> = HashMap::new();
        for lang in Language::ALL {
            taggers.insert(lang, Box::new(SimpleTagger::for_language(lang)));
        }
        Self::new(config, replace, years, taggers, Box::new(WhatlangDetector))
    }

    /// Run the controller over the whole corpus.
    ///
    /// Periods are processed strictly in increasing year order and
    /// sequentially; each sub-batch's working memory is dropped before the
    /// next starts.
    pub fn run(&self) -> Result<RunSummary> {
        if !self.config.corpus_dir.is_dir() {
            return Err(Error::NotADirectory(self.config.corpus_dir.clone()));
        }

        let files = self.discover_files();
        let mut documents = 0usize;
        let mut without_year = 0usize;
        let mut years_files: BTreeMap<i32, Vec<PathBuf>> = BTreeMap::new();
        for path in files {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let id = doc_id_from_filename(name);
            match resolve_year(&self.years, &id) {
                Some(year) => {
                    documents += 1;
                    years_files.entry(year).or_default().push(path);
                }
                None => {
                    warn!("cannot determine year for {id}, skipping");
                    without_year += 1;
                }
            }
        }
        if years_files.is_empty() {
            return Err(Error::EmptyCorpus(self.config.corpus_dir.clone()));
        }
        if without_year > 0 {
            warn!("{without_year} document(s) skipped for lack of a publication year");
        }

        let year_min = *years_files.keys().next().expect("non-empty");
        let year_max = *years_files.keys().next_back().expect("non-empty");
        let periods = partition(year_min, year_max, self.config.period_size);

        let output_dir = self.output_dir(year_min, year_max);
        fs::create_dir_all(&output_dir)?;
        info!(
            "processing {documents} documents into {} ({} periods)",
            output_dir.display(),
            periods.len()
        );

        let mut summary = RunSummary {
            output_dir: output_dir.clone(),
            periods: periods.clone(),
            periods_processed: 0,
            periods_skipped: 0,
            documents,
            documents_without_year: without_year,
            documents_unreadable: 0,
            documents_unsupported_language: 0,
        };

        for period in &periods {
            let done = Language::ALL
                .iter()
                .all(|&lang| table_path(&output_dir, period, lang).is_file());
            if done {
                info!("- {period} already processed, skipping");
                summary.periods_skipped += 1;
                continue;
            }
            self.process_period(period, &years_files, &output_dir, &mut summary)?;
            summary.periods_processed += 1;
        }
        Ok(summary)
    }

    fn discover_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.config.corpus_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        files.sort();
        files
    }

    fn output_dir(&self, year_min: i32, year_max: i32) -> PathBuf {
        if let Some(dir) = &self.config.output_dir {
            return dir.clone();
        }
        let basename = self
            .config
            .corpus_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("corpus");
        let parent = self
            .config
            .corpus_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        parent.join(format!(
            "{basename}_{year_min}-{year_max}_{:02}",
            self.config.period_size
        ))
    }

    /// Process one period: classify its documents, sub-batch per language,
    /// rank, average, persist.
    fn process_period(
        &self,
        period: &Period,
        years_files: &BTreeMap<i32, Vec<PathBuf>>,
        output_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<()> {
        // Free memory moves over a long run, so the cutoff is re-derived
        // for every period.
        let max_chars = self.config.budget.batch_chars();

        let mut buckets: HashMap<Language, Vec<Vec<String>>> = HashMap::new();
        let mut num_docs = 0usize;
        for year in period.years() {
            let Some(files) = years_files.get(&year) else {
                continue;
            };
            for path in files {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                let id = doc_id_from_filename(name);
                // a single bad document (missing, non-UTF-8 OCR output)
                // never aborts a multi-period run
                let words = match load_words(path, &self.replace) {
                    Ok(words) => words,
                    Err(e) => {
                        warn!("cannot read {id}: {e}, skipping");
                        summary.documents_unreadable += 1;
                        continue;
                    }
                };
                let text = words.join(" ");
                match classify(self.detector.as_ref(), &id, &text) {
                    Some(lang) => {
                        num_docs += 1;
                        buckets.entry(lang).or_default().push(words);
                    }
                    None => summary.documents_unsupported_language += 1,
                }
            }
        }
        info!("- processing {period} ({num_docs} documents, batch budget {max_chars} chars)");

        for lang in Language::ALL {
            let path = table_path(output_dir, period, lang);
            if path.is_file() {
                info!("- {period}/{} already processed, skipping", lang.code());
                continue;
            }
            let docs = buckets.remove(&lang).unwrap_or_default();
            let weights = self.rank_bucket(period, lang, docs, max_chars)?;
            write_table(&path, weights)?;
        }
        Ok(())
    }

    /// Rank one period/language bucket through memory-bounded sub-batches
    /// and average the results.
    fn rank_bucket(
        &self,
        period: &Period,
        lang: Language,
        docs: Vec<Vec<String>>,
        max_chars: usize,
    ) -> Result<HashMap<String, f64>> {
        let Some(tagger) = self.taggers.get(&lang) else {
            warn!("no tagger configured for {}, emitting empty table", lang.code());
            return Ok(HashMap::new());
        };
        let batches = split_batches(docs, max_chars);
        let mut results = Vec::with_capacity(batches.len());
        for batch in batches {
            let text = batch.join(" ");
            // batch, text and the engine's graph are dropped before the
            // next iteration; batches never run concurrently
            match rank_terms(tagger.as_ref(), &text, &self.config.rank) {
                Ok(ranked) => results.push(ranked),
                Err(Error::InputTooLarge { len, max }) => {
                    warn!(
                        "- {period}/{}: batch of {len} chars exceeds tagger limit {max}, skipped",
                        lang.code()
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(average_weights(&results))
    }
}

/// Persist one weight table, sorted by descending weight (ties by term).
///
/// An empty table still writes its header; a complete period has one file
/// per supported language, which is what the skip-if-done check looks for.
/// The table is written to a temp file and renamed into place, so the
/// resumability signal only ever points at a complete artifact.
fn write_table(path: &Path, weights: HashMap<String, f64>) -> Result<()> {
    let mut rows: Vec<(String, f64)> = weights.into_iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(["term", "weight"])?;
        for (term, weight) in rows {
            writer.write_record([term.as_str(), &weight.to_string()])?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
