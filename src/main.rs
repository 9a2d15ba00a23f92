#![forbid(unsafe_code)]
//! # term_trends CLI
//!
//! Runs the full pipeline over a corpus directory of plain-text documents:
//! year resolution, period partitioning, language split, memory-bounded
//! n-gram TextRank per period, and final keyword × period aggregation.
//!
//! By convention the corpus directory name starts with a project prefix
//! (`jls-txt` -> prefix `jls`) and its parent holds the auxiliary files
//! `{prefix}-doi.csv` (metadata) and `{prefix}-replace-terms.csv`
//! (replacement/exclusion table). Both can be overridden by flags.
//!
//! ## Example
//! ```bash
//! term_trends corpora/jls-txt --period-size 5 --lower
//! ```
//!
//! See `--help` for all available options.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{error, info};
use term_trends::{
    BatchBudget, CorpusProcessor, Pos, RankOptions, ReplaceTable, RunConfig, YearIndex, aggregate,
    matrix_path,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Corpus directory of .txt documents (filename = DOI with / as _, or
    /// containing a 4-digit year)
    corpus_dir: PathBuf,

    /// Years per period
    #[arg(long, default_value_t = 1)]
    period_size: u32,

    /// Metadata CSV with DOI and PubYear columns
    /// (default: ../{prefix}-doi.csv next to the corpus)
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Replacement/exclusion CSV
    /// (default: ../{prefix}-replace-terms.csv next to the corpus)
    #[arg(long)]
    replace_terms: Option<PathBuf>,

    /// Output directory (default: ../{corpus}_{ymin}-{ymax}_{NN})
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Optional extra stopword file (.txt, one word per line), scoped to
    /// this run
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Co-occurrence window size in candidate positions
    #[arg(long, default_value_t = 4)]
    window_size: usize,

    /// Case-fold candidate terms
    #[arg(long, default_value_t = false)]
    lower: bool,

    /// Disable bigram candidates
    #[arg(long, default_value_t = false)]
    no_bigrams: bool,

    /// Disable trigram candidates
    #[arg(long, default_value_t = false)]
    no_trigrams: bool,

    /// Part-of-speech tags eligible as candidates
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = vec![Pos::Noun, Pos::Verb])]
    candidate_pos: Vec<Pos>,

    /// Damping factor of the power iteration (0 < d < 1)
    #[arg(long, default_value_t = 0.85)]
    damping: f64,

    /// Early-exit threshold on the score-sum change
    #[arg(long, default_value_t = 1e-5)]
    convergence_threshold: f64,

    /// Upper bound on power iterations
    #[arg(long, default_value_t = 10)]
    max_iterations: usize,

    /// Fixed sub-batch budget in chars (default: probe free memory per period)
    #[arg(long)]
    batch_chars: Option<usize>,

    /// Write a machine-readable run summary to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

/// `corpora/jls-txt` -> `corpora/jls-{suffix}`.
fn default_aux_path(corpus_dir: &Path, suffix: &str) -> PathBuf {
    let basename = corpus_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("corpus");
    let prefix = basename.split('-').next().unwrap_or(basename);
    corpus_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join(format!("{prefix}-{suffix}"))
}

fn read_stopwords(path: &Path) -> std::io::Result<HashSet<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reject out-of-range options before touching any input.
fn validate(cli: &Cli) -> Result<(), String> {
    if cli.period_size == 0 {
        return Err("--period-size must be at least 1".to_string());
    }
    if cli.window_size < 2 {
        return Err("--window-size must be at least 2".to_string());
    }
    if !(cli.damping > 0.0 && cli.damping < 1.0) {
        return Err("--damping must be strictly between 0 and 1".to_string());
    }
    if cli.convergence_threshold <= 0.0 {
        return Err("--convergence-threshold must be positive".to_string());
    }
    if cli.max_iterations == 0 {
        return Err("--max-iterations must be at least 1".to_string());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(msg) = validate(&cli) {
        error!("Error: {msg}");
        process::exit(1);
    }

    let metadata_path = cli
        .metadata
        .unwrap_or_else(|| default_aux_path(&cli.corpus_dir, "doi.csv"));
    let replace_path = cli
        .replace_terms
        .unwrap_or_else(|| default_aux_path(&cli.corpus_dir, "replace-terms.csv"));

    // Fatal input errors: fail fast before any processing.
    let replace = match ReplaceTable::from_csv(&replace_path) {
        Ok(table) => table,
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    };
    let years = match YearIndex::from_csv(&metadata_path) {
        Ok(index) => index,
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    };

    let stopwords = match &cli.stopwords {
        Some(path) => match read_stopwords(path) {
            Ok(words) => words,
            Err(e) => {
                error!("Error reading {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => HashSet::new(),
    };

    let rank = RankOptions {
        candidate_pos: cli.candidate_pos.into_iter().collect(),
        window_size: cli.window_size,
        lower: cli.lower,
        bigrams: !cli.no_bigrams,
        trigrams: !cli.no_trigrams,
        stopwords,
        damping: cli.damping,
        convergence_threshold: cli.convergence_threshold,
        max_iterations: cli.max_iterations,
    };
    let config = RunConfig {
        corpus_dir: cli.corpus_dir,
        output_dir: cli.output_dir,
        period_size: cli.period_size,
        budget: match cli.batch_chars {
            Some(chars) => BatchBudget::Fixed(chars),
            None => BatchBudget::ProbeFreeMemory,
        },
        rank,
    };

    let processor = CorpusProcessor::with_default_backends(config, replace.clone(), years);
    let summary = match processor.run() {
        Ok(summary) => summary,
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    };

    match aggregate(&summary.output_dir, &summary.periods, &replace) {
        Ok(matrices) => {
            for (lang, matrix) in &matrices {
                info!(
                    "{}: {} terms over {} periods -> {}",
                    lang.code(),
                    matrix.terms().len(),
                    matrix.periods().len(),
                    matrix_path(&summary.output_dir, *lang).display()
                );
            }
        }
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    }

    if let Some(path) = &cli.summary_json {
        let json = match serde_json::to_string_pretty(&summary) {
            Ok(json) => json,
            Err(e) => {
                error!("Error serializing summary: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = fs::write(path, json) {
            error!("Error writing {}: {e}", path.display());
            process::exit(1);
        }
    }

    println!(
        "Processed {} periods ({} skipped as done), {} documents ({} without year, {} unreadable, {} unsupported language). Results in {}",
        summary.periods_processed,
        summary.periods_skipped,
        summary.documents,
        summary.documents_without_year,
        summary.documents_unreadable,
        summary.documents_unsupported_language,
        summary.output_dir.display()
    );
}
