//! Integration tests for `term_trends`.
//
// This suite verifies:
// - Library behavior end to end (period partitioning, language split,
//   sub-batch averaging, exclusion filtering, aggregation)
// - Resumability: a second run over the same corpus does no work and leaves
//   the outputs byte-identical
// - CLI behavior including fatal startup errors and the summary JSON

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;

use term_trends::{
    BatchBudget, CorpusProcessor, Language, LanguageDetector, Period, RankOptions, ReplaceTable,
    RunConfig, RunSummary, SimpleTagger, Tagger, YearIndex, aggregate, matrix_path, rank_terms,
    table_path,
};

// --------------------- helpers ---------------------

const ENGLISH_1990A: &str = "The sociology of law examines how courts and legal \
    institutions shape social change over time. Scholars of the discipline study \
    litigation, legislation, and the everyday practice of legal professionals in \
    modern societies.";

const ENGLISH_1990B: &str = "Legal institutions respond slowly to social change. \
    Empirical research on courts shows that litigation patterns follow economic \
    cycles and that judges balance doctrine against the demands of society.";

const ENGLISH_1991: &str = "During the early nineties the discipline turned toward \
    globalization. Comparative studies of courts and regulation appeared, and the \
    sociology of law widened its focus from national legislation to transnational \
    legal orders.";

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// A corpus of three English documents dated 1990, 1990, 1991 via
/// filename-embedded years.
fn write_corpus(dir: &assert_fs::TempDir) -> PathBuf {
    let corpus = dir.child("jls-txt");
    corpus.create_dir_all().unwrap();
    corpus
        .child("10.1111_j.1990.tb00001.x.txt")
        .write_str(ENGLISH_1990A)
        .unwrap();
    corpus
        .child("10.1111_j.1990.tb00002.x.txt")
        .write_str(ENGLISH_1990B)
        .unwrap();
    corpus
        .child("10.1111_j.1991.tb00003.x.txt")
        .write_str(ENGLISH_1991)
        .unwrap();
    corpus.path().to_path_buf()
}

fn run_config(corpus: &Path, output: &Path, budget: BatchBudget) -> RunConfig {
    RunConfig {
        corpus_dir: corpus.to_path_buf(),
        output_dir: Some(output.to_path_buf()),
        period_size: 1,
        budget,
        rank: RankOptions::default(),
    }
}

fn run_default(corpus: &Path, output: &Path, replace: &ReplaceTable) -> RunSummary {
    let processor = CorpusProcessor::with_default_backends(
        run_config(corpus, output, BatchBudget::Fixed(1_000_000)),
        replace.clone(),
        YearIndex::default(),
    );
    processor.run().unwrap()
}

fn period(year: i32) -> Period {
    Period {
        start: year,
        end: year,
    }
}

/// Read a persisted period table into a map.
fn read_weights(path: &Path) -> HashMap<String, f64> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].parse::<f64>().unwrap())
        })
        .collect()
}

// --------------------- library tests ---------------------

#[test]
fn end_to_end_two_periods_with_exclusion() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let output = dir.path().join("out");

    let exclusions = ReplaceTable::new(vec![("sociology".to_string(), String::new())]);
    let summary = run_default(&corpus, &output, &exclusions);

    assert_eq!(summary.documents, 3);
    assert_eq!(summary.periods.len(), 2);
    assert_eq!(summary.periods_processed, 2);
    assert_eq!(summary.periods_skipped, 0);
    assert_eq!(summary.documents_without_year, 0);

    // one table per period and language, empty buckets included
    for p in [period(1990), period(1991)] {
        for lang in Language::ALL {
            assert!(table_path(&output, &p, lang).is_file());
        }
    }

    // the German tables are header-only: all documents are English
    let de = read_weights(&table_path(&output, &period(1990), Language::De));
    assert!(de.is_empty());

    // ranked terms exist and are finite and non-negative
    let en = read_weights(&table_path(&output, &period(1990), Language::En));
    assert!(!en.is_empty());
    for w in en.values() {
        assert!(w.is_finite() && *w >= 0.0);
    }

    // "sociology" was deleted by the replacement rule before ranking
    assert!(!en.contains_key("sociology"));

    let matrices = aggregate(&output, &summary.periods, &exclusions).unwrap();
    let matrix = &matrices[&Language::En];
    assert_eq!(matrix.periods(), ["1990", "1991"]);
    assert!(!matrix.is_empty());
    assert!(!matrix.terms().contains(&"sociology".to_string()));
    // "courts" occurs in every document, so it must span both periods
    assert!(matrix.get("courts", "1990").is_some());
    assert!(matrix.get("courts", "1991").is_some());
    assert!(matrix_path(&output, Language::En).is_file());
}

#[test]
fn second_run_skips_everything_and_outputs_are_byte_identical() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let output = dir.path().join("out");
    let replace = ReplaceTable::default();

    let first = run_default(&corpus, &output, &replace);
    assert_eq!(first.periods_processed, 2);

    let mut snapshots = Vec::new();
    for p in [period(1990), period(1991)] {
        for lang in Language::ALL {
            let path = table_path(&output, &p, lang);
            snapshots.push((path.clone(), fs::read(&path).unwrap()));
        }
    }

    let second = run_default(&corpus, &output, &replace);
    assert_eq!(second.periods_processed, 0);
    assert_eq!(second.periods_skipped, 2);

    for (path, before) in snapshots {
        assert_eq!(fs::read(&path).unwrap(), before, "{} changed", path.display());
    }
}

#[test]
fn interrupted_run_reprocesses_only_missing_periods() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let output = dir.path().join("out");
    let replace = ReplaceTable::default();

    run_default(&corpus, &output, &replace);
    // simulate a run that died before persisting 1991
    for lang in Language::ALL {
        fs::remove_file(table_path(&output, &period(1991), lang)).unwrap();
    }

    let resumed = run_default(&corpus, &output, &replace);
    assert_eq!(resumed.periods_skipped, 1);
    assert_eq!(resumed.periods_processed, 1);
    for lang in Language::ALL {
        assert!(table_path(&output, &period(1991), lang).is_file());
    }
}

/// Detector stub that routes everything into one language, keeping the
/// sub-batch tests independent of whatlang.
struct AlwaysEnglish;
impl LanguageDetector for AlwaysEnglish {
    fn detect(&self, _text: &str) -> Option<String> {
        Some("en".to_string())
    }
}

#[test]
fn sub_batch_weights_are_averaged_per_term() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = dir.child("jls-txt");
    corpus.create_dir_all().unwrap();
    let doc_a = "law court judge law reform";
    let doc_b = "law treaty nation law treaty";
    corpus.child("a.1990.doc.txt").write_str(doc_a).unwrap();
    corpus.child("b.1990.doc.txt").write_str(doc_b).unwrap();
    let output = dir.path().join("out");

    // budget below the combined length: each document becomes its own batch
    let config = run_config(corpus.path(), &output, BatchBudget::Fixed(26));
    let mut taggers: HashMap<Language, Box<dyn Tagger>> = HashMap::new();
    for lang in Language::ALL {
        taggers.insert(lang, Box::new(SimpleTagger::for_language(lang)));
    }
    let processor = CorpusProcessor::new(
        config.clone(),
        ReplaceTable::default(),
        YearIndex::default(),
        taggers,
        Box::new(AlwaysEnglish),
    );
    processor.run().unwrap();

    let table = read_weights(&table_path(&output, &period(1990), Language::En));

    // recompute each batch independently and average by hand
    let tagger = SimpleTagger::for_language(Language::En);
    let batch_a: HashMap<String, f64> = rank_terms(&tagger, doc_a, &config.rank)
        .unwrap()
        .into_iter()
        .collect();
    let batch_b: HashMap<String, f64> = rank_terms(&tagger, doc_b, &config.rank)
        .unwrap()
        .into_iter()
        .collect();

    // present in both batches: arithmetic mean
    let expected_law = (batch_a["law"] + batch_b["law"]) / 2.0;
    assert!((table["law"] - expected_law).abs() < 1e-9);
    // present in one batch only: the single value, not halved
    assert!((table["judge"] - batch_a["judge"]).abs() < 1e-9);
    assert!((table["treaty"] - batch_b["treaty"]).abs() < 1e-9);
}

#[test]
fn unreadable_document_is_skipped_not_fatal() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = dir.child("jls-txt");
    corpus.create_dir_all().unwrap();
    corpus
        .child("10.1111_j.1990.tb00001.x.txt")
        .write_str(ENGLISH_1990A)
        .unwrap();
    // scanned page that came out of OCR as invalid UTF-8
    fs::write(
        corpus.path().join("10.1111_j.1991.tb00002.x.txt"),
        [0x66, 0xff, 0xfe, 0x67],
    )
    .unwrap();
    let output = dir.path().join("out");

    let summary = run_default(corpus.path(), &output, &ReplaceTable::default());

    // the bad document is counted and skipped, the run completes
    assert_eq!(summary.documents_unreadable, 1);
    assert_eq!(summary.periods_processed, 2);

    // the healthy period is persisted with real weights
    let en_1990 = read_weights(&table_path(&output, &period(1990), Language::En));
    assert!(!en_1990.is_empty());
    // the period holding only the bad document still completes, header-only
    for lang in Language::ALL {
        assert!(table_path(&output, &period(1991), lang).is_file());
    }
    assert!(read_weights(&table_path(&output, &period(1991), Language::En)).is_empty());
}

#[test]
fn no_temp_files_remain_after_a_run() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    let output = dir.path().join("out");

    run_default(&corpus, &output, &ReplaceTable::default());

    for entry in fs::read_dir(&output).unwrap() {
        let name = entry.unwrap().file_name();
        let name = name.to_string_lossy();
        assert!(!name.ends_with(".tmp"), "leftover temp file {name}");
    }
}

#[test]
fn unsupported_language_documents_are_skipped_not_fatal() {
    struct AlwaysFrench;
    impl LanguageDetector for AlwaysFrench {
        fn detect(&self, _text: &str) -> Option<String> {
            Some("fr".to_string())
        }
    }

    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = dir.child("jls-txt");
    corpus.create_dir_all().unwrap();
    corpus
        .child("a.1990.doc.txt")
        .write_str("peu importe le contenu")
        .unwrap();
    let output = dir.path().join("out");

    let mut taggers: HashMap<Language, Box<dyn Tagger>> = HashMap::new();
    for lang in Language::ALL {
        taggers.insert(lang, Box::new(SimpleTagger::for_language(lang)));
    }
    let processor = CorpusProcessor::new(
        run_config(corpus.path(), &output, BatchBudget::Fixed(1_000)),
        ReplaceTable::default(),
        YearIndex::default(),
        taggers,
        Box::new(AlwaysFrench),
    );
    let summary = processor.run().unwrap();

    assert_eq!(summary.documents_unsupported_language, 1);
    // tables still exist (header-only) so the period counts as done
    for lang in Language::ALL {
        assert!(table_path(&output, &period(1990), lang).is_file());
        assert!(read_weights(&table_path(&output, &period(1990), lang)).is_empty());
    }
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_fails_fast_without_metadata() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    // replacement table exists, metadata does not
    write_file(&dir, "jls-replace-terms.csv", "noise,\n");

    let mut cmd = assert_cmd::Command::cargo_bin("term_trends").unwrap();
    cmd.arg(&corpus)
        .env("RUST_LOG", "error")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required file"));
}

#[test]
fn cli_rejects_out_of_range_options() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);

    // validation runs before any input file is touched
    for (flag, value, message) in [
        ("--damping", "1.5", "damping"),
        ("--window-size", "1", "window-size"),
        ("--period-size", "0", "period-size"),
        ("--convergence-threshold", "0", "convergence-threshold"),
        ("--max-iterations", "0", "max-iterations"),
    ] {
        let mut cmd = assert_cmd::Command::cargo_bin("term_trends").unwrap();
        cmd.arg(&corpus)
            .arg(flag)
            .arg(value)
            .env("RUST_LOG", "error")
            .assert()
            .failure()
            .stderr(predicate::str::contains(message));
    }
}

#[test]
fn cli_end_to_end_with_summary_json() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    write_file(&dir, "jls-replace-terms.csv", "# exclusions\nsociology,\n");
    // one DOI resolved via metadata, the others via the embedded year
    write_file(
        &dir,
        "jls-doi.csv",
        "DOI,PubYear\n10.1111/j.1991.tb00003.x,1991\n",
    );
    let output = dir.path().join("out");
    let summary_path = dir.path().join("summary.json");

    let mut cmd = assert_cmd::Command::cargo_bin("term_trends").unwrap();
    cmd.arg(&corpus)
        .arg("--period-size")
        .arg("1")
        .arg("--batch-chars")
        .arg("1000000")
        .arg("--output-dir")
        .arg(&output)
        .arg("--summary-json")
        .arg(&summary_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 periods"));

    for year in [1990, 1991] {
        for lang in Language::ALL {
            assert!(table_path(&output, &period(year), lang).is_file());
        }
    }
    assert!(matrix_path(&output, Language::En).is_file());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["documents"], 3);
    assert_eq!(summary["periods_processed"], 2);

    // the excluded term never surfaces in the final matrix
    let matrix = fs::read_to_string(matrix_path(&output, Language::En)).unwrap();
    assert!(!matrix.lines().any(|l| l.starts_with("sociology,")));
}

#[test]
fn cli_default_output_dir_follows_corpus_conventions() {
    let dir = assert_fs::TempDir::new().unwrap();
    let corpus = write_corpus(&dir);
    write_file(&dir, "jls-replace-terms.csv", "noise,\n");
    write_file(&dir, "jls-doi.csv", "DOI,PubYear\n");

    let mut cmd = assert_cmd::Command::cargo_bin("term_trends").unwrap();
    cmd.arg(&corpus)
        .arg("--batch-chars")
        .arg("1000000")
        .assert()
        .success();

    assert!(dir.path().join("jls-txt_1990-1991_01").is_dir());
}
