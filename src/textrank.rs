//! N-gram TextRank term-ranking engine.
//!
//! Builds a co-occurrence graph over candidate terms (unigrams, bigrams,
//! trigrams) and computes a stationary importance score per term by power
//! iteration, then scales n-gram scores to compensate for their rarity.
//!
//! The adjacency semantics are presence-based: a cell is 1 if the pair
//! co-occurred within the window at least once, regardless of multiplicity.
//! Bigram and trigram candidates join the graph as nodes of their own while
//! their constituent words also remain standalone unigram candidates.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::nlp::{Pos, Sentence, Tagger};

/// Options for a single ranking run.
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// Part-of-speech tags eligible as candidate terms.
    pub candidate_pos: HashSet<Pos>,
    /// Sliding co-occurrence window, in candidate positions (>= 2).
    pub window_size: usize,
    /// Case-fold candidate terms.
    pub lower: bool,
    /// Add adjacent qualifying pairs as bigram candidates.
    pub bigrams: bool,
    /// Add adjacent qualifying triples as trigram candidates.
    pub trigrams: bool,
    /// Extra stopwords scoped to this run only.
    pub stopwords: HashSet<String>,
    /// Damping factor, 0 < d < 1.
    pub damping: f64,
    /// Early-exit threshold on the change of the score sum.
    pub convergence_threshold: f64,
    /// Upper bound on power iterations.
    pub max_iterations: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            candidate_pos: HashSet::from([Pos::Noun, Pos::Verb]),
            window_size: 4,
            lower: false,
            bigrams: true,
            trigrams: true,
            stopwords: HashSet::new(),
            damping: 0.85,
            convergence_threshold: 1e-5,
            max_iterations: 10,
        }
    }
}

impl RankOptions {
    fn qualifies(&self, token: &crate::nlp::TaggedToken) -> bool {
        self.candidate_pos.contains(&token.pos)
            && !token.is_stop
            && !self.stopwords.contains(&token.text)
            && !self.stopwords.contains(&token.text.to_lowercase())
    }

    fn fold(&self, text: &str) -> String {
        if self.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }
}

/// Rank the candidate terms of `text` by importance.
///
/// Returns `(term, weight)` pairs sorted by descending weight (ties broken
/// by term). An input without candidates yields an empty vector; an input
/// longer than the tagger's budget is an error, never a truncation.
pub fn rank_terms(tagger: &dyn Tagger, text: &str, opts: &RankOptions) -> Result<Vec<(String, f64)>> {
    if let Some(max) = tagger.max_len() {
        let len = text.chars().count();
        if len > max {
            return Err(Error::InputTooLarge { len, max });
        }
    }

    let sentences = tagger.segment(text);
    let candidates = candidate_sequences(&sentences, opts);
    let (vocab, terms) = build_vocab(&candidates);
    if vocab.is_empty() {
        return Ok(Vec::new());
    }

    let pairs = token_pairs(&candidates, &vocab, opts.window_size);
    let matrix = normalized_matrix(terms.len(), &pairs);
    let scores = power_iterate(&matrix, terms.len(), opts);

    let mut ranked: Vec<(String, f64)> = terms
        .into_iter()
        .zip(scores)
        .map(|(term, score)| {
            let scale = match term.split_whitespace().count() {
                2 => 4.0,
                3 => 6.0,
                _ => 1.0,
            };
            (term, score * scale)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(ranked)
}

/// Take the top `k` terms of a ranked list.
pub fn top_terms(ranked: &[(String, f64)], k: usize) -> Vec<&str> {
    ranked.iter().take(k).map(|(term, _)| term.as_str()).collect()
}

/// Per sentence: qualifying unigrams in sentence order, then qualifying
/// adjacent bigrams, then trigrams. Constituent words of an n-gram stay in
/// the sequence as unigrams on purpose, giving n-grams and their parts
/// independent graph presence.
fn candidate_sequences(sentences: &[Sentence], opts: &RankOptions) -> Vec<Vec<String>> {
    let mut result = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let mut selected: Vec<String> = sentence
            .iter()
            .filter(|t| opts.qualifies(t))
            .map(|t| opts.fold(&t.text))
            .collect();
        if opts.bigrams {
            for pair in sentence.windows(2) {
                if pair.iter().all(|t| opts.qualifies(t)) {
                    selected.push(format!("{} {}", opts.fold(&pair[0].text), opts.fold(&pair[1].text)));
                }
            }
        }
        if opts.trigrams {
            for triple in sentence.windows(3) {
                if triple.iter().all(|t| opts.qualifies(t)) {
                    selected.push(format!(
                        "{} {} {}",
                        opts.fold(&triple[0].text),
                        opts.fold(&triple[1].text),
                        opts.fold(&triple[2].text)
                    ));
                }
            }
        }
        result.push(selected);
    }
    result
}

/// Dense vocabulary in first-seen order.
fn build_vocab(candidates: &[Vec<String>]) -> (HashMap<String, usize>, Vec<String>) {
    let mut vocab = HashMap::new();
    let mut terms = Vec::new();
    for sentence in candidates {
        for term in sentence {
            if !vocab.contains_key(term) {
                vocab.insert(term.clone(), terms.len());
                terms.push(term.clone());
            }
        }
    }
    (vocab, terms)
}

/// Windowed co-occurrence pairs, deduplicated within each sentence.
///
/// The same pair may recur across sentences; the matrix cell is presence
/// (set to 1), so recurrence does not change the weight.
fn token_pairs(
    candidates: &[Vec<String>],
    vocab: &HashMap<String, usize>,
    window_size: usize,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for sentence in candidates {
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for (i, term) in sentence.iter().enumerate() {
            for j in (i + 1)..(i + window_size).min(sentence.len()) {
                let pair = (vocab[term], vocab[&sentence[j]]);
                if seen.insert(pair) {
                    pairs.push(pair);
                }
            }
        }
    }
    pairs
}

/// Presence adjacency, symmetrized as `A + Aᵗ − diag(A)`, then column
/// normalized. Columns summing to zero are left zero.
fn normalized_matrix(n: usize, pairs: &[(usize, usize)]) -> Vec<f64> {
    let mut g = vec![0.0_f64; n * n];
    for &(i, j) in pairs {
        g[i * n + j] = 1.0;
    }
    // A + Aᵗ − diag(A): off-diagonal cells get the sum of both directions,
    // the diagonal keeps its own value.
    for i in 0..n {
        for j in (i + 1)..n {
            let sum = g[i * n + j] + g[j * n + i];
            g[i * n + j] = sum;
            g[j * n + i] = sum;
        }
    }
    for col in 0..n {
        let norm: f64 = (0..n).map(|row| g[row * n + col]).sum();
        if norm != 0.0 {
            for row in 0..n {
                g[row * n + col] /= norm;
            }
        }
    }
    g
}

/// Power iteration: `score ← (1 − d) + d · (M · score)`, scores start at 1,
/// early exit once the score sum settles.
fn power_iterate(matrix: &[f64], n: usize, opts: &RankOptions) -> Vec<f64> {
    let mut scores = vec![1.0_f64; n];
    let mut previous_sum = 0.0_f64;
    for _ in 0..opts.max_iterations {
        let mut next = vec![0.0_f64; n];
        for (row, slot) in next.iter_mut().enumerate() {
            let dot: f64 = (0..n).map(|col| matrix[row * n + col] * scores[col]).sum();
            *slot = (1.0 - opts.damping) + opts.damping * dot;
        }
        scores = next;
        let sum: f64 = scores.iter().sum();
        if (previous_sum - sum).abs() < opts.convergence_threshold {
            break;
        }
        previous_sum = sum;
    }
    scores
}
