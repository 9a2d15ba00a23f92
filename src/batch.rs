//! Memory-bounded sub-batching and weight averaging.
//!
//! Tagger working state grows with input size, so one period/language bucket
//! is fed to the ranking engine in sub-batches whose character length stays
//! under a budget. Batches run strictly sequentially; each batch's working
//! memory is dropped before the next starts.

use std::collections::HashMap;

use log::warn;

/// Batch size as a share of free memory when probing.
///
/// The tagger's working set is roughly an order of magnitude larger than
/// the raw text.
const PROBE_FRACTION: f64 = 0.1;

/// Budget when free memory cannot be probed on this platform.
const FALLBACK_BATCH_CHARS: usize = 8_000_000;

/// Where the per-batch character budget comes from.
///
/// `Fixed` keeps the batching policy deterministic for tests and for CLI
/// override; `ProbeFreeMemory` re-reads free memory each time it is
/// resolved, since it changes over a long run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchBudget {
    Fixed(usize),
    ProbeFreeMemory,
}

impl BatchBudget {
    /// Resolve the budget to a concrete character count.
    pub fn batch_chars(&self) -> usize {
        match self {
            BatchBudget::Fixed(chars) => (*chars).max(1),
            BatchBudget::ProbeFreeMemory => match free_memory_bytes() {
                Some(bytes) => ((bytes as f64 * PROBE_FRACTION) as usize).max(1),
                None => {
                    warn!("cannot probe free memory, using fixed fallback budget");
                    FALLBACK_BATCH_CHARS
                }
            },
        }
    }
}

#[cfg(target_os = "linux")]
fn free_memory_bytes() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let kb: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn free_memory_bytes() -> Option<u64> {
    None
}

/// Split documents (each a word sequence) into batches whose joined text
/// stays under `max_chars`. Document order is preserved; a single oversized
/// document still forms a batch of its own.
pub fn split_batches(docs: Vec<Vec<String>>, max_chars: usize) -> Vec<Vec<String>> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_chars = 0usize;
    for words in docs {
        // joined length: word chars plus separating spaces
        let doc_chars: usize = words.iter().map(|w| w.chars().count() + 1).sum();
        if !current.is_empty() && current_chars + doc_chars > max_chars {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current_chars += doc_chars;
        current.extend(words);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Merge per-batch weight tables into one table per period/language.
///
/// A term's weight is the arithmetic mean over the batches it appeared in;
/// absence from a batch contributes nothing, not a zero.
pub fn average_weights(batches: &[Vec<(String, f64)>]) -> HashMap<String, f64> {
    let mut sums: HashMap<String, (f64, u32)> = HashMap::new();
    for batch in batches {
        for (term, weight) in batch {
            let entry = sums.entry(term.clone()).or_insert((0.0, 0));
            entry.0 += weight;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(term, (sum, count))| (term, sum / count as f64))
        .collect()
}
