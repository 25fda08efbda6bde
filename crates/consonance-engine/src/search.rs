//! Parallel similarity ranking between a query fingerprint and a
//! cached corpus.
//!
//! Every cached entry is scored independently on a bounded worker
//! pool; the calling thread drains completions as they arrive,
//! reporting progress and honoring cancellation between results. The
//! score is derived from cosine similarity and is monotonic but not a
//! metric: it bottoms out at 1.0 for an exact direction match and
//! grows without bound toward orthogonality.

use std::sync::mpsc;
use std::sync::Arc;

use consonance_core::{Fingerprint, FingerprintMap};

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::indexer::Progress;

/// Bounds for the distance-computation worker pool.
pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 100;

/// One ranked match: a corpus path and its distance from the query.
/// Smaller means more acoustically similar.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub path: String,
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// How many of the closest matches to keep. Larger than the corpus
    /// simply returns everything.
    pub top_n: usize,
    /// Worker pool size, clamped to `MIN_WORKERS..=MAX_WORKERS`.
    pub workers: usize,
}

/// Guard against dividing by a vanishing cosine similarity.
const SIMILARITY_EPSILON: f64 = 1e-12;

/// Cosine similarity of two same-kind vectors, or `None` when either
/// side has zero norm (an all-silence fingerprint decodes to zeros).
fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += f64::from(x) * f64::from(y);
        norm_a += f64::from(x) * f64::from(x);
        norm_b += f64::from(y) * f64::from(y);
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Distance contribution of one feature kind: `|1 / cos|`.
///
/// An exact direction match scores the global minimum of 1.0 and the
/// score grows without bound as the vectors approach orthogonality.
/// Orthogonal or degenerate (zero-norm) pairs score positive infinity
/// and sort last. The absolute value means a perfectly anti-correlated
/// pair also scores 1.0; in practice feature vectors of real audio are
/// non-negative enough that this does not arise.
fn kind_distance(a: &[f32], b: &[f32]) -> f64 {
    match cosine_similarity(a, b) {
        Some(sim) if sim.abs() >= SIMILARITY_EPSILON => (1.0 / sim).abs(),
        _ => f64::INFINITY,
    }
}

/// Mean distance over the feature kinds present in both fingerprints.
/// No kind in common means the entries are incomparable: positive
/// infinity, ranking last.
pub fn fingerprint_distance(query: &Fingerprint, candidate: &Fingerprint) -> f64 {
    let mut sum = 0.0_f64;
    let mut kinds = 0_usize;
    for (name, query_vec) in query.kinds() {
        if let Some(candidate_vec) = candidate.kind(name) {
            sum += kind_distance(query_vec, candidate_vec);
            kinds += 1;
        }
    }
    if kinds == 0 {
        return f64::INFINITY;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / kinds as f64;
    mean
}

/// Rank every cached entry by distance from the query and keep the
/// closest `top_n`.
///
/// Distances are computed on a dedicated pool of `workers` threads;
/// entries are independent, so tasks share nothing but the query and
/// the cancel flag. The calling thread receives results as they
/// complete, reports progress, and checks the cancel token after each
/// one: a cancelled search returns an empty ranking rather than a
/// partial one, and tasks that have not started yet skip their
/// computation. Completion order is arbitrary; the final sort breaks
/// distance ties by path so results are deterministic.
pub fn rank(
    query: &Fingerprint,
    corpus: &FingerprintMap,
    options: &SearchOptions,
    cancel: &CancelToken,
    mut progress: impl FnMut(Progress),
) -> Result<Vec<SearchHit>> {
    if corpus.is_empty() {
        return Ok(Vec::new());
    }

    let workers = options.workers.clamp(MIN_WORKERS, MAX_WORKERS);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))?;

    let total = corpus.len();
    let query = Arc::new(query.clone());
    let (tx, rx) = mpsc::channel::<SearchHit>();

    for (path, fingerprint) in corpus {
        let tx = tx.clone();
        let query = Arc::clone(&query);
        let cancel = cancel.clone();
        let path = path.clone();
        let fingerprint = fingerprint.clone();
        pool.spawn(move || {
            if cancel.is_cancelled() {
                return;
            }
            let distance = fingerprint_distance(&query, &fingerprint);
            // The receiver may be gone after cancellation; a failed
            // send only means the result is no longer wanted.
            let _ = tx.send(SearchHit { path, distance });
        });
    }
    drop(tx);

    let mut hits: Vec<SearchHit> = Vec::with_capacity(total);
    let mut cancelled = false;
    for (received, hit) in rx.iter().enumerate() {
        hits.push(hit);
        progress(Progress {
            processed: received + 1,
            total,
        });
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
    }
    // Dropping the pool joins its threads; tasks not yet started see
    // the cancel flag and exit without computing.
    drop(rx);
    drop(pool);

    if cancelled || cancel.is_cancelled() {
        log::info!(
            "search cancelled; discarding {} computed distances",
            hits.len()
        );
        return Ok(Vec::new());
    }

    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.path.cmp(&b.path))
    });
    hits.truncate(options.top_n);
    Ok(hits)
}
