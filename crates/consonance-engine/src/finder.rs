//! The context object tying one cache handle, one path mapping, and
//! one extractor configuration together.

use std::path::Path;

use consonance_core::{remap_path, FingerprintCache, PathMapping};

use crate::audio::{extract, FeatureConfig};
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::indexer::{index_corpus, IndexOutcome, Progress};
use crate::search::{rank, SearchHit, SearchOptions};

/// Terminal outcome of a search pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Ranked hits, ascending by distance, already path-remapped.
    Ranked(Vec<SearchHit>),
    /// Cancellation observed; partial rankings were discarded.
    Cancelled,
    /// The query file itself failed to decode; there was nothing to
    /// compare against.
    QueryUnreadable,
}

/// Owns everything an index or search pass needs: the cache handle,
/// the active path mapping, and the extractor configuration.
///
/// There is deliberately no process-wide state: callers build a
/// `Finder` and pass it where it is needed. Index and search passes
/// against the same cache handle must not run concurrently; `index`
/// takes `&mut self` so the borrow checker enforces that within one
/// `Finder`.
#[derive(Debug)]
pub struct Finder {
    cache: FingerprintCache,
    mapping: Option<PathMapping>,
    features: FeatureConfig,
}

impl Finder {
    pub fn new(
        cache: FingerprintCache,
        mapping: Option<PathMapping>,
        features: FeatureConfig,
    ) -> Self {
        Self {
            cache,
            mapping,
            features,
        }
    }

    pub fn cache(&self) -> &FingerprintCache {
        &self.cache
    }

    pub fn mapping(&self) -> Option<&PathMapping> {
        self.mapping.as_ref()
    }

    /// Fingerprint every audio file under `root` into the cache
    /// handle. See [`index_corpus`] for the walk, skip, and
    /// discard-on-cancel semantics.
    pub fn index(
        &mut self,
        root: &Path,
        cancel: &CancelToken,
        progress: impl FnMut(Progress),
    ) -> Result<IndexOutcome> {
        index_corpus(root, &self.cache, &self.features, cancel, progress)
    }

    /// Rank the cached corpus by similarity to `query_file` and keep
    /// the closest matches.
    ///
    /// Extracts the query fingerprint, loads the cache, and delegates
    /// to [`rank`]. A query that cannot be decoded short-circuits to
    /// [`SearchOutcome::QueryUnreadable`]; result paths are remapped
    /// through the active path mapping before being returned.
    pub fn search(
        &self,
        query_file: &Path,
        options: &SearchOptions,
        cancel: &CancelToken,
        progress: impl FnMut(Progress),
    ) -> Result<SearchOutcome> {
        let query = match extract(query_file, &self.features) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                log::warn!("{e}");
                return Ok(SearchOutcome::QueryUnreadable);
            }
        };

        let corpus = self.cache.load()?;
        let hits = rank(&query, &corpus, options, cancel, progress)?;

        if cancel.is_cancelled() {
            return Ok(SearchOutcome::Cancelled);
        }
        Ok(SearchOutcome::Ranked(self.remap_hits(hits)))
    }

    fn remap_hits(&self, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        let Some(mapping) = &self.mapping else {
            return hits;
        };
        hits.into_iter()
            .map(|hit| SearchHit {
                path: remap_path(&hit.path, mapping),
                distance: hit.distance,
            })
            .collect()
    }
}
