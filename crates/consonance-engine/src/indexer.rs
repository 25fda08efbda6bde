//! Corpus indexing: walk a directory tree, fingerprint every audio
//! file, persist the result through the cache.

use std::path::Path;

use walkdir::WalkDir;

use consonance_core::{FingerprintCache, FingerprintMap};

use crate::audio::{extract, FeatureConfig};
use crate::cancel::CancelToken;
use crate::error::Result;

/// Extensions accepted for corpus files; everything else is ignored by
/// the walk. Formats the decoder cannot actually handle (wma in
/// particular) still pass this filter and are dropped later when
/// decoding fails; validity is defined by whether decoding succeeds,
/// not by the name.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "wma"];

/// Progress of a pass: files processed so far out of the total
/// determined up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// Terminal outcome of an index pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Every candidate file was visited and the cache was persisted.
    Completed {
        /// Entries written to the cache.
        indexed: usize,
        /// Files skipped because extraction failed.
        failed: usize,
    },
    /// Cancellation observed; nothing was persisted.
    Cancelled,
}

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn candidate_files(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_file() && is_audio_file(entry.path()))
}

/// Walk `root`, fingerprint every qualifying file, and persist the
/// accumulated mapping through `cache`.
///
/// The tree is walked twice: a pre-scan establishes the total for
/// progress reporting, then the extraction pass runs. Files that fail
/// to decode are logged and skipped; they contribute no fingerprint
/// but still advance progress. A cancelled pass discards everything
/// gathered so far and leaves the cache file exactly as it was, since a
/// partial cache on disk would be indistinguishable from a complete
/// one.
pub fn index_corpus(
    root: &Path,
    cache: &FingerprintCache,
    config: &FeatureConfig,
    cancel: &CancelToken,
    mut progress: impl FnMut(Progress),
) -> Result<IndexOutcome> {
    let total = candidate_files(root).count();
    log::info!("indexing {}: {total} candidate files", root.display());

    let mut accumulator = FingerprintMap::new();
    let mut processed = 0_usize;
    let mut failed = 0_usize;

    for entry in candidate_files(root) {
        if cancel.is_cancelled() {
            log::info!(
                "index cancelled after {processed}/{total} files; discarding partial results"
            );
            return Ok(IndexOutcome::Cancelled);
        }

        let path = entry.path();
        match extract(path, config) {
            Ok(fingerprint) => {
                accumulator.insert(path.to_string_lossy().into_owned(), fingerprint);
            }
            Err(e) => {
                log::warn!("skipping file: {e}");
                failed += 1;
            }
        }

        processed += 1;
        progress(Progress { processed, total });
    }

    if cancel.is_cancelled() {
        log::info!("index cancelled at the end of the walk; discarding partial results");
        return Ok(IndexOutcome::Cancelled);
    }

    cache.save(&accumulator)?;
    let indexed = accumulator.len();
    log::info!("indexed {indexed} files ({failed} failed)");
    Ok(IndexOutcome::Completed { indexed, failed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_extension_match_is_case_insensitive() {
        assert!(is_audio_file(Path::new("/music/song.MP3")));
        assert!(is_audio_file(Path::new("/music/song.flac")));
        assert!(is_audio_file(Path::new("/music/song.wma")));
        assert!(!is_audio_file(Path::new("/music/cover.jpg")));
        assert!(!is_audio_file(Path::new("/music/no_extension")));
    }
}
