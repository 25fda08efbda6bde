//! End-to-end tests for the index → search pipeline.
//!
//! These tests synthesize small PCM16 WAV files so decoding, feature
//! extraction, indexing, and ranking all run against real audio data
//! without shipping fixtures.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use consonance_core::{FingerprintCache, PathMapping};
use consonance_engine::{
    extract, CancelToken, FeatureConfig, Finder, IndexOutcome, SearchOptions, SearchOutcome,
};

const SAMPLE_RATE: u32 = 22050;

/// Write a mono PCM16 WAV containing a sine tone.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn write_sine_wav(path: &Path, freq: f32, duration_secs: f32) {
    let num_samples = (duration_secs * SAMPLE_RATE as f32) as u32;
    let data_len = num_samples * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());

    for i in 0..num_samples {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5;
        bytes.extend_from_slice(&((sample * 32767.0) as i16).to_le_bytes());
    }

    fs::write(path, bytes).unwrap();
}

/// A corpus of three tones plus one file that only pretends to be mp3.
fn build_corpus(dir: &Path) {
    write_sine_wav(&dir.join("a.wav"), 440.0, 0.5);
    write_sine_wav(&dir.join("b.wav"), 466.16, 0.5);
    write_sine_wav(&dir.join("c.wav"), 1760.0, 0.5);
    fs::write(dir.join("broken.mp3"), b"definitely not mpeg audio").unwrap();
    fs::write(dir.join("notes.txt"), b"not audio, not counted").unwrap();
}

fn finder_for(cache_file: &Path, mapping: Option<PathMapping>) -> Finder {
    let mut cache = FingerprintCache::new();
    cache.set_handle(cache_file);
    Finder::new(cache, mapping, FeatureConfig::default())
}

#[test]
fn extraction_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    write_sine_wav(&path, 440.0, 0.5);

    let config = FeatureConfig::default();
    let first = extract(&path, &config).unwrap();
    let second = extract(&path, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.mfcc.len(), 13);
    assert_eq!(first.chroma.len(), 12);
}

#[test]
fn index_then_search_ranks_the_query_file_first() {
    let dir = TempDir::new().unwrap();
    let corpus_dir = dir.path().join("library");
    fs::create_dir(&corpus_dir).unwrap();
    build_corpus(&corpus_dir);

    let cache_file = dir.path().join("fingerprints.json");
    let mut finder = finder_for(&cache_file, None);

    let mut progress = Vec::new();
    let outcome = finder
        .index(&corpus_dir, &CancelToken::new(), |p| progress.push(p))
        .unwrap();

    // Three decodable tones; broken.mp3 counts as a candidate but
    // fails extraction; notes.txt is never a candidate.
    assert_eq!(
        outcome,
        IndexOutcome::Completed {
            indexed: 3,
            failed: 1
        }
    );
    assert_eq!(progress.len(), 4);
    assert!(progress.iter().all(|p| p.total == 4));
    let processed: Vec<usize> = progress.iter().map(|p| p.processed).collect();
    assert_eq!(processed, vec![1, 2, 3, 4]);

    let options = SearchOptions {
        top_n: 2,
        workers: 4,
    };
    let outcome = finder
        .search(
            &corpus_dir.join("a.wav"),
            &options,
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();

    let SearchOutcome::Ranked(hits) = outcome else {
        panic!("expected a ranking, got {outcome:?}");
    };
    assert_eq!(hits.len(), 2);
    assert!(hits[0].path.ends_with("a.wav"));
    assert!(hits[0].distance <= hits[1].distance);
}

#[test]
fn top_n_larger_than_corpus_returns_everything() {
    let dir = TempDir::new().unwrap();
    let corpus_dir = dir.path().join("library");
    fs::create_dir(&corpus_dir).unwrap();
    build_corpus(&corpus_dir);

    let cache_file = dir.path().join("fingerprints.json");
    let mut finder = finder_for(&cache_file, None);
    finder
        .index(&corpus_dir, &CancelToken::new(), |_| {})
        .unwrap();

    let options = SearchOptions {
        top_n: 50,
        workers: 2,
    };
    let outcome = finder
        .search(
            &corpus_dir.join("b.wav"),
            &options,
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();

    let SearchOutcome::Ranked(hits) = outcome else {
        panic!("expected a ranking, got {outcome:?}");
    };
    assert_eq!(hits.len(), 3);
}

#[test]
fn cancelled_index_leaves_the_cache_untouched() {
    let dir = TempDir::new().unwrap();
    let corpus_dir = dir.path().join("library");
    fs::create_dir(&corpus_dir).unwrap();
    build_corpus(&corpus_dir);

    let cache_file = dir.path().join("fingerprints.json");

    // Seed the cache with a known mapping first.
    let mut finder = finder_for(&cache_file, None);
    finder
        .index(&corpus_dir, &CancelToken::new(), |_| {})
        .unwrap();
    let before = finder.cache().load().unwrap();
    assert_eq!(before.len(), 3);

    // Add another file, then cancel before the re-index starts.
    write_sine_wav(&corpus_dir.join("d.wav"), 880.0, 0.5);
    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = finder.index(&corpus_dir, &cancel, |_| {}).unwrap();

    assert_eq!(outcome, IndexOutcome::Cancelled);
    assert_eq!(finder.cache().load().unwrap(), before);
}

#[test]
fn cancelled_search_reports_cancellation() {
    let dir = TempDir::new().unwrap();
    let corpus_dir = dir.path().join("library");
    fs::create_dir(&corpus_dir).unwrap();
    build_corpus(&corpus_dir);

    let cache_file = dir.path().join("fingerprints.json");
    let mut finder = finder_for(&cache_file, None);
    finder
        .index(&corpus_dir, &CancelToken::new(), |_| {})
        .unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let options = SearchOptions {
        top_n: 3,
        workers: 2,
    };
    let outcome = finder
        .search(&corpus_dir.join("a.wav"), &options, &cancel, |_| {})
        .unwrap();
    assert_eq!(outcome, SearchOutcome::Cancelled);
}

#[test]
fn unreadable_query_short_circuits() {
    let dir = TempDir::new().unwrap();
    let corpus_dir = dir.path().join("library");
    fs::create_dir(&corpus_dir).unwrap();
    build_corpus(&corpus_dir);

    let cache_file = dir.path().join("fingerprints.json");
    let mut finder = finder_for(&cache_file, None);
    finder
        .index(&corpus_dir, &CancelToken::new(), |_| {})
        .unwrap();

    let options = SearchOptions {
        top_n: 3,
        workers: 2,
    };
    let outcome = finder
        .search(
            &corpus_dir.join("broken.mp3"),
            &options,
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();
    assert_eq!(outcome, SearchOutcome::QueryUnreadable);
}

#[test]
fn search_with_empty_cache_returns_no_hits() {
    let dir = TempDir::new().unwrap();
    let query = dir.path().join("tone.wav");
    write_sine_wav(&query, 440.0, 0.5);

    let finder = finder_for(&dir.path().join("missing.json"), None);
    let options = SearchOptions {
        top_n: 5,
        workers: 2,
    };
    let outcome = finder
        .search(&query, &options, &CancelToken::new(), |_| {})
        .unwrap();
    assert_eq!(outcome, SearchOutcome::Ranked(Vec::new()));
}

#[cfg(not(windows))]
#[test]
fn result_paths_flow_through_the_active_mapping() {
    let dir = TempDir::new().unwrap();
    let corpus_dir = dir.path().join("library");
    fs::create_dir(&corpus_dir).unwrap();
    build_corpus(&corpus_dir);

    let cache_file = dir.path().join("fingerprints.json");
    let mapping = PathMapping::new("library", "/relocated/library");
    let mut finder = finder_for(&cache_file, Some(mapping));
    finder
        .index(&corpus_dir, &CancelToken::new(), |_| {})
        .unwrap();

    let options = SearchOptions {
        top_n: 3,
        workers: 2,
    };
    let outcome = finder
        .search(
            &corpus_dir.join("a.wav"),
            &options,
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();

    let SearchOutcome::Ranked(hits) = outcome else {
        panic!("expected a ranking, got {outcome:?}");
    };
    assert!(!hits.is_empty());
    for hit in &hits {
        assert!(
            hit.path.starts_with("/relocated/library/"),
            "unmapped path: {}",
            hit.path
        );
    }
}
