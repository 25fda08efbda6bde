use anyhow::{bail, Result};
use std::path::PathBuf;

use consonance_core::{FingerprintCache, MappingStore};
use consonance_engine::{CancelToken, FeatureConfig, Finder, IndexOutcome};

pub async fn run_index(music_dir: PathBuf, cache_path: PathBuf) -> Result<()> {
    if !music_dir.is_dir() {
        bail!("not a directory: {}", music_dir.display());
    }

    println!("Indexing {}", music_dir.display());
    println!("Cache: {}\n", cache_path.display());

    let cancel = CancelToken::new();
    spawn_ctrl_c_watcher(cancel.clone());

    let outcome = tokio::task::spawn_blocking(move || {
        let mut cache = FingerprintCache::new();
        cache.set_handle(cache_path);
        let mut finder = Finder::new(cache, load_mapping(), FeatureConfig::default());

        finder.index(&music_dir, &cancel, |p| {
            print!("\r[{}/{}] extracting features", p.processed, p.total);
            let _ = std::io::Write::flush(&mut std::io::stdout());
        })
    })
    .await??;

    println!();
    match outcome {
        IndexOutcome::Completed { indexed, failed } => {
            println!("\n✓ Indexing complete");
            println!("  Fingerprinted: {indexed}");
            println!("  Failed:        {failed}");
            if failed > 0 {
                println!("\nNote: {failed} files could not be decoded. Check logs for details.");
            }
        }
        IndexOutcome::Cancelled => {
            println!("\n✗ Indexing cancelled; the cache was left untouched");
        }
    }

    Ok(())
}

fn load_mapping() -> Option<consonance_core::PathMapping> {
    match MappingStore::default_location().load() {
        Ok(mapping) => mapping,
        Err(e) => {
            log::warn!("ignoring unreadable path mapping: {e}");
            None
        }
    }
}

fn spawn_ctrl_c_watcher(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nCancelling...");
            cancel.cancel();
        }
    });
}
