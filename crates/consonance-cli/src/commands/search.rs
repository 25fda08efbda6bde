use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use lofty::file::TaggedFileExt;
use lofty::tag::Accessor;

use consonance_core::{FingerprintCache, MappingStore};
use consonance_engine::{
    open_in_default_player, CancelToken, FeatureConfig, Finder, SearchHit, SearchOptions,
    SearchOutcome,
};

pub async fn run_search(
    target: PathBuf,
    cache_path: PathBuf,
    options: SearchOptions,
    open_rank: Option<usize>,
) -> Result<()> {
    if !target.is_file() {
        bail!("no such target file: {}", target.display());
    }
    if !cache_path.exists() {
        bail!(
            "no fingerprint cache at {}; run `consonance index <dir>` first",
            cache_path.display()
        );
    }

    let cancel = CancelToken::new();
    spawn_ctrl_c_watcher(cancel.clone());

    let outcome = tokio::task::spawn_blocking({
        let cancel = cancel.clone();
        move || {
            let mut cache = FingerprintCache::new();
            cache.set_handle(cache_path);
            let finder = Finder::new(cache, load_mapping(), FeatureConfig::default());

            finder.search(&target, &options, &cancel, |p| {
                print!("\r[{}/{}] comparing files", p.processed, p.total);
                let _ = std::io::Write::flush(&mut std::io::stdout());
            })
        }
    })
    .await??;

    println!();
    match outcome {
        SearchOutcome::Ranked(hits) if hits.is_empty() => {
            println!("No similar files found: the cache is empty.");
        }
        SearchOutcome::Ranked(hits) => {
            println!("\nClosest matches:\n");
            for (rank, hit) in hits.iter().enumerate() {
                print_hit(rank + 1, hit);
            }
            if let Some(rank) = open_rank {
                let hit = hits
                    .get(rank - 1)
                    .with_context(|| format!("no result at rank {rank}"))?;
                println!("\nOpening {}", hit.path);
                open_in_default_player(Path::new(&hit.path))
                    .with_context(|| format!("failed to open {}", hit.path))?;
            }
        }
        SearchOutcome::Cancelled => {
            println!("\n✗ Search cancelled; no ranking was produced");
        }
        SearchOutcome::QueryUnreadable => {
            bail!("could not decode the target file; nothing to compare against");
        }
    }

    Ok(())
}

fn print_hit(rank: usize, hit: &SearchHit) {
    let name = Path::new(&hit.path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| hit.path.clone());

    match tag_line(Path::new(&hit.path)) {
        Some(tags) => println!("{rank:3}. {name}  ({tags})  distance {:.4}", hit.distance),
        None => println!("{rank:3}. {name}  distance {:.4}", hit.distance),
    }
    println!("     {}", hit.path);
}

/// Best-effort "Title - Artist" from embedded tags. Remapped paths can
/// point at nothing, and untagged files are common; both just mean no
/// tag line.
fn tag_line(path: &Path) -> Option<String> {
    let tagged = lofty::read_from_path(path).ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;

    match (tag.title(), tag.artist()) {
        (Some(title), Some(artist)) => Some(format!("{title} - {artist}")),
        (Some(title), None) => Some(title.to_string()),
        (None, Some(artist)) => Some(artist.to_string()),
        (None, None) => None,
    }
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
